//! Control panel for a fleet of recording devices.
//!
//! Connects to OBS Studio instances over obs-websocket and to BlackMagic
//! recorders over their HTTP REST API, polls each one's recording status
//! once per GUI tick and dispatches start/stop/pause commands, per
//! connection or across the whole fleet.

pub mod app;
pub mod commands;
pub mod config;
pub mod devices;
pub mod pacing;
pub mod poller;
pub mod preview;
pub mod registry;

pub use app::{MultiRecorderApp, PanelOptions};
pub use config::Config;
pub use registry::Registry;
