//! Device client adapters.
//!
//! Each remote recorder kind (OBS Studio, BlackMagic) gets a client module
//! plus an adapter implementing the [`Device`] trait, so the registry,
//! poller and command dispatch never care which transport sits underneath.

pub mod blackmagic;
pub mod obs;

use anyhow::Result;
use std::fmt;

/// Kind of remote recording device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// OBS Studio instance controlled over obs-websocket 5.x.
    Obs,
    /// BlackMagic recorder controlled over its HTTP REST API.
    BlackMagic,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Obs => write!(f, "OBS"),
            DeviceKind::BlackMagic => write!(f, "BlackMagic"),
        }
    }
}

/// Result of one status fetch from a device.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStatus {
    /// Whether the device is currently recording.
    pub recording: bool,
    /// Pause state, for devices that expose one (OBS only).
    pub paused: Option<bool>,
    /// Current timecode string as reported by the device.
    pub timecode: Option<String>,
}

/// Static media properties of a connection, fetched once at registration.
///
/// Every field is optional: a BlackMagic deck without input reports no
/// clip format, and a missing field must never fail registration.
#[derive(Debug, Clone, Default)]
pub struct MediaInfo {
    /// Canvas/clip resolution, e.g. "1920x1080".
    pub resolution: Option<String>,
    /// Frame rate in frames per second.
    pub frame_rate: Option<f64>,
    /// Codec name (BlackMagic only).
    pub codec: Option<String>,
    /// Input video source (BlackMagic only).
    pub input_source: Option<String>,
}

/// Uniform capability surface over a connected recording device.
///
/// All methods may fail on any network call; callers at the poller and
/// command-dispatch boundaries are responsible for isolating failures per
/// connection.
pub trait Device {
    fn kind(&self) -> DeviceKind;

    /// Fetch the live recording status. One atomic step: if any part of
    /// the fetch fails the whole status is considered failed for this tick.
    fn record_status(&mut self) -> Result<RecordStatus>;

    fn toggle_record(&mut self) -> Result<()>;

    /// Toggle recording pause. Errors on devices without a pause concept.
    fn toggle_pause(&mut self) -> Result<()>;

    fn start_record(&mut self) -> Result<()>;

    fn stop_record(&mut self) -> Result<()>;

    /// Fetch static media properties. Sub-fetch failures leave individual
    /// fields empty rather than failing the call.
    fn media_info(&mut self) -> Result<MediaInfo>;

    /// Whether this device exposes a pause control.
    fn supports_pause(&self) -> bool {
        self.kind() == DeviceKind::Obs
    }

    /// Point the device's recording output at a directory (OBS only).
    fn set_record_directory(&mut self, _directory: &str) -> Result<()> {
        anyhow::bail!("{} devices do not support setting a record directory", self.kind())
    }

    /// Flash a physical identify indicator (BlackMagic only).
    fn identify(&mut self) -> Result<()> {
        anyhow::bail!("{} devices do not support identify", self.kind())
    }

    /// Fetch a preview screenshot as (base64 data URI, width, height)
    /// (OBS only).
    fn screenshot(&mut self) -> Result<(String, u32, u32)> {
        anyhow::bail!("{} devices do not support screenshots", self.kind())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted device used by registry, poller and command tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Call counters shared between a mock and the test that built it.
    #[derive(Debug, Default)]
    pub struct Calls {
        pub starts: usize,
        pub stops: usize,
        pub toggles: usize,
        pub pauses: usize,
        pub record_dirs: Vec<String>,
    }

    pub struct MockDevice {
        kind: DeviceKind,
        /// Statuses handed out per tick; the last one repeats once the
        /// script runs dry. `Err` entries simulate a failed fetch.
        script: VecDeque<Result<RecordStatus, String>>,
        fail_commands: bool,
        pub calls: Arc<Mutex<Calls>>,
    }

    impl MockDevice {
        pub fn new(kind: DeviceKind) -> Self {
            Self {
                kind,
                script: VecDeque::new(),
                fail_commands: false,
                calls: Arc::new(Mutex::new(Calls::default())),
            }
        }

        pub fn with_status(mut self, status: RecordStatus) -> Self {
            self.script.push_back(Ok(status));
            self
        }

        pub fn with_error(mut self, message: &str) -> Self {
            self.script.push_back(Err(message.to_string()));
            self
        }

        pub fn failing_commands(mut self) -> Self {
            self.fail_commands = true;
            self
        }

        pub fn calls(&self) -> Arc<Mutex<Calls>> {
            Arc::clone(&self.calls)
        }

        fn command(&self, apply: impl FnOnce(&mut Calls)) -> Result<()> {
            if self.fail_commands {
                anyhow::bail!("mock command failure");
            }
            apply(&mut self.calls.lock().unwrap());
            Ok(())
        }
    }

    pub fn recording(timecode: &str) -> RecordStatus {
        RecordStatus {
            recording: true,
            paused: Some(false),
            timecode: Some(timecode.to_string()),
        }
    }

    pub fn idle() -> RecordStatus {
        RecordStatus {
            recording: false,
            paused: Some(false),
            timecode: None,
        }
    }

    impl Device for MockDevice {
        fn kind(&self) -> DeviceKind {
            self.kind
        }

        fn record_status(&mut self) -> Result<RecordStatus> {
            let next = if self.script.len() > 1 {
                self.script.pop_front()
            } else {
                self.script.front().cloned()
            };
            match next {
                Some(Ok(status)) => Ok(status),
                Some(Err(message)) => Err(anyhow::anyhow!(message)),
                None => Ok(idle()),
            }
        }

        fn toggle_record(&mut self) -> Result<()> {
            self.command(|c| c.toggles += 1)
        }

        fn toggle_pause(&mut self) -> Result<()> {
            if self.kind != DeviceKind::Obs {
                anyhow::bail!("no pause control");
            }
            self.command(|c| c.pauses += 1)
        }

        fn start_record(&mut self) -> Result<()> {
            self.command(|c| c.starts += 1)
        }

        fn stop_record(&mut self) -> Result<()> {
            self.command(|c| c.stops += 1)
        }

        fn media_info(&mut self) -> Result<MediaInfo> {
            Ok(MediaInfo::default())
        }

        fn set_record_directory(&mut self, directory: &str) -> Result<()> {
            if self.kind != DeviceKind::Obs {
                anyhow::bail!("no record directory control");
            }
            let dir = directory.to_string();
            self.command(|c| c.record_dirs.push(dir))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_labels() {
        assert_eq!(DeviceKind::Obs.to_string(), "OBS");
        assert_eq!(DeviceKind::BlackMagic.to_string(), "BlackMagic");
    }

    #[test]
    fn media_info_defaults_empty() {
        let info = MediaInfo::default();
        assert!(info.resolution.is_none());
        assert!(info.frame_rate.is_none());
        assert!(info.codec.is_none());
        assert!(info.input_source.is_none());
    }
}
