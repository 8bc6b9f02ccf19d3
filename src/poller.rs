//! Per-tick status polling and aggregation.
//!
//! Runs once per render tick. Every active connection is polled
//! independently: a failed fetch marks that connection's snapshot errored
//! and never delays or skips the remaining connections in the same tick.
//!
//! Error granularity is uniform and atomic per connection: the whole
//! status fetch either succeeds or the snapshot is errored, for both
//! device kinds. (Static media info is the exception and is handled
//! per-field at registration instead.)

use crate::devices::RecordStatus;
use crate::registry::Connection;
use std::fmt;
use tracing::warn;

/// Most recently polled status of one connection. Recreated every tick,
/// never merged with history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusSnapshot {
    pub recording: bool,
    /// Pause state for devices that expose one.
    pub paused: Option<bool>,
    pub timecode: Option<String>,
    /// When set, every other field is stale and must render as an error
    /// indicator rather than a value.
    pub errored: bool,
}

impl StatusSnapshot {
    /// Classify a successful status fetch.
    ///
    /// Not recording clears pause and timecode. While paused the timecode
    /// display stays frozen at the previous tick's value.
    pub fn classify(status: RecordStatus, previous: &StatusSnapshot) -> Self {
        if !status.recording {
            return StatusSnapshot {
                recording: false,
                paused: None,
                timecode: None,
                errored: false,
            };
        }

        let paused = status.paused.unwrap_or(false);
        let timecode = if paused {
            previous.timecode.clone().or(status.timecode)
        } else {
            status.timecode
        };

        StatusSnapshot {
            recording: true,
            paused: status.paused,
            timecode,
            errored: false,
        }
    }

    /// Snapshot for a failed fetch: no field carries a stale value.
    pub fn errored() -> Self {
        StatusSnapshot {
            recording: false,
            paused: None,
            timecode: None,
            errored: true,
        }
    }

    /// Status category for presentation (text + color class).
    pub fn state(&self) -> RecordState {
        if self.errored {
            RecordState::Error
        } else if self.recording && self.paused == Some(true) {
            RecordState::Paused
        } else if self.recording {
            RecordState::Recording
        } else {
            RecordState::NotRecording
        }
    }

    /// Label for the pause row of devices that expose a pause control.
    pub fn pause_label(&self) -> &'static str {
        match self.state() {
            RecordState::Error => "Error!",
            RecordState::Paused => "Paused",
            RecordState::Recording => "Not Paused",
            RecordState::NotRecording => "Not Recording",
        }
    }
}

/// Presentation category of one connection's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    Recording,
    Paused,
    NotRecording,
    Error,
}

impl RecordState {
    pub fn label(&self) -> &'static str {
        match self {
            RecordState::Recording => "Recording",
            RecordState::Paused => "Paused",
            RecordState::NotRecording => "Not Recording",
            RecordState::Error => "Error!",
        }
    }
}

/// Poll every connection once. Failures are isolated per connection.
pub fn poll_tick(connections: &mut [Connection]) {
    for conn in connections.iter_mut() {
        match conn.device.record_status() {
            Ok(status) => {
                conn.snapshot = StatusSnapshot::classify(status, &conn.snapshot);
            }
            Err(e) => {
                warn!("Status fetch for {} failed: {:#}", conn.config.name, e);
                conn.snapshot = StatusSnapshot::errored();
            }
        }
    }
}

/// Derived "N connections, M recording" view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateCounts {
    /// Fixed after registration.
    pub total: usize,
    pub recording: usize,
}

impl fmt::Display for AggregateCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.total == 1 { "connection" } else { "connections" };
        write!(f, "{} {}, {} recording", self.total, noun, self.recording)
    }
}

/// Recomputes the recording count every tick but only reports it when it
/// changed, so the presentation layer is not signalled redundantly.
#[derive(Debug)]
pub struct AggregateTracker {
    total: usize,
    last_recording: Option<usize>,
}

impl AggregateTracker {
    /// `total` is the number of active connections after registration.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            last_recording: None,
        }
    }

    /// Recompute from the current snapshots. `Some` on the first call and
    /// whenever the recording count changed; `None` otherwise.
    pub fn update<'a, I>(&mut self, snapshots: I) -> Option<AggregateCounts>
    where
        I: IntoIterator<Item = &'a StatusSnapshot>,
    {
        let recording = snapshots.into_iter().filter(|s| s.recording).count();
        if self.last_recording == Some(recording) {
            return None;
        }
        self.last_recording = Some(recording);
        Some(AggregateCounts {
            total: self.total,
            recording,
        })
    }

    /// Latest counts without recomputing.
    pub fn current(&self) -> AggregateCounts {
        AggregateCounts {
            total: self.total,
            recording: self.last_recording.unwrap_or(0),
        }
    }
}
