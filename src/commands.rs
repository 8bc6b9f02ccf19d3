//! Operator-invoked commands.
//!
//! Commands are fire-and-forget from the poller's perspective: their
//! effect shows up on the next poll tick rather than being awaited here.
//! Batch commands isolate failures per connection and hand the failure
//! list back to the caller instead of aborting partway.

use crate::devices::DeviceKind;
use crate::registry::Connection;
use anyhow::Result;
use std::path::Path;
use tracing::warn;

/// One connection's failure within a batch command.
#[derive(Debug)]
pub struct CommandFailure {
    /// Display name of the connection that failed.
    pub name: String,
    pub error: anyhow::Error,
}

impl CommandFailure {
    fn record(failures: &mut Vec<CommandFailure>, conn: &Connection, error: anyhow::Error) {
        warn!("Command for {} failed: {:#}", conn.config.name, error);
        failures.push(CommandFailure {
            name: conn.config.name.clone(),
            error,
        });
    }
}

/// Toggle recording on one connection.
pub fn toggle_record(conn: &mut Connection) -> Result<()> {
    conn.device.toggle_record()
}

/// Toggle recording pause on one connection (OBS only).
pub fn toggle_pause(conn: &mut Connection) -> Result<()> {
    conn.device.toggle_pause()
}

/// Flash the identify indicator of one connection (BlackMagic only).
pub fn identify(conn: &mut Connection) -> Result<()> {
    conn.device.identify()
}

/// Start recording on every active connection that is not already
/// recording. Returns the connections that failed.
pub fn record_all(connections: &mut [Connection]) -> Vec<CommandFailure> {
    let mut failures = Vec::new();

    for conn in connections.iter_mut() {
        // Live status, not the last snapshot: a device that started
        // recording since the previous tick must not be started twice.
        let result = match conn.device.record_status() {
            Ok(status) if !status.recording => conn.device.start_record(),
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            CommandFailure::record(&mut failures, conn, e);
        }
    }

    failures
}

/// Stop recording on every active connection that is currently
/// recording. Returns the connections that failed.
pub fn stop_all(connections: &mut [Connection]) -> Vec<CommandFailure> {
    let mut failures = Vec::new();

    for conn in connections.iter_mut() {
        let result = match conn.device.record_status() {
            Ok(status) if status.recording => conn.device.stop_record(),
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            CommandFailure::record(&mut failures, conn, e);
        }
    }

    failures
}

/// Create a per-connection recording directory under `base` and point
/// every OBS connection at its own: {base}/video/{name}.
pub fn set_record_directory_all(
    connections: &mut [Connection],
    base: &Path,
) -> Vec<CommandFailure> {
    let mut failures = Vec::new();

    for conn in connections.iter_mut() {
        if conn.kind != DeviceKind::Obs {
            continue;
        }
        let directory = base.join("video").join(&conn.config.name);
        let result = std::fs::create_dir_all(&directory)
            .map_err(anyhow::Error::from)
            .and_then(|_| conn.device.set_record_directory(&directory.to_string_lossy()));
        if let Err(e) = result {
            CommandFailure::record(&mut failures, conn, e);
        }
    }

    failures
}
