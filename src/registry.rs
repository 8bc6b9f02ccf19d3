//! Connection registry.
//!
//! Walks the configured connection lists at startup, attempts a bounded
//! handshake for each entry and partitions the result into active and
//! failed sets. One ordered collection holds config, live device handle,
//! static media info and the latest status snapshot together, so nothing
//! is ever matched up by parallel list position.

use crate::config::{Config, ConnectionConfig};
use crate::devices::blackmagic::BlackMagicDevice;
use crate::devices::obs::ObsDevice;
use crate::devices::{Device, DeviceKind, MediaInfo};
use crate::poller::StatusSnapshot;
use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

/// Handshake timeout applied to every connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// One active connection: config bound to its live device handle.
pub struct Connection {
    pub kind: DeviceKind,
    pub config: ConnectionConfig,
    pub device: Box<dyn Device>,
    /// Static media properties, fetched once at registration.
    pub media: MediaInfo,
    /// Most recently polled status, overwritten every tick.
    pub snapshot: StatusSnapshot,
}

impl Connection {
    /// Endpoint label: "host:port" for OBS, bare "host" for BlackMagic.
    pub fn endpoint(&self) -> String {
        endpoint_label(self.kind, &self.config)
    }
}

/// A configured connection that could not be established at startup.
#[derive(Debug, Clone)]
pub struct FailedConnection {
    pub kind: DeviceKind,
    pub config: ConnectionConfig,
}

impl FailedConnection {
    pub fn endpoint(&self) -> String {
        endpoint_label(self.kind, &self.config)
    }
}

fn endpoint_label(kind: DeviceKind, config: &ConnectionConfig) -> String {
    match kind {
        DeviceKind::Obs => format!("{}:{}", config.host, config.obs_port()),
        DeviceKind::BlackMagic => config.host.clone(),
    }
}

/// Outcome of registering one configured connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Connected,
    /// Same endpoint as an already-active connection of the same kind;
    /// skipped without counting as failed.
    DuplicateSkipped,
    Failed,
}

/// The set of configured connections, partitioned at startup.
#[derive(Default)]
pub struct Registry {
    pub connections: Vec<Connection>,
    pub failed: Vec<FailedConnection>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt every configured connection of both kinds. A single
    /// failure never aborts the remaining attempts.
    pub fn connect_all(config: &Config) -> Self {
        let mut registry = Self::new();

        for conn in &config.obs_connections {
            registry.register(DeviceKind::Obs, conn.clone(), |c| {
                ObsDevice::connect(c, CONNECT_TIMEOUT).map(|d| Box::new(d) as Box<dyn Device>)
            });
        }
        for conn in &config.blackmagic_connections {
            registry.register(DeviceKind::BlackMagic, conn.clone(), |c| {
                BlackMagicDevice::connect(c).map(|d| Box::new(d) as Box<dyn Device>)
            });
        }

        if registry.kind_count(DeviceKind::Obs) == 0 && !config.obs_connections.is_empty() {
            warn!("All OBS connections failed");
        }
        if registry.kind_count(DeviceKind::BlackMagic) == 0
            && !config.blackmagic_connections.is_empty()
        {
            warn!("All BlackMagic connections failed");
        }

        registry
    }

    /// Register one configured connection, using `connect` to establish
    /// the device handle. The closure seam keeps this testable without a
    /// network.
    pub fn register<F>(
        &mut self,
        kind: DeviceKind,
        config: ConnectionConfig,
        connect: F,
    ) -> RegisterOutcome
    where
        F: FnOnce(&ConnectionConfig) -> Result<Box<dyn Device>>,
    {
        if self.is_duplicate(kind, &config) {
            info!(
                "Duplicate {} connection in config @ {}, only one connection will be established",
                kind,
                endpoint_label(kind, &config),
            );
            return RegisterOutcome::DuplicateSkipped;
        }

        match connect(&config) {
            Ok(mut device) => {
                // Best effort: a deck without input still registers.
                let media = device.media_info().unwrap_or_default();
                info!(
                    "Connected to {} @ {}",
                    config.name,
                    endpoint_label(kind, &config)
                );
                self.connections.push(Connection {
                    kind,
                    config,
                    device,
                    media,
                    snapshot: StatusSnapshot::default(),
                });
                RegisterOutcome::Connected
            }
            Err(e) => {
                warn!(
                    "Failed to connect to {} @ {}: {:#}",
                    config.name,
                    endpoint_label(kind, &config),
                    e
                );
                self.failed.push(FailedConnection { kind, config });
                RegisterOutcome::Failed
            }
        }
    }

    /// Duplicate policy: OBS connections are keyed by (host, port),
    /// BlackMagic by host alone.
    fn is_duplicate(&self, kind: DeviceKind, candidate: &ConnectionConfig) -> bool {
        self.connections
            .iter()
            .filter(|c| c.kind == kind)
            .any(|c| match kind {
                DeviceKind::Obs => {
                    c.config.host == candidate.host && c.config.obs_port() == candidate.obs_port()
                }
                DeviceKind::BlackMagic => c.config.host == candidate.host,
            })
    }

    /// Whether any configured connection failed at startup.
    pub fn any_failed(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Number of active connections.
    pub fn active_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of active connections of one kind.
    pub fn kind_count(&self, kind: DeviceKind) -> usize {
        self.connections.iter().filter(|c| c.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::mock::MockDevice;

    fn entry(name: &str, host: &str, port: Option<u16>) -> ConnectionConfig {
        ConnectionConfig {
            name: name.into(),
            host: host.into(),
            port,
            password: None,
        }
    }

    fn mock_connector(
        kind: DeviceKind,
    ) -> impl FnOnce(&ConnectionConfig) -> Result<Box<dyn Device>> {
        move |_| Ok(Box::new(MockDevice::new(kind)) as Box<dyn Device>)
    }

    #[test]
    fn unreachable_host_lands_in_failed_set() {
        let mut registry = Registry::new();
        let outcome = registry.register(DeviceKind::Obs, entry("a", "192.168.1.10", None), |_| {
            Err(anyhow::anyhow!("connection refused"))
        });

        assert_eq!(outcome, RegisterOutcome::Failed);
        assert!(registry.any_failed());
        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.failed[0].config.name, "a");
    }

    #[test]
    fn duplicate_obs_endpoint_is_skipped_not_failed() {
        let mut registry = Registry::new();
        registry.register(
            DeviceKind::Obs,
            entry("a", "192.168.1.10", Some(4455)),
            mock_connector(DeviceKind::Obs),
        );
        // Same host and port under another name: skipped silently.
        let outcome = registry.register(
            DeviceKind::Obs,
            entry("a again", "192.168.1.10", Some(4455)),
            mock_connector(DeviceKind::Obs),
        );

        assert_eq!(outcome, RegisterOutcome::DuplicateSkipped);
        assert_eq!(registry.active_count(), 1);
        assert!(!registry.any_failed());
    }

    #[test]
    fn same_host_different_port_is_not_a_duplicate_for_obs() {
        let mut registry = Registry::new();
        registry.register(
            DeviceKind::Obs,
            entry("a", "192.168.1.10", Some(4455)),
            mock_connector(DeviceKind::Obs),
        );
        let outcome = registry.register(
            DeviceKind::Obs,
            entry("b", "192.168.1.10", Some(4456)),
            mock_connector(DeviceKind::Obs),
        );

        assert_eq!(outcome, RegisterOutcome::Connected);
        assert_eq!(registry.active_count(), 2);
    }

    #[test]
    fn blackmagic_duplicates_key_on_host_alone() {
        let mut registry = Registry::new();
        registry.register(
            DeviceKind::BlackMagic,
            entry("deck", "192.168.1.20", None),
            mock_connector(DeviceKind::BlackMagic),
        );
        let outcome = registry.register(
            DeviceKind::BlackMagic,
            entry("deck2", "192.168.1.20", Some(8080)),
            mock_connector(DeviceKind::BlackMagic),
        );

        assert_eq!(outcome, RegisterOutcome::DuplicateSkipped);
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn duplicate_detection_does_not_cross_kinds() {
        let mut registry = Registry::new();
        registry.register(
            DeviceKind::Obs,
            entry("obs", "192.168.1.30", None),
            mock_connector(DeviceKind::Obs),
        );
        let outcome = registry.register(
            DeviceKind::BlackMagic,
            entry("deck", "192.168.1.30", None),
            mock_connector(DeviceKind::BlackMagic),
        );

        assert_eq!(outcome, RegisterOutcome::Connected);
        assert_eq!(registry.active_count(), 2);
    }

    #[test]
    fn one_failure_does_not_abort_subsequent_registrations() {
        let mut registry = Registry::new();
        registry.register(DeviceKind::Obs, entry("bad", "192.168.1.10", None), |_| {
            Err(anyhow::anyhow!("timeout"))
        });
        let outcome = registry.register(
            DeviceKind::BlackMagic,
            entry("good", "192.168.1.20", None),
            mock_connector(DeviceKind::BlackMagic),
        );

        assert_eq!(outcome, RegisterOutcome::Connected);
        assert!(registry.any_failed());
        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.kind_count(DeviceKind::Obs), 0);
        assert_eq!(registry.kind_count(DeviceKind::BlackMagic), 1);
    }

    #[test]
    fn endpoint_labels_per_kind() {
        let mut registry = Registry::new();
        registry.register(
            DeviceKind::Obs,
            entry("obs", "192.168.1.10", None),
            mock_connector(DeviceKind::Obs),
        );
        registry.register(
            DeviceKind::BlackMagic,
            entry("deck", "192.168.1.20", None),
            mock_connector(DeviceKind::BlackMagic),
        );

        assert_eq!(registry.connections[0].endpoint(), "192.168.1.10:4455");
        assert_eq!(registry.connections[1].endpoint(), "192.168.1.20");
    }
}
