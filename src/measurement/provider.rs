//! The boundary between the orchestrator and whatever actually moves bytes.
//!
//! A [`MeasurementProvider`] hands out one [`MeasurementSession`] per run;
//! the session carries the per-run state (chosen server, ping, byte
//! counters) so that a fresh run never sees leftovers from the last one.

use super::results::{ServerInfo, TransferTotals};
use crate::errors::MeasurementError;
use async_trait::async_trait;

#[async_trait]
pub trait MeasurementProvider: Send + Sync {
    /// Start a fresh session for one measurement run.
    async fn open_session(
        &self,
    ) -> Result<Box<dyn MeasurementSession>, MeasurementError>;

    /// List known servers grouped by region, in listing order.
    async fn list_servers(&self) -> Result<ServerDirectory, MeasurementError>;
}

#[async_trait]
pub trait MeasurementSession: Send {
    /// Pick the server the following probes run against.
    ///
    /// Fails with `NoServerFound` when nothing suitable is reachable.
    async fn discover_best_server(
        &mut self,
    ) -> Result<ServerInfo, MeasurementError>;

    /// Download throughput in Mbps.
    async fn measure_download(&mut self) -> Result<f64, MeasurementError>;

    /// Upload throughput in Mbps.
    async fn measure_upload(&mut self) -> Result<f64, MeasurementError>;

    /// Latency to the selected server in milliseconds, 0 before discovery.
    fn last_ping_ms(&self) -> f64;

    /// Measured jitter, when the provider has one.
    fn jitter_ms(&self) -> Option<f64> {
        None
    }

    /// Bytes moved so far in this session.
    fn totals(&self) -> TransferTotals;

    /// Public link to the result, when the provider publishes one.
    fn share_url(&self) -> Option<String> {
        None
    }
}

/// Servers of one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionServers {
    pub region: String,
    pub servers: Vec<ServerInfo>,
}

/// A provider's server listing. Region order is the provider's order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerDirectory {
    pub regions: Vec<RegionServers>,
}

impl ServerDirectory {
    /// Group servers by region, keeping first-seen region order.
    pub fn from_servers(
        servers: impl IntoIterator<Item = (String, ServerInfo)>,
    ) -> Self {
        let mut regions: Vec<RegionServers> = Vec::new();

        for (region, server) in servers {
            match regions.iter_mut().find(|r| r.region == region) {
                Some(existing) => existing.servers.push(server),
                None => regions.push(RegionServers { region, servers: vec![server] }),
            }
        }

        Self { regions }
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn server_count(&self) -> usize {
        self.regions.iter().map(|r| r.servers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.server_count() == 0
    }
}
