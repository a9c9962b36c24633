use crate::cloudflare::client::{Client, Transfer};
use crate::cloudflare::probe::{
    aggregate_mbps, haversine_km, latency_ms, BandwidthMeasurement, DataBlock,
    Direction, ProbeConfig,
};
use crate::cloudflare::requests::download::Download;
use crate::cloudflare::requests::locations::Locations;
use crate::cloudflare::requests::meta::MetaRequest;
use crate::cloudflare::requests::upload::Upload;
use crate::errors::{ErrorKind, MeasurementError};
use crate::measurement::{
    MeasurementProvider, MeasurementSession, ServerDirectory, ServerInfo,
    TransferTotals,
};
use crate::retry::retry_async;
use crate::stats::{jitter_f64, median_f64, round2};
use async_trait::async_trait;
use log::{debug, info, warn};

const SPONSOR: &str = "Cloudflare";

/// Measures against Cloudflare's speed test endpoints.
#[derive(Debug, Clone)]
pub struct CloudflareProvider {
    client: Client,
    config: ProbeConfig,
}

impl CloudflareProvider {
    pub fn new(client: Client, config: ProbeConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl MeasurementProvider for CloudflareProvider {
    async fn open_session(
        &self,
    ) -> Result<Box<dyn MeasurementSession>, MeasurementError> {
        Ok(Box::new(CloudflareSession::new(
            self.client.clone(),
            self.config.clone(),
        )))
    }

    async fn list_servers(&self) -> Result<ServerDirectory, MeasurementError> {
        let locations = self
            .client
            .send(Locations {}, ErrorKind::DirectoryUnavailable)
            .await?
            .into_inner();

        let host = self.client.host();
        debug!("Cloudflare lists {} locations", locations.len());

        Ok(ServerDirectory::from_servers(locations.into_iter().map(
            |location| {
                let region = if location.region.is_empty() {
                    "Other".to_string()
                } else {
                    location.region
                };
                let city = if location.city.is_empty() {
                    location.iata
                } else {
                    location.city
                };
                let server = ServerInfo::new(
                    format!("{}, {}", city, location.cca2),
                    SPONSOR,
                    location.cca2,
                    host.clone(),
                    0.0,
                    0.0,
                );
                (region, server)
            },
        )))
    }
}

/// Per-run state: the colo serving us, its latency and the bytes moved.
pub struct CloudflareSession {
    client: Client,
    config: ProbeConfig,
    ping_ms: f64,
    jitter_ms: Option<f64>,
    totals: TransferTotals,
}

impl CloudflareSession {
    fn new(client: Client, config: ProbeConfig) -> Self {
        Self {
            client,
            config,
            ping_ms: 0.0,
            jitter_ms: None,
            totals: TransferTotals::default(),
        }
    }

    fn record(&mut self, transfer: &Transfer) {
        self.totals.bytes_sent += transfer.bytes_sent;
        self.totals.bytes_received += transfer.bytes_received;
    }

    /// Zero-byte downloads; failed probes are skipped.
    async fn probe_latency(&mut self) -> Result<Vec<f64>, MeasurementError> {
        let packets = self.config.latency_packets.max(1);
        let client = self.client.clone();
        let request = Download { bytes: 0 };
        let mut latencies = Vec::with_capacity(packets);
        let mut last_error = None;

        for i in 0..packets {
            let operation_name =
                format!("latency measurement {}/{}", i + 1, packets);
            let result =
                retry_async(&self.config.retry_config, &operation_name, || {
                    client.transfer(&request)
                })
                .await;

            match result {
                Ok(transfer) => {
                    self.record(&transfer);
                    let latency = latency_ms(&transfer);
                    debug!("Latency: {:.2} ms", latency);
                    latencies.push(latency);
                }
                Err(e) => {
                    warn!("{}", e.message);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if latencies.is_empty() => Err(MeasurementError::no_server_found(
                format!("All {} latency measurements failed", packets),
            )
            .with_source(e)),
            _ => Ok(latencies),
        }
    }

    async fn measure(
        &mut self,
        direction: Direction,
    ) -> Result<f64, MeasurementError> {
        let (label, blocks) = match direction {
            Direction::Download => ("download", self.config.download_sizes.clone()),
            Direction::Upload => ("upload", self.config.upload_sizes.clone()),
        };

        let mut measurements = Vec::new();
        let mut last_error = None;

        for block in blocks {
            info!(
                "Running {} test: {} bytes x {} iterations",
                label, block.bytes, block.count
            );

            let (block_measurements, finished) =
                self.run_block(&block, direction, label, &mut last_error).await;
            measurements.extend(block_measurements);

            if finished {
                info!("Early termination triggered for {} at {} bytes", label, block.bytes);
                break;
            }
        }

        if measurements.is_empty() {
            let error = MeasurementError::probe_failure(format!(
                "Every {} transfer failed",
                label
            ));
            return Err(match last_error {
                Some(e) if e.kind == ErrorKind::Timeout => e,
                Some(e) => error.with_source(e),
                None => error,
            });
        }

        // Fall back to every sample when none ran long enough to be filtered in.
        let mbps = aggregate_mbps(
            &measurements,
            self.config.bandwidth_percentile,
            self.config.bandwidth_min_duration_ms,
        )
        .or_else(|| {
            aggregate_mbps(&measurements, self.config.bandwidth_percentile, 0.0)
        })
        .unwrap_or(0.0);

        info!("{} speed: {:.2} Mbps", label, mbps);
        Ok(mbps)
    }

    /// Run one block, returning its measurements and whether a transfer
    /// reached the finish duration.
    async fn run_block(
        &mut self,
        block: &DataBlock,
        direction: Direction,
        label: &str,
        last_error: &mut Option<MeasurementError>,
    ) -> (Vec<BandwidthMeasurement>, bool) {
        let client = self.client.clone();
        let mut measurements = Vec::with_capacity(block.count);
        let mut finished = false;

        for i in 0..block.count {
            let operation_name = format!(
                "{} {}B iteration {}/{}",
                label,
                block.bytes,
                i + 1,
                block.count
            );
            let retry = &self.config.retry_config;

            let result = match direction {
                Direction::Download => {
                    let request = Download { bytes: block.bytes };
                    retry_async(retry, &operation_name, || {
                        client.transfer(&request)
                    })
                    .await
                }
                Direction::Upload => {
                    let request = Upload::new(block.bytes);
                    retry_async(retry, &operation_name, || {
                        client.transfer(&request)
                    })
                    .await
                }
            };

            match result {
                Ok(transfer) => {
                    self.record(&transfer);
                    let measurement =
                        BandwidthMeasurement::from_transfer(&transfer, direction);
                    if measurement.duration_ms
                        >= self.config.bandwidth_finish_duration_ms
                    {
                        finished = true;
                    }
                    measurements.push(measurement);
                }
                Err(e) => {
                    warn!("{}. Continuing with remaining iterations.", e.message);
                    *last_error = Some(e);
                }
            }
        }

        (measurements, finished)
    }
}

#[async_trait]
impl MeasurementSession for CloudflareSession {
    async fn discover_best_server(
        &mut self,
    ) -> Result<ServerInfo, MeasurementError> {
        let client = self.client.clone();
        let meta = retry_async(
            &self.config.retry_config,
            "server discovery",
            || client.send(MetaRequest {}, ErrorKind::NoServerFound),
        )
        .await?;

        let colo = meta.colo.clone().ok_or_else(|| {
            MeasurementError::no_server_found(
                "Cloudflare did not report a serving datacenter",
            )
            .with_suggestion("Check your network connection and try again")
        })?;

        let mut latencies = self.probe_latency().await?;
        self.jitter_ms = jitter_f64(&latencies);
        self.ping_ms = median_f64(&mut latencies).unwrap_or_default();

        let distance = meta
            .client_coordinates()
            .map(|origin| haversine_km(origin, (colo.lat, colo.lon)))
            .unwrap_or_default();

        let city = if colo.city.is_empty() { colo.iata.clone() } else { colo.city };
        let server = ServerInfo::new(
            format!("{}, {}", city, colo.cca2),
            SPONSOR,
            colo.cca2,
            self.client.host(),
            round2(distance),
            round2(self.ping_ms),
        );

        info!(
            "Selected {} ({}), latency {:.2} ms",
            server.name, colo.iata, self.ping_ms
        );
        Ok(server)
    }

    async fn measure_download(&mut self) -> Result<f64, MeasurementError> {
        self.measure(Direction::Download).await
    }

    async fn measure_upload(&mut self) -> Result<f64, MeasurementError> {
        self.measure(Direction::Upload).await
    }

    fn last_ping_ms(&self) -> f64 {
        self.ping_ms
    }

    fn jitter_ms(&self) -> Option<f64> {
        self.jitter_ms
    }

    fn totals(&self) -> TransferTotals {
        self.totals
    }
}
