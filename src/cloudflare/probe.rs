use crate::cloudflare::client::Transfer;
use crate::retry::RetryConfig;
use crate::stats::percentile_f64;
use std::time::Duration;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A data block configuration for bandwidth tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataBlock {
    /// Size of the data block in bytes
    pub bytes: u64,
    /// Number of measurements to perform at this size
    pub count: usize,
}

impl DataBlock {
    pub const fn new(bytes: u64, count: usize) -> Self {
        Self { bytes, count }
    }
}

/// Parameters of the Cloudflare probe sequence.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Default: 100KB(10), 1MB(8), 10MB(6), 25MB(4)
    pub download_sizes: Vec<DataBlock>,

    /// Default: 100KB(8), 1MB(6), 10MB(4)
    pub upload_sizes: Vec<DataBlock>,

    /// Number of zero-byte requests used to measure latency.
    /// Default: 10
    pub latency_packets: usize,

    /// Once a single transfer takes this long (in ms), larger sizes are
    /// skipped.
    /// Default: 1000ms
    pub bandwidth_finish_duration_ms: f64,

    /// Transfers shorter than this (in ms) are too noisy to count.
    /// Default: 10ms
    pub bandwidth_min_duration_ms: f64,

    /// Default: 0.9
    pub bandwidth_percentile: f64,

    pub retry_config: RetryConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            download_sizes: vec![
                DataBlock::new(100_000, 10),   // 100KB
                DataBlock::new(1_000_000, 8),  // 1MB
                DataBlock::new(10_000_000, 6), // 10MB
                DataBlock::new(25_000_000, 4), // 25MB
            ],
            upload_sizes: vec![
                DataBlock::new(100_000, 8),    // 100KB
                DataBlock::new(1_000_000, 6),  // 1MB
                DataBlock::new(10_000_000, 4), // 10MB
            ],
            latency_packets: 10,
            bandwidth_finish_duration_ms: 1000.0,
            bandwidth_min_duration_ms: 10.0,
            bandwidth_percentile: 0.9,
            retry_config: RetryConfig::default(),
        }
    }
}

/// Which way the payload of a transfer travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Download,
    Upload,
}

/// One timed transfer reduced to the numbers aggregation needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandwidthMeasurement {
    pub bytes: u64,
    pub bandwidth_bps: f64,
    pub duration_ms: f64,
}

impl BandwidthMeasurement {
    /// Downloads stream after the headers, so only the body time counts.
    /// Uploads are sent before the response, so the time to headers counts.
    /// Server processing time is subtracted from both.
    pub fn from_transfer(transfer: &Transfer, direction: Direction) -> Self {
        let (bytes, elapsed) = match direction {
            Direction::Download => (
                transfer.bytes_received,
                transfer.total.saturating_sub(transfer.ttfb),
            ),
            Direction::Upload => (transfer.bytes_sent, transfer.ttfb),
        };
        let effective = elapsed.saturating_sub(transfer.server_time);

        Self {
            bytes,
            bandwidth_bps: bandwidth_bps(bytes, effective),
            duration_ms: as_millis_f64(transfer.total),
        }
    }
}

/// Bits per second moved in `elapsed`; zero when nothing was timed.
pub fn bandwidth_bps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / secs
}

pub fn bps_to_mbps(bps: f64) -> f64 {
    bps / 1_000_000.0
}

/// Round-trip latency of a zero-byte request, without server processing.
pub fn latency_ms(transfer: &Transfer) -> f64 {
    as_millis_f64(transfer.ttfb.saturating_sub(transfer.server_time))
}

/// Percentile of the measurements long enough to be meaningful, in Mbps.
pub fn aggregate_mbps(
    measurements: &[BandwidthMeasurement],
    percentile: f64,
    min_duration_ms: f64,
) -> Option<f64> {
    let mut bandwidths: Vec<f64> = measurements
        .iter()
        .filter(|m| m.duration_ms >= min_duration_ms)
        .map(|m| m.bandwidth_bps)
        .collect();

    percentile_f64(&mut bandwidths, percentile).map(bps_to_mbps)
}

/// Great-circle distance between two points given in degrees.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
