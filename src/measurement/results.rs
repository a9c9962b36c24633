//! Result data structures.
//!
//! Both types are immutable once built and serialize with the field names
//! the browser frontend expects.

use crate::stats::round2;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The measurement server a run was performed against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub sponsor: String,
    /// Part of `name` before the first comma.
    pub city: String,
    pub country: String,
    pub host: String,
    #[serde(rename = "distance")]
    pub distance_km: f64,
    #[serde(rename = "latency")]
    pub latency_ms: f64,
}

impl ServerInfo {
    /// Build server info, deriving `city` from `name`.
    pub fn new(
        name: impl Into<String>,
        sponsor: impl Into<String>,
        country: impl Into<String>,
        host: impl Into<String>,
        distance_km: f64,
        latency_ms: f64,
    ) -> Self {
        let name = name.into();
        let city = city_from_name(&name);

        Self {
            name,
            sponsor: sponsor.into(),
            city,
            country: country.into(),
            host: host.into(),
            distance_km,
            latency_ms,
        }
    }
}

/// Text before the first comma, trimmed. A blank city reads as "Unknown".
fn city_from_name(name: &str) -> String {
    match name.split(',').next().map(str::trim) {
        Some(city) if !city.is_empty() => city.to_string(),
        _ => "Unknown".to_string(),
    }
}

/// Byte counters accumulated by a provider session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferTotals {
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Raw numbers handed over by the provider at the end of a run.
#[derive(Debug, Clone)]
pub struct RawMeasurement {
    pub server: ServerInfo,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub ping_ms: f64,
    /// True jitter when the provider measured one.
    pub jitter_ms: Option<f64>,
    pub packet_loss_pct: Option<f64>,
    pub totals: TransferTotals,
    pub share_url: Option<String>,
}

/// A completed measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementResult {
    #[serde(rename = "download")]
    pub download_mbps: f64,
    #[serde(rename = "upload")]
    pub upload_mbps: f64,
    #[serde(rename = "ping")]
    pub ping_ms: f64,
    #[serde(rename = "jitter")]
    pub jitter_ms: f64,
    #[serde(rename = "packet_loss")]
    pub packet_loss_pct: f64,
    pub server: ServerInfo,
    pub timestamp: DateTime<Utc>,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub share_url: Option<String>,
}

impl MeasurementResult {
    /// Assemble a result stamped with the current time.
    ///
    /// Speeds and latency are rounded to two decimals. Without a measured
    /// jitter the ping is used in its place; unmeasured packet loss is 0.
    pub fn from_raw(raw: RawMeasurement) -> Self {
        Self::from_raw_at(raw, Utc::now())
    }

    pub fn from_raw_at(raw: RawMeasurement, timestamp: DateTime<Utc>) -> Self {
        let ping_ms = round2(raw.ping_ms);

        Self {
            download_mbps: round2(raw.download_mbps),
            upload_mbps: round2(raw.upload_mbps),
            ping_ms,
            jitter_ms: raw.jitter_ms.map(round2).unwrap_or(ping_ms),
            packet_loss_pct: raw.packet_loss_pct.unwrap_or(0.0),
            server: raw.server,
            timestamp,
            bytes_sent: raw.totals.bytes_sent,
            bytes_received: raw.totals.bytes_received,
            share_url: raw.share_url.filter(|url| !url.is_empty()),
        }
    }
}
