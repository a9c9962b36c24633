//! Cloudflare speed test backend.
//!
//! Latency comes from zero-byte downloads, throughput from timed transfers
//! of increasing size against `/__down` and `/__up`.

pub mod client;
pub mod probe;
pub mod provider;
pub mod requests;

pub use client::{Client, BASE_URL};
pub use probe::{DataBlock, ProbeConfig};
pub use provider::{CloudflareProvider, CloudflareSession};
