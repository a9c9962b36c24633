//! Single-flight internet speed measurement behind a small JSON API.
//!
//! A [`measurement::MeasurementOrchestrator`] runs at most one measurement
//! at a time against a [`measurement::MeasurementProvider`]; the `http`
//! module exposes it to polling browser clients.

pub mod cloudflare;
pub mod config;
pub mod errors;
pub mod http;
pub mod measurement;
pub mod retry;
pub mod stats;
