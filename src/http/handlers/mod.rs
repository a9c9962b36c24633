//! HTTP request handlers.
//!
//! Handlers are thin wrappers over the orchestrator and the provider.

pub mod feedback;
pub mod health;
pub mod measurement;
pub mod servers;
