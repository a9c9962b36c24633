//! Measurement orchestration and the types it publishes.

pub mod directory;
pub mod history;
pub mod orchestrator;
pub mod progress;
pub mod provider;
pub mod results;

pub use directory::{sample_servers, DirectorySample};
pub use history::{ResultHistory, HISTORY_CAPACITY};
pub use orchestrator::{
    MeasurementOrchestrator, OrchestratorConfig, StartOutcome, DEFAULT_BUDGET,
};
pub use progress::{ProgressState, TestPhase, TestStatus};
pub use provider::{
    MeasurementProvider, MeasurementSession, RegionServers, ServerDirectory,
};
pub use results::{MeasurementResult, RawMeasurement, ServerInfo, TransferTotals};
