//! JSON web API over the measurement orchestrator.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod sse;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppContext, AppState};
