//! HTTP API module for the payroll engine.
//!
//! This module provides the REST endpoints for the payroll run lifecycle:
//! creating runs, bulk computation, review transitions, manual item
//! adjustment, and the anomaly report.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    AdjustItemRequest, ComputeRequest, CreateRunRequest, MarkPaidRequest, RosterEntry,
};
pub use response::ApiError;
pub use state::AppState;
