//! Error types for the Payroll Calculation & Review Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while managing payroll runs.

use thiserror::Error;
use uuid::Uuid;

use crate::models::RunStatus;

/// The main error type for the Payroll Calculation & Review Engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::Validation {
///     field: "base_salary".to_string(),
///     message: "must not be negative".to_string(),
/// };
/// assert_eq!(error.to_string(), "Invalid field 'base_salary': must not be negative");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed input rejected before any write.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// An operation was attempted against a run in the wrong status.
    #[error("Run is {actual}, operation requires {required}")]
    WrongStatus {
        /// The status the operation requires.
        required: RunStatus,
        /// The run's current status.
        actual: RunStatus,
    },

    /// A run status transition that the state machine does not allow.
    #[error("Illegal run transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: RunStatus,
        /// The requested status.
        to: RunStatus,
    },

    /// No run with the given id exists for the company.
    #[error("Payroll run not found: {run_id}")]
    RunNotFound {
        /// The run id that was not found.
        run_id: Uuid,
    },

    /// No item with the given id exists in the run.
    #[error("Payroll item not found: {item_id}")]
    ItemNotFound {
        /// The item id that was not found.
        item_id: Uuid,
    },

    /// Concurrent mutation contention; safe to retry with fresh data.
    #[error("Conflicting update: {message}")]
    Conflict {
        /// A description of the conflict.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A collaborator lookup failed (compensation or attendance source).
    #[error("Collaborator lookup failed for employee '{employee_id}': {message}")]
    CollaboratorError {
        /// The employee the lookup was for.
        employee_id: String,
        /// A description of the failure.
        message: String,
    },

    /// The persistence layer failed mid-operation; the write was rolled
    /// back and the operation may be retried.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the storage failure.
        message: String,
    },
}

impl EngineError {
    /// Returns true if a caller may safely retry the operation with
    /// fresh data.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Storage { .. })
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
