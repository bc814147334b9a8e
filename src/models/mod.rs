//! Core data models for the Payroll Calculation & Review Engine.
//!
//! This module contains all the domain records used throughout the engine.

mod anomaly;
mod employee;
mod item;
mod run;

pub use anomaly::{Anomaly, AnomalySeverity};
pub use employee::EmployeeRef;
pub use item::{ComputationDetail, ItemInputs, PayrollItem};
pub use run::{PayrollRun, RunStatus, RunTotals, RunType};
