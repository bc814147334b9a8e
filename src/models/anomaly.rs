//! Anomaly model for review-time checks.
//!
//! An anomaly is a detected condition worth human review before approval.
//! It never blocks computation or a status transition on its own.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How urgently a detected anomaly needs reviewer attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySeverity {
    /// Informational; the item may simply need a second look.
    Info,
    /// Suspicious value; review before approving.
    Warning,
    /// Strong signal of a computation or data problem.
    Error,
}

/// A detected condition on one employee's payroll line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    /// The severity of the finding.
    pub severity: AnomalySeverity,
    /// The employee the finding targets.
    pub employee_id: String,
    /// The item field the finding is about (e.g., `net_pay`).
    pub field: String,
    /// Human-readable description of the finding.
    pub message: String,
    /// The value that triggered the rule.
    pub observed: Decimal,
    /// The reference value the rule compared against, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Decimal>,
}
