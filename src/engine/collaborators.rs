//! Collaborator interfaces consumed by the payroll core.
//!
//! The surrounding HR platform supplies compensation data, attendance
//! summaries, and an audit sink. The core only sees these traits;
//! authorization and tenant scoping are preconditions enforced by the
//! caller before any engine operation is invoked.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Aggregated overtime for one employee over a pay period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeSummary {
    /// Total overtime hours reported for the period.
    pub total_overtime_hours: Decimal,
}

/// Supplies the latest base salary per employee.
pub trait CompensationSource: Send + Sync {
    /// Returns the employee's current monthly base salary.
    fn latest_base_salary(&self, employee_id: &str) -> EngineResult<Decimal>;
}

/// Supplies attendance-derived overtime summaries.
pub trait AttendanceSource: Send + Sync {
    /// Returns the employee's aggregated overtime for the period.
    fn overtime_summary(
        &self,
        employee_id: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> EngineResult<OvertimeSummary>;
}

/// A notification emitted after a state transition or adjustment commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Who performed the operation.
    pub actor: String,
    /// The operation (e.g., "run.approved", "item.adjusted").
    pub action: String,
    /// The kind of resource touched ("payroll_run" or "payroll_item").
    pub resource_type: String,
    /// The id of the touched resource.
    pub resource_id: Uuid,
    /// What changed, as a JSON document.
    pub changes: serde_json::Value,
    /// When the event was emitted.
    pub at: DateTime<Utc>,
}

/// Failure to deliver an audit event.
///
/// Audit delivery is best-effort: the engine logs and swallows this error,
/// never rolling back the payroll mutation behind it.
#[derive(Debug, Error)]
#[error("audit sink failure: {0}")]
pub struct AuditError(pub String);

/// Receives audit events after a mutation commits.
pub trait AuditSink: Send + Sync {
    /// Records one audit event.
    fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Compensation source backed by a fixed in-memory table.
///
/// Used by tests, benches, and demo setups; a deployment wires the real
/// compensation service behind the same trait.
#[derive(Debug, Clone, Default)]
pub struct FixedCompensation {
    salaries: HashMap<String, Decimal>,
}

impl FixedCompensation {
    /// Creates a source from (employee id, monthly base salary) pairs.
    pub fn new(salaries: impl IntoIterator<Item = (String, Decimal)>) -> Self {
        Self {
            salaries: salaries.into_iter().collect(),
        }
    }
}

impl CompensationSource for FixedCompensation {
    fn latest_base_salary(&self, employee_id: &str) -> EngineResult<Decimal> {
        self.salaries
            .get(employee_id)
            .copied()
            .ok_or_else(|| EngineError::Validation {
                field: "employee_id".to_string(),
                message: format!("no compensation record for employee '{}'", employee_id),
            })
    }
}

/// Attendance source backed by a fixed in-memory table of overtime hours.
///
/// Employees without an entry report zero overtime.
#[derive(Debug, Clone, Default)]
pub struct FixedAttendance {
    overtime_hours: HashMap<String, Decimal>,
}

impl FixedAttendance {
    /// Creates a source from (employee id, overtime hours) pairs.
    pub fn new(overtime_hours: impl IntoIterator<Item = (String, Decimal)>) -> Self {
        Self {
            overtime_hours: overtime_hours.into_iter().collect(),
        }
    }
}

impl AttendanceSource for FixedAttendance {
    fn overtime_summary(
        &self,
        employee_id: &str,
        _period_start: NaiveDate,
        _period_end: NaiveDate,
    ) -> EngineResult<OvertimeSummary> {
        Ok(OvertimeSummary {
            total_overtime_hours: self
                .overtime_hours
                .get(employee_id)
                .copied()
                .unwrap_or(Decimal::ZERO),
        })
    }
}

/// Audit sink that writes events to the tracing log.
#[derive(Debug, Clone, Default)]
pub struct LoggingAuditSink;

impl AuditSink for LoggingAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        info!(
            actor = %event.actor,
            action = %event.action,
            resource_type = %event.resource_type,
            resource_id = %event.resource_id,
            changes = %event.changes,
            "audit event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_fixed_compensation_returns_salary() {
        let source = FixedCompensation::new([("emp_001".to_string(), dec("3000000"))]);
        assert_eq!(source.latest_base_salary("emp_001").unwrap(), dec("3000000"));
    }

    #[test]
    fn test_fixed_compensation_unknown_employee_is_validation_error() {
        let source = FixedCompensation::default();
        match source.latest_base_salary("ghost") {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "employee_id"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_fixed_attendance_defaults_to_zero_overtime() {
        let source = FixedAttendance::default();
        let summary = source
            .overtime_summary("emp_001", date("2025-01-01"), date("2025-01-31"))
            .unwrap();
        assert_eq!(summary.total_overtime_hours, Decimal::ZERO);
    }

    #[test]
    fn test_fixed_attendance_returns_hours() {
        let source = FixedAttendance::new([("emp_001".to_string(), dec("12.5"))]);
        let summary = source
            .overtime_summary("emp_001", date("2025-01-01"), date("2025-01-31"))
            .unwrap();
        assert_eq!(summary.total_overtime_hours, dec("12.5"));
    }

    #[test]
    fn test_logging_sink_accepts_events() {
        let sink = LoggingAuditSink;
        let result = sink.record(AuditEvent {
            actor: "reviewer".to_string(),
            action: "run.approved".to_string(),
            resource_type: "payroll_run".to_string(),
            resource_id: Uuid::nil(),
            changes: serde_json::json!({}),
            at: Utc::now(),
        });
        assert!(result.is_ok());
    }
}
