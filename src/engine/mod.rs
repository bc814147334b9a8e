//! Stateful orchestration for the Payroll Calculation & Review Engine.
//!
//! This module owns the run lifecycle: persistence behind the
//! [`PayrollRepository`] trait, the external collaborator seams, and the
//! [`PayrollEngine`] orchestrator that ties the pure calculation layer to
//! both.

mod collaborators;
mod memory;
mod orchestrator;
mod repository;

pub use collaborators::{
    AttendanceSource, AuditError, AuditEvent, AuditSink, CompensationSource, FixedAttendance,
    FixedCompensation, LoggingAuditSink, OvertimeSummary,
};
pub use memory::InMemoryRepository;
pub use orchestrator::{AdjustItem, NewRun, PayrollEngine};
pub use repository::PayrollRepository;
