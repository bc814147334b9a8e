//! Payroll run model and run status state machine.
//!
//! A run is one payroll batch for a company covering a pay period,
//! containing one item per paid employee. Its status moves through a fixed
//! state machine and its aggregate totals are always derived from the items.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of payroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    /// Regular monthly payroll.
    Monthly,
    /// A bonus-only run.
    Bonus,
    /// Severance payment run.
    Severance,
    /// Ad-hoc special payment run.
    Special,
}

/// The lifecycle status of a payroll run.
///
/// Allowed transitions:
///
/// ```text
/// DRAFT -> REVIEW -> APPROVED -> PAID
///   |        |          |
///   +--------+----------+-----> CANCELLED
/// ```
///
/// `PAID` and `CANCELLED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Items are being assembled; the run is still mutable in bulk.
    Draft,
    /// Items are computed and under human review; manual adjustment allowed.
    Review,
    /// Review finished; items are frozen, waiting for payment.
    Approved,
    /// Paid out. Terminal.
    Paid,
    /// Voided. Terminal.
    Cancelled,
}

impl RunStatus {
    /// Returns true if no further status change is allowed from this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }

    /// Returns true if the state machine allows moving from `self` to `to`.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::RunStatus;
    ///
    /// assert!(RunStatus::Draft.can_transition_to(RunStatus::Review));
    /// assert!(!RunStatus::Paid.can_transition_to(RunStatus::Draft));
    /// ```
    pub fn can_transition_to(self, to: RunStatus) -> bool {
        matches!(
            (self, to),
            (Self::Draft, Self::Review)
                | (Self::Review, Self::Approved)
                | (Self::Approved, Self::Paid)
                | (Self::Draft, Self::Cancelled)
                | (Self::Review, Self::Cancelled)
                | (Self::Approved, Self::Cancelled)
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::Review => "REVIEW",
            Self::Approved => "APPROVED",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Run-level aggregate totals, always derived as a fold over the run's
/// items and never independently authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    /// Number of items (one per paid employee).
    pub headcount: u64,
    /// Sum of item gross pay.
    pub total_gross: Decimal,
    /// Sum of item deductions.
    pub total_deductions: Decimal,
    /// Sum of item net pay.
    pub total_net: Decimal,
}

impl RunTotals {
    /// Totals for a run with no items.
    pub fn zero() -> Self {
        Self {
            headcount: 0,
            total_gross: Decimal::ZERO,
            total_deductions: Decimal::ZERO,
            total_net: Decimal::ZERO,
        }
    }
}

/// One payroll batch for a company covering a pay period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRun {
    /// Unique identifier for the run.
    pub id: Uuid,
    /// The tenant the run belongs to.
    pub company_id: Uuid,
    /// Human-readable name (e.g., "January 2025 payroll").
    pub name: String,
    /// The kind of run.
    pub run_type: RunType,
    /// The pay month in `YYYY-MM` form.
    pub year_month: String,
    /// First day of the pay period (inclusive).
    pub period_start: NaiveDate,
    /// Last day of the pay period (inclusive).
    pub period_end: NaiveDate,
    /// The date wages are paid out; required before the run can become PAID.
    pub pay_date: Option<NaiveDate>,
    /// ISO 4217 currency code for every amount in the run.
    pub currency: String,
    /// Current lifecycle status.
    pub status: RunStatus,
    /// Derived aggregates over the run's items.
    pub totals: RunTotals,
    /// Mutation counter; bumped on every committed change to the run or
    /// its items, used for optimistic conflict detection.
    pub version: u64,
}
