//! Payroll item model.
//!
//! An item is one employee's payroll line within a run. Its derived fields
//! (gross pay, deductions, net pay) are always recomputed from the input
//! fields by the item computer and never stored independently of them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::DeductionLine;

/// The authored monetary inputs for one employee's payroll line.
///
/// All amounts are non-negative and in the owning run's currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInputs {
    /// Monthly base salary, pro-rated for mid-period hires.
    pub base_salary: Decimal,
    /// Overtime pay for the period.
    pub overtime_pay: Decimal,
    /// Bonus for the period.
    pub bonus: Decimal,
    /// Allowances for the period.
    pub allowances: Decimal,
}

impl ItemInputs {
    /// Inputs with every amount zero.
    pub fn zero() -> Self {
        Self {
            base_salary: Decimal::ZERO,
            overtime_pay: Decimal::ZERO,
            bonus: Decimal::ZERO,
            allowances: Decimal::ZERO,
        }
    }
}

/// Structured computation trace for one payroll item.
///
/// Written by the item computer and read by the anomaly detector; the
/// orchestrator treats it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputationDetail {
    /// Aggregated overtime hours reported for the period.
    pub overtime_hours: Decimal,
    /// The hourly rate the overtime pay was derived from, if computed
    /// from attendance rather than overridden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overtime_hourly_rate: Option<Decimal>,
    /// The employee's hire date as known at computation time.
    pub hire_date: NaiveDate,
    /// True when base salary was pro-rated for a mid-period hire.
    pub pro_rated: bool,
    /// Calendar days the employee was active within the period, when
    /// pro-rated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proration_numerator: Option<u32>,
    /// Calendar days in the period, when pro-rated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proration_denominator: Option<u32>,
    /// Per-component breakdown of the deductions.
    pub deduction_breakdown: Vec<DeductionLine>,
    /// True when computed deductions exceeded gross pay and were capped.
    pub deductions_capped: bool,
    /// True when a manual deduction override replaced the calculator.
    pub deductions_overridden: bool,
}

/// One employee's payroll line within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollItem {
    /// Unique identifier for the item.
    pub id: Uuid,
    /// The run that owns this item.
    pub run_id: Uuid,
    /// The employee this line pays.
    pub employee_id: String,
    /// The authored monetary inputs.
    pub inputs: ItemInputs,
    /// Derived: sum of the four input amounts.
    pub gross_pay: Decimal,
    /// Derived: statutory deductions (capped at gross pay).
    pub deductions: Decimal,
    /// Derived: gross pay minus deductions; never negative.
    pub net_pay: Decimal,
    /// Structured computation trace for review tooling.
    pub detail: ComputationDetail,
    /// True once the item has been manually adjusted during review.
    pub is_manually_adjusted: bool,
    /// The mandatory reason supplied with a manual adjustment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment_reason: Option<String>,
}
