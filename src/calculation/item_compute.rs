//! Per-item payroll computation.
//!
//! This module derives one employee's gross/deduction/net figures from the
//! authored inputs and a [`DeductionCalculator`]. The computation is pure:
//! the orchestrator persists whatever comes back.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::round_money;
use super::{DeductionCalculator, DeductionLine};
use crate::error::{EngineError, EngineResult};
use crate::models::ItemInputs;

/// The derived monetary fields for one payroll item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemComputation {
    /// Sum of the four input amounts.
    pub gross_pay: Decimal,
    /// Deductions, capped at gross pay.
    pub deductions: Decimal,
    /// Gross pay minus deductions; never negative.
    pub net_pay: Decimal,
    /// Per-component deduction breakdown.
    pub breakdown: Vec<DeductionLine>,
    /// True when the computed deductions exceeded gross pay and were
    /// capped. Surfaced later as a warning-level anomaly, not a failure.
    pub deductions_capped: bool,
    /// True when a manual override replaced the deduction calculator.
    pub deductions_overridden: bool,
}

/// The pro-ration basis recorded when a mid-period hire's base salary is
/// reduced to the days actually employed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProrationBasis {
    /// Calendar days employed within the period.
    pub active_days: u32,
    /// Calendar days in the period.
    pub period_days: u32,
}

/// Overtime pay derived from attendance hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeComputation {
    /// The rounded overtime pay for the period.
    pub pay: Decimal,
    /// The effective hourly overtime rate, rounded for display.
    pub hourly_rate: Decimal,
}

fn require_non_negative(field: &str, amount: Decimal) -> EngineResult<()> {
    if amount < Decimal::ZERO {
        return Err(EngineError::Validation {
            field: field.to_string(),
            message: "must not be negative".to_string(),
        });
    }
    Ok(())
}

/// Computes the derived fields for one payroll item.
///
/// Gross pay is the sum of the four inputs. Deductions come from the
/// calculator unless `deduction_override` is supplied (the manual-override
/// path of an adjustment). Negative inputs are rejected as validation
/// errors, not clamped. If deductions would exceed gross pay they are
/// capped at gross pay and `deductions_capped` is set so review surfaces
/// the condition as a warning; net pay is never negative.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::{compute_item, DeductionCalculator, DeductionResult};
/// use payroll_engine::models::ItemInputs;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// struct NoDeductions;
/// impl DeductionCalculator for NoDeductions {
///     fn compute(&self, _gross: Decimal) -> DeductionResult {
///         DeductionResult::zero()
///     }
/// }
///
/// let inputs = ItemInputs {
///     base_salary: Decimal::from_str("3000000").unwrap(),
///     overtime_pay: Decimal::ZERO,
///     bonus: Decimal::ZERO,
///     allowances: Decimal::ZERO,
/// };
/// let computed = compute_item(&inputs, None, &NoDeductions, 0).unwrap();
/// assert_eq!(computed.gross_pay, Decimal::from_str("3000000").unwrap());
/// assert_eq!(computed.net_pay, computed.gross_pay);
/// ```
pub fn compute_item(
    inputs: &ItemInputs,
    deduction_override: Option<Decimal>,
    calculator: &dyn DeductionCalculator,
    scale: u32,
) -> EngineResult<ItemComputation> {
    require_non_negative("base_salary", inputs.base_salary)?;
    require_non_negative("overtime_pay", inputs.overtime_pay)?;
    require_non_negative("bonus", inputs.bonus)?;
    require_non_negative("allowances", inputs.allowances)?;
    if let Some(override_amount) = deduction_override {
        require_non_negative("deduction_override", override_amount)?;
    }

    let gross_pay = round_money(
        inputs.base_salary + inputs.overtime_pay + inputs.bonus + inputs.allowances,
        scale,
    );

    let (raw_deductions, breakdown, overridden) = match deduction_override {
        Some(override_amount) => {
            let amount = round_money(override_amount, scale);
            let line = DeductionLine {
                code: "manual_override".to_string(),
                description: "Manual deduction override".to_string(),
                amount,
            };
            (amount, vec![line], true)
        }
        None => {
            let result = calculator.compute(gross_pay);
            (result.total, result.breakdown, false)
        }
    };

    let deductions_capped = raw_deductions > gross_pay;
    let deductions = if deductions_capped { gross_pay } else { raw_deductions };
    let net_pay = gross_pay - deductions;

    Ok(ItemComputation {
        gross_pay,
        deductions,
        net_pay,
        breakdown,
        deductions_capped,
        deductions_overridden: overridden,
    })
}

/// Pro-rates a monthly base salary for a mid-period hire.
///
/// Returns the (possibly reduced) base salary and the pro-ration basis when
/// one applied. Hires on or before the period start are paid in full; a
/// hire date after the period end yields zero active days.
pub fn prorate_base_salary(
    base_salary: Decimal,
    hire_date: NaiveDate,
    period_start: NaiveDate,
    period_end: NaiveDate,
    scale: u32,
) -> (Decimal, Option<ProrationBasis>) {
    if hire_date <= period_start {
        return (base_salary, None);
    }

    let period_days = (period_end - period_start).num_days() + 1;
    let active_days = if hire_date > period_end {
        0
    } else {
        (period_end - hire_date).num_days() + 1
    };

    let basis = ProrationBasis {
        active_days: active_days as u32,
        period_days: period_days as u32,
    };
    let prorated = round_money(
        base_salary * Decimal::from(active_days) / Decimal::from(period_days),
        scale,
    );
    (prorated, Some(basis))
}

/// Derives overtime pay from aggregated overtime hours.
///
/// The hourly rate is the monthly base salary over the standard monthly
/// hours; overtime is paid at that rate times the configured multiplier.
/// Rounding is applied once, to the final pay amount.
pub fn compute_overtime_pay(
    monthly_base: Decimal,
    overtime_hours: Decimal,
    standard_monthly_hours: Decimal,
    overtime_multiplier: Decimal,
    scale: u32,
) -> OvertimeComputation {
    if standard_monthly_hours <= Decimal::ZERO || overtime_hours <= Decimal::ZERO {
        return OvertimeComputation {
            pay: Decimal::ZERO,
            hourly_rate: Decimal::ZERO,
        };
    }
    let hourly = monthly_base / standard_monthly_hours * overtime_multiplier;
    OvertimeComputation {
        pay: round_money(hourly * overtime_hours, scale),
        hourly_rate: round_money(hourly, scale),
    }
}
