//! Calculation logic for the Payroll Calculation & Review Engine.
//!
//! This module contains the pure computation functions of the payroll core:
//! statutory deduction calculation, per-item gross/net derivation with
//! pro-ration and deduction capping, review-time anomaly detection, and the
//! full-fold aggregate reconciliation. Nothing in here performs I/O; the
//! orchestrator persists whatever these functions produce.

mod anomalies;
mod deductions;
mod item_compute;
mod reconcile;

use rust_decimal::{Decimal, RoundingStrategy};

pub use anomalies::{
    detect_anomalies, NET_PAY_SWING_RATIO, OVERTIME_HOURS_WARNING_THRESHOLD,
};
pub use deductions::{
    ConfiguredDeductions, DeductionCalculator, DeductionLine, DeductionResult,
};
pub use item_compute::{
    compute_item, compute_overtime_pay, prorate_base_salary, ItemComputation, OvertimeComputation,
    ProrationBasis,
};
pub use reconcile::reconcile_totals;

/// Rounds a monetary amount to the currency's minor unit using
/// round-half-up.
///
/// Applied once at the end of a computation, never at intermediate steps,
/// so results stay reproducible.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let amount = Decimal::from_str("1234.5").unwrap();
/// assert_eq!(round_money(amount, 0), Decimal::from_str("1235").unwrap());
/// ```
pub fn round_money(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}
