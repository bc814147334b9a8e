//! Run-level aggregate reconciliation.
//!
//! Totals are always recomputed as a full fold over the run's current
//! items, deliberately not incrementally: the run/item invariant stays
//! trivially re-verifiable and repeated increments cannot compound drift.

use crate::models::{PayrollItem, RunTotals};

/// Recomputes a run's aggregates from its items.
///
/// For any run, `total_gross = Σ item.gross_pay`,
/// `total_deductions = Σ item.deductions`, `total_net = Σ item.net_pay`,
/// and `headcount = items.len()`. Invoked after every mutation that
/// touches items.
pub fn reconcile_totals(items: &[PayrollItem]) -> RunTotals {
    RunTotals {
        headcount: items.len() as u64,
        total_gross: items.iter().map(|item| item.gross_pay).sum(),
        total_deductions: items.iter().map(|item| item.deductions).sum(),
        total_net: items.iter().map(|item| item.net_pay).sum(),
    }
}
