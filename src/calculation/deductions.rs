//! Statutory deduction calculation.
//!
//! This module provides the [`DeductionCalculator`] trait, the fixed
//! interface through which gross pay is mapped to statutory deductions, and
//! [`ConfiguredDeductions`], the policy-file-driven implementation. One
//! implementation exists per jurisdiction or company policy; the engine
//! only ever sees the trait.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::round_money;
use crate::config::DeductionPolicy;

/// One component of a deduction breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLine {
    /// Short identifier for the component (e.g., "national_pension").
    pub code: String,
    /// Human-readable description.
    pub description: String,
    /// The rounded amount deducted for this component.
    pub amount: Decimal,
}

/// The outcome of a deduction calculation.
///
/// `total` always equals the sum of the breakdown amounts and is never
/// negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionResult {
    /// Total deductions.
    pub total: Decimal,
    /// Per-component breakdown.
    pub breakdown: Vec<DeductionLine>,
}

impl DeductionResult {
    /// A result with no deductions at all.
    pub fn zero() -> Self {
        Self {
            total: Decimal::ZERO,
            breakdown: Vec::new(),
        }
    }
}

/// Maps gross pay to statutory deductions for one jurisdiction.
///
/// Implementations must be pure and deterministic: no I/O, no clock, and
/// identical input always yields an identical result. They never return a
/// negative total, and zero gross pay yields zero deductions.
pub trait DeductionCalculator: Send + Sync {
    /// Computes the deductions for the given gross pay.
    fn compute(&self, gross_pay: Decimal) -> DeductionResult;
}

/// Deduction calculator driven by a loaded [`DeductionPolicy`].
///
/// Computes proportional social-insurance contributions (each optionally
/// capped at a monthly contribution base), marginal income tax over the
/// configured brackets, and a local surtax expressed as a fraction of the
/// income tax. Every component is rounded to the currency's minor unit
/// once, at the end; the total is the sum of the rounded components.
#[derive(Debug, Clone)]
pub struct ConfiguredDeductions {
    policy: DeductionPolicy,
    scale: u32,
}

impl ConfiguredDeductions {
    /// Creates a calculator from a deduction policy and the currency's
    /// minor-unit count.
    pub fn new(policy: DeductionPolicy, scale: u32) -> Self {
        Self { policy, scale }
    }

    fn income_tax(&self, gross_pay: Decimal) -> Decimal {
        let mut tax = Decimal::ZERO;
        let mut lower = Decimal::ZERO;
        for bracket in &self.policy.income_tax.brackets {
            let upper = bracket.up_to.unwrap_or(gross_pay);
            if gross_pay <= lower {
                break;
            }
            let taxable = gross_pay.min(upper) - lower;
            if taxable > Decimal::ZERO {
                tax += taxable * bracket.rate;
            }
            lower = upper;
        }
        tax
    }
}

impl DeductionCalculator for ConfiguredDeductions {
    fn compute(&self, gross_pay: Decimal) -> DeductionResult {
        if gross_pay <= Decimal::ZERO {
            return DeductionResult::zero();
        }

        let mut breakdown = Vec::new();

        for line in &self.policy.insurance_lines {
            let base = match line.monthly_cap {
                Some(cap) => gross_pay.min(cap),
                None => gross_pay,
            };
            breakdown.push(DeductionLine {
                code: line.code.clone(),
                description: line.description.clone(),
                amount: round_money(base * line.rate, self.scale),
            });
        }

        let income_tax = self.income_tax(gross_pay);
        breakdown.push(DeductionLine {
            code: "income_tax".to_string(),
            description: "Withholding income tax".to_string(),
            amount: round_money(income_tax, self.scale),
        });
        breakdown.push(DeductionLine {
            code: "local_income_tax".to_string(),
            description: "Local income surtax".to_string(),
            amount: round_money(income_tax * self.policy.local_surtax_rate, self.scale),
        });

        let total: Decimal = breakdown.iter().map(|line| line.amount).sum();

        DeductionResult { total, breakdown }
    }
}
