//! Policy configuration types.
//!
//! These structs mirror the YAML policy files shipped per jurisdiction
//! under `config/<jurisdiction>/`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pay policy for a jurisdiction: the currency and the constants overtime
/// pay is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPolicy {
    /// Jurisdiction identifier (e.g., "kr").
    pub jurisdiction: String,
    /// ISO 4217 currency code payroll runs in this jurisdiction use.
    pub currency: String,
    /// Number of minor units in the currency (0 for KRW, 2 for USD).
    pub minor_units: u32,
    /// Standard paid hours per month used to derive an hourly rate from a
    /// monthly salary.
    pub standard_monthly_hours: Decimal,
    /// Multiplier applied to the hourly rate for overtime hours.
    pub overtime_multiplier: Decimal,
}

/// One proportional social-insurance contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceLine {
    /// Short identifier for the contribution (e.g., "national_pension").
    pub code: String,
    /// Human-readable description.
    pub description: String,
    /// Employee contribution rate applied to gross pay.
    pub rate: Decimal,
    /// Optional monthly contribution base cap.
    #[serde(default)]
    pub monthly_cap: Option<Decimal>,
}

/// One marginal income-tax bracket.
///
/// Brackets are listed in ascending order; `up_to` is the inclusive upper
/// bound of the bracket, with `None` marking the open-ended top bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Inclusive upper bound of the bracket; `None` for the top bracket.
    #[serde(default)]
    pub up_to: Option<Decimal>,
    /// Marginal rate applied within the bracket.
    pub rate: Decimal,
}

/// Simplified monthly withholding income-tax table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxPolicy {
    /// Marginal brackets in ascending order.
    pub brackets: Vec<TaxBracket>,
}

/// Deduction policy for a jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionPolicy {
    /// Proportional social-insurance contributions.
    pub insurance_lines: Vec<InsuranceLine>,
    /// Withholding income-tax brackets.
    pub income_tax: IncomeTaxPolicy,
    /// Local surtax as a fraction of the income tax.
    pub local_surtax_rate: Decimal,
}
