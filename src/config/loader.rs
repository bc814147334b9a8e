//! Policy loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading jurisdiction
//! pay and deduction policy from YAML files.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::calculation::ConfiguredDeductions;
use crate::error::{EngineError, EngineResult};

use super::types::{DeductionPolicy, PayPolicy};

/// Loads and provides access to jurisdiction payroll policy.
///
/// # Directory Structure
///
/// ```text
/// config/kr/
/// ├── policy.yaml      # Currency and pay-derivation constants
/// └── deductions.yaml  # Insurance rates and income-tax brackets
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/kr").unwrap();
/// assert_eq!(loader.pay().currency, "KRW");
/// let calculator = loader.calculator();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pay: PayPolicy,
    deductions: DeductionPolicy,
}

impl ConfigLoader {
    /// Loads policy from the specified jurisdiction directory.
    ///
    /// Returns an error if a required file is missing, contains invalid
    /// YAML, or is missing a required field.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let pay = Self::load_yaml::<PayPolicy>(&path.join("policy.yaml"))?;
        let deductions = Self::load_yaml::<DeductionPolicy>(&path.join("deductions.yaml"))?;

        Ok(Self { pay, deductions })
    }

    /// Builds a loader directly from in-memory policy, for tests and
    /// embedded setups.
    pub fn from_policy(pay: PayPolicy, deductions: DeductionPolicy) -> Self {
        Self { pay, deductions }
    }

    /// Returns the pay policy.
    pub fn pay(&self) -> &PayPolicy {
        &self.pay
    }

    /// Returns the deduction policy.
    pub fn deductions(&self) -> &DeductionPolicy {
        &self.deductions
    }

    /// Builds the deduction calculator for this jurisdiction.
    pub fn calculator(&self) -> ConfiguredDeductions {
        ConfiguredDeductions::new(self.deductions.clone(), self.pay.minor_units)
    }

    fn load_yaml<T: DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path.display().to_string(),
        })?;

        serde_yaml::from_str(&content).map_err(|err| EngineError::ConfigParseError {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_load_shipped_kr_policy() {
        let loader = ConfigLoader::load("./config/kr").unwrap();
        assert_eq!(loader.pay().jurisdiction, "kr");
        assert_eq!(loader.pay().currency, "KRW");
        assert_eq!(loader.pay().minor_units, 0);
        assert_eq!(
            loader.pay().standard_monthly_hours,
            Decimal::from_str("209").unwrap()
        );
        assert!(!loader.deductions().insurance_lines.is_empty());
        assert!(!loader.deductions().income_tax.brackets.is_empty());
    }

    #[test]
    fn test_missing_directory_reports_config_not_found() {
        let result = ConfigLoader::load("./config/does_not_exist");
        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("policy.yaml"));
            }
            other => panic!("expected ConfigNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_calculator_built_from_shipped_policy() {
        let loader = ConfigLoader::load("./config/kr").unwrap();
        let calculator = loader.calculator();
        use crate::calculation::DeductionCalculator;
        let result = calculator.compute(Decimal::from_str("3000000").unwrap());
        assert!(result.total > Decimal::ZERO);
        assert!(result.total < Decimal::from_str("3000000").unwrap());
    }
}
