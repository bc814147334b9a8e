//! Jurisdiction policy loading for the Payroll Calculation & Review Engine.
//!
//! This module loads pay and deduction policy from YAML files, one
//! directory per jurisdiction.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/kr").unwrap();
//! println!("Loaded policy for {}", config.pay().jurisdiction);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{DeductionPolicy, IncomeTaxPolicy, InsuranceLine, PayPolicy, TaxBracket};
