//! Payroll Calculation & Review Engine
//!
//! This crate implements the payroll run lifecycle for a multi-tenant HR
//! platform: per-employee gross/deduction/net computation, review-time
//! anomaly detection, bounded manual correction, and run-level aggregate
//! reconciliation that stays consistent under concurrent edits.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
