//! Request types for the payroll engine API.
//!
//! This module defines the JSON request structures for the run lifecycle
//! endpoints and their conversions into engine parameter types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{AdjustItem, NewRun};
use crate::models::{EmployeeRef, RunType};

/// Request body for the `POST /runs` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRunRequest {
    /// The company the run belongs to.
    pub company_id: Uuid,
    /// Human-readable run name.
    pub name: String,
    /// The kind of run.
    pub run_type: RunType,
    /// The pay month in `YYYY-MM` form.
    pub year_month: String,
    /// First day of the pay period (inclusive).
    pub period_start: NaiveDate,
    /// Last day of the pay period (inclusive).
    pub period_end: NaiveDate,
    /// Optional payout date.
    #[serde(default)]
    pub pay_date: Option<NaiveDate>,
    /// Currency override; defaults to the jurisdiction's currency.
    #[serde(default)]
    pub currency: Option<String>,
}

/// One roster entry in a bulk compute request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    /// The employee's identifier.
    pub id: String,
    /// The employee's hire date, used for pro-ration and anomaly checks.
    pub hire_date: NaiveDate,
}

/// Request body for the `POST /runs/:id/compute` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeRequest {
    /// The employees to compute items for.
    pub employees: Vec<RosterEntry>,
}

/// Request body for the `PATCH /runs/:id/items/:item_id` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjustItemRequest {
    /// New base salary, if overridden.
    #[serde(default)]
    pub base_salary: Option<Decimal>,
    /// New overtime pay, if overridden.
    #[serde(default)]
    pub overtime_pay: Option<Decimal>,
    /// New bonus, if overridden.
    #[serde(default)]
    pub bonus: Option<Decimal>,
    /// New allowances, if overridden.
    #[serde(default)]
    pub allowances: Option<Decimal>,
    /// Manual deduction total replacing the calculator, if supplied.
    #[serde(default)]
    pub deduction_override: Option<Decimal>,
    /// Why the adjustment was made. Required.
    pub adjustment_reason: String,
    /// Optimistic concurrency guard.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Request body for the `POST /runs/:id/pay` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkPaidRequest {
    /// Payout date, if not already set on the run.
    #[serde(default)]
    pub pay_date: Option<NaiveDate>,
}

impl From<CreateRunRequest> for NewRun {
    fn from(req: CreateRunRequest) -> Self {
        NewRun {
            company_id: req.company_id,
            name: req.name,
            run_type: req.run_type,
            year_month: req.year_month,
            period_start: req.period_start,
            period_end: req.period_end,
            pay_date: req.pay_date,
            currency: req.currency,
        }
    }
}

impl From<RosterEntry> for EmployeeRef {
    fn from(req: RosterEntry) -> Self {
        EmployeeRef {
            id: req.id,
            hire_date: req.hire_date,
        }
    }
}

impl From<AdjustItemRequest> for AdjustItem {
    fn from(req: AdjustItemRequest) -> Self {
        AdjustItem {
            base_salary: req.base_salary,
            overtime_pay: req.overtime_pay,
            bonus: req.bonus,
            allowances: req.allowances,
            deduction_override: req.deduction_override,
            adjustment_reason: req.adjustment_reason,
            expected_version: req.expected_version,
        }
    }
}
