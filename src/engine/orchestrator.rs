//! The payroll run orchestrator.
//!
//! [`PayrollEngine`] owns the run state machine: it creates runs, bulk
//! computes items from collaborator inputs, executes manual single-item
//! adjustments with full aggregate recomputation, and enforces the allowed
//! transitions. Every mutation commits through the repository as one
//! atomic unit; audit events are emitted after the commit and never roll
//! it back.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{
    compute_item, compute_overtime_pay, detect_anomalies, prorate_base_salary, reconcile_totals,
    DeductionCalculator,
};
use crate::config::PayPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Anomaly, ComputationDetail, EmployeeRef, ItemInputs, PayrollItem, PayrollRun, RunStatus,
    RunTotals, RunType,
};

use super::collaborators::{AttendanceSource, AuditEvent, AuditSink, CompensationSource};
use super::repository::PayrollRepository;

/// Parameters for creating a payroll run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRun {
    /// The tenant the run belongs to.
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
    /// Optional payout date; may also be set when marking the run paid.
    #[serde(default)]
    pub pay_date: Option<NaiveDate>,
    /// Currency override; defaults to the jurisdiction's currency.
    #[serde(default)]
    pub currency: Option<String>,
}

/// A partial patch of one item's inputs, applied during review.
///
/// Unspecified fields retain their stored value; this is a patch, not a
/// replace. `adjustment_reason` is mandatory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjustItem {
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
    #[serde(default)]
    pub adjustment_reason: String,
    /// Optimistic concurrency guard: reject if the run's version moved.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Orchestrates the payroll run lifecycle over pluggable collaborators.
pub struct PayrollEngine {
    repo: Arc<dyn PayrollRepository>,
    calculator: Arc<dyn DeductionCalculator>,
    compensation: Arc<dyn CompensationSource>,
    attendance: Arc<dyn AttendanceSource>,
    audit: Arc<dyn AuditSink>,
    pay_policy: PayPolicy,
}

impl PayrollEngine {
    /// Creates an engine over the given repository, calculator, and
    /// collaborators.
    pub fn new(
        repo: Arc<dyn PayrollRepository>,
        calculator: Arc<dyn DeductionCalculator>,
        compensation: Arc<dyn CompensationSource>,
        attendance: Arc<dyn AttendanceSource>,
        audit: Arc<dyn AuditSink>,
        pay_policy: PayPolicy,
    ) -> Self {
        Self {
            repo,
            calculator,
            compensation,
            attendance,
            audit,
            pay_policy,
        }
    }

    /// The pay policy the engine was built with.
    pub fn pay_policy(&self) -> &PayPolicy {
        &self.pay_policy
    }

    fn scale(&self) -> u32 {
        self.pay_policy.minor_units
    }

    /// Creates a run in DRAFT with zero totals.
    pub fn create_run(&self, params: NewRun, actor: &str) -> EngineResult<PayrollRun> {
        if params.name.trim().is_empty() {
            return Err(EngineError::Validation {
                field: "name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if params.period_end < params.period_start {
            return Err(EngineError::Validation {
                field: "period_end".to_string(),
                message: "must not precede period_start".to_string(),
            });
        }
        if NaiveDate::parse_from_str(&format!("{}-01", params.year_month), "%Y-%m-%d").is_err() {
            return Err(EngineError::Validation {
                field: "year_month".to_string(),
                message: "must be in YYYY-MM form".to_string(),
            });
        }

        let run = PayrollRun {
            id: Uuid::new_v4(),
            company_id: params.company_id,
            name: params.name,
            run_type: params.run_type,
            year_month: params.year_month,
            period_start: params.period_start,
            period_end: params.period_end,
            pay_date: params.pay_date,
            currency: params
                .currency
                .unwrap_or_else(|| self.pay_policy.currency.clone()),
            status: RunStatus::Draft,
            totals: RunTotals::zero(),
            version: 0,
        };
        self.repo.insert_run(run.clone())?;

        info!(run_id = %run.id, company_id = %run.company_id, "payroll run created");
        self.emit_audit(
            actor,
            "run.created",
            "payroll_run",
            run.id,
            serde_json::json!({ "name": run.name, "year_month": run.year_month }),
        );
        Ok(run)
    }

    /// Lists a company's runs.
    pub fn list_runs(&self, company_id: Uuid) -> EngineResult<Vec<PayrollRun>> {
        self.repo.list_runs(company_id)
    }

    /// Fetches one run together with its items.
    pub fn run_detail(
        &self,
        company_id: Uuid,
        run_id: Uuid,
    ) -> EngineResult<(PayrollRun, Vec<PayrollItem>)> {
        let run = self.repo.fetch_run(company_id, run_id)?;
        let items = self.repo.list_items(company_id, run_id)?;
        Ok((run, items))
    }

    /// Bulk-computes the run's items from collaborator inputs.
    ///
    /// Only allowed while the run is DRAFT; any previously computed items
    /// are replaced. All items are computed up front (each employee's
    /// computation is independent), then the items and the reconciled
    /// totals are committed in one atomic write.
    pub fn compute_items(
        &self,
        company_id: Uuid,
        run_id: Uuid,
        roster: &[EmployeeRef],
        actor: &str,
    ) -> EngineResult<PayrollRun> {
        let mut seen = HashSet::new();
        for employee in roster {
            if !seen.insert(employee.id.as_str()) {
                return Err(EngineError::Validation {
                    field: "employees".to_string(),
                    message: format!("duplicate employee '{}' in roster", employee.id),
                });
            }
        }

        let run = self.repo.fetch_run(company_id, run_id)?;
        if run.status != RunStatus::Draft {
            return Err(EngineError::WrongStatus {
                required: RunStatus::Draft,
                actual: run.status,
            });
        }

        // Compute everything before touching storage; the single commit
        // below is the join point after which totals are reconciled.
        let mut new_items = Vec::with_capacity(roster.len());
        for employee in roster {
            new_items.push(self.compute_one(&run, employee)?);
        }

        self.repo.with_run_mut(company_id, run_id, &mut |run, items| {
            if run.status != RunStatus::Draft {
                return Err(EngineError::WrongStatus {
                    required: RunStatus::Draft,
                    actual: run.status,
                });
            }
            items.clear();
            items.extend(new_items.iter().cloned());
            run.totals = reconcile_totals(items);
            Ok(())
        })?;

        let run = self.repo.fetch_run(company_id, run_id)?;
        info!(
            run_id = %run_id,
            headcount = run.totals.headcount,
            total_gross = %run.totals.total_gross,
            "payroll items computed"
        );
        self.emit_audit(
            actor,
            "run.computed",
            "payroll_run",
            run_id,
            serde_json::json!({ "headcount": run.totals.headcount }),
        );
        Ok(run)
    }

    fn compute_one(&self, run: &PayrollRun, employee: &EmployeeRef) -> EngineResult<PayrollItem> {
        let scale = self.scale();
        let monthly_base = self.compensation.latest_base_salary(&employee.id)?;
        let (base_salary, proration) = prorate_base_salary(
            monthly_base,
            employee.hire_date,
            run.period_start,
            run.period_end,
            scale,
        );

        let summary =
            self.attendance
                .overtime_summary(&employee.id, run.period_start, run.period_end)?;
        let overtime = compute_overtime_pay(
            monthly_base,
            summary.total_overtime_hours,
            self.pay_policy.standard_monthly_hours,
            self.pay_policy.overtime_multiplier,
            scale,
        );

        let inputs = ItemInputs {
            base_salary,
            overtime_pay: overtime.pay,
            bonus: Decimal::ZERO,
            allowances: Decimal::ZERO,
        };
        let computed = compute_item(&inputs, None, self.calculator.as_ref(), scale)?;

        Ok(PayrollItem {
            id: Uuid::new_v4(),
            run_id: run.id,
            employee_id: employee.id.clone(),
            inputs,
            gross_pay: computed.gross_pay,
            deductions: computed.deductions,
            net_pay: computed.net_pay,
            detail: ComputationDetail {
                overtime_hours: summary.total_overtime_hours,
                overtime_hourly_rate: (overtime.pay > Decimal::ZERO)
                    .then_some(overtime.hourly_rate),
                hire_date: employee.hire_date,
                pro_rated: proration.is_some(),
                proration_numerator: proration.map(|p| p.active_days),
                proration_denominator: proration.map(|p| p.period_days),
                deduction_breakdown: computed.breakdown,
                deductions_capped: computed.deductions_capped,
                deductions_overridden: computed.deductions_overridden,
            },
            is_manually_adjusted: false,
            adjustment_reason: None,
        })
    }

    /// Moves a DRAFT run with computed items into REVIEW.
    pub fn submit_for_review(
        &self,
        company_id: Uuid,
        run_id: Uuid,
        actor: &str,
    ) -> EngineResult<PayrollRun> {
        self.transition(company_id, run_id, RunStatus::Review, None, actor)
    }

    /// Approves a run under review; items freeze.
    pub fn approve(&self, company_id: Uuid, run_id: Uuid, actor: &str) -> EngineResult<PayrollRun> {
        self.transition(company_id, run_id, RunStatus::Approved, None, actor)
    }

    /// Marks an approved run paid. A pay date must be supplied here or
    /// have been set earlier.
    pub fn mark_paid(
        &self,
        company_id: Uuid,
        run_id: Uuid,
        pay_date: Option<NaiveDate>,
        actor: &str,
    ) -> EngineResult<PayrollRun> {
        self.transition(company_id, run_id, RunStatus::Paid, pay_date, actor)
    }

    /// Voids a non-terminal run.
    pub fn cancel(&self, company_id: Uuid, run_id: Uuid, actor: &str) -> EngineResult<PayrollRun> {
        self.transition(company_id, run_id, RunStatus::Cancelled, None, actor)
    }

    fn transition(
        &self,
        company_id: Uuid,
        run_id: Uuid,
        to: RunStatus,
        pay_date: Option<NaiveDate>,
        actor: &str,
    ) -> EngineResult<PayrollRun> {
        self.repo.with_run_mut(company_id, run_id, &mut |run, _items| {
            if !run.status.can_transition_to(to) {
                return Err(EngineError::InvalidTransition {
                    from: run.status,
                    to,
                });
            }
            match to {
                RunStatus::Review => {
                    if run.totals.headcount == 0 {
                        return Err(EngineError::Validation {
                            field: "items".to_string(),
                            message: "run has no computed items".to_string(),
                        });
                    }
                }
                RunStatus::Paid => {
                    if let Some(date) = pay_date {
                        run.pay_date = Some(date);
                    }
                    if run.pay_date.is_none() {
                        return Err(EngineError::Validation {
                            field: "pay_date".to_string(),
                            message: "must be set before the run is marked paid".to_string(),
                        });
                    }
                }
                _ => {}
            }
            run.status = to;
            Ok(())
        })?;

        let run = self.repo.fetch_run(company_id, run_id)?;
        info!(run_id = %run_id, status = %run.status, "payroll run transitioned");
        self.emit_audit(
            actor,
            match to {
                RunStatus::Review => "run.submitted",
                RunStatus::Approved => "run.approved",
                RunStatus::Paid => "run.paid",
                RunStatus::Cancelled => "run.cancelled",
                RunStatus::Draft => "run.reopened",
            },
            "payroll_run",
            run_id,
            serde_json::json!({ "status": run.status }),
        );
        Ok(run)
    }

    /// Manually adjusts one item while the run is in REVIEW.
    ///
    /// The patch is merged over the item's stored inputs, the item is
    /// recomputed, and the run's four aggregates are recomputed as a full
    /// fold over all items; the item and the totals commit together or not
    /// at all.
    pub fn adjust_item(
        &self,
        company_id: Uuid,
        run_id: Uuid,
        item_id: Uuid,
        patch: AdjustItem,
        actor: &str,
    ) -> EngineResult<PayrollItem> {
        let reason = patch.adjustment_reason.trim().to_string();
        if reason.is_empty() {
            return Err(EngineError::Validation {
                field: "adjustment_reason".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let calculator = Arc::clone(&self.calculator);
        let scale = self.scale();

        self.repo.with_run_mut(company_id, run_id, &mut |run, items| {
            if let Some(expected) = patch.expected_version {
                if run.version != expected {
                    return Err(EngineError::Conflict {
                        message: format!(
                            "run version is {}, adjustment expected {}",
                            run.version, expected
                        ),
                    });
                }
            }
            if run.status != RunStatus::Review {
                return Err(EngineError::WrongStatus {
                    required: RunStatus::Review,
                    actual: run.status,
                });
            }

            let item = items
                .iter_mut()
                .find(|item| item.id == item_id)
                .ok_or(EngineError::ItemNotFound { item_id })?;

            let merged = ItemInputs {
                base_salary: patch.base_salary.unwrap_or(item.inputs.base_salary),
                overtime_pay: patch.overtime_pay.unwrap_or(item.inputs.overtime_pay),
                bonus: patch.bonus.unwrap_or(item.inputs.bonus),
                allowances: patch.allowances.unwrap_or(item.inputs.allowances),
            };
            let computed =
                compute_item(&merged, patch.deduction_override, calculator.as_ref(), scale)?;

            item.inputs = merged;
            item.gross_pay = computed.gross_pay;
            item.deductions = computed.deductions;
            item.net_pay = computed.net_pay;
            item.detail.deduction_breakdown = computed.breakdown;
            item.detail.deductions_capped = computed.deductions_capped;
            item.detail.deductions_overridden = computed.deductions_overridden;
            item.is_manually_adjusted = true;
            item.adjustment_reason = Some(reason.clone());

            run.totals = reconcile_totals(items);
            Ok(())
        })?;

        let item = self.repo.fetch_item(company_id, run_id, item_id)?;
        info!(
            run_id = %run_id,
            item_id = %item_id,
            employee_id = %item.employee_id,
            net_pay = %item.net_pay,
            "payroll item adjusted"
        );
        self.emit_audit(
            actor,
            "item.adjusted",
            "payroll_item",
            item_id,
            serde_json::json!({
                "reason": item.adjustment_reason,
                "gross_pay": item.gross_pay,
                "net_pay": item.net_pay,
            }),
        );
        Ok(item)
    }

    /// Scans a run's items for anomalies against the company's most recent
    /// prior PAID run. Read-only and idempotent.
    pub fn review_anomalies(&self, company_id: Uuid, run_id: Uuid) -> EngineResult<Vec<Anomaly>> {
        let (run, items) = self.run_detail(company_id, run_id)?;

        let prior_net_by_employee = match self
            .repo
            .latest_paid_run_before(company_id, run.period_start)?
        {
            Some((_, prior_items)) => prior_items
                .into_iter()
                .map(|item| (item.employee_id, item.net_pay))
                .collect(),
            None => Default::default(),
        };

        Ok(detect_anomalies(&run, &items, &prior_net_by_employee))
    }

    fn emit_audit(
        &self,
        actor: &str,
        action: &str,
        resource_type: &str,
        resource_id: Uuid,
        changes: serde_json::Value,
    ) {
        let event = AuditEvent {
            actor: actor.to_string(),
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id,
            changes,
            at: Utc::now(),
        };
        // Best-effort: a sink failure never fails the payroll mutation.
        if let Err(err) = self.audit.record(event) {
            warn!(action, resource_id = %resource_id, error = %err, "audit event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::{DeductionCalculator, DeductionResult};
    use crate::engine::collaborators::{AuditError, FixedAttendance, FixedCompensation};
    use crate::engine::memory::InMemoryRepository;
    use crate::models::AnomalySeverity;
    use std::str::FromStr;
    use std::sync::Mutex;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Flat 10% so expected values stay easy to read.
    struct TenPercent;
    impl DeductionCalculator for TenPercent {
        fn compute(&self, gross_pay: Decimal) -> DeductionResult {
            if gross_pay <= Decimal::ZERO {
                return DeductionResult::zero();
            }
            DeductionResult {
                total: gross_pay * dec("0.1"),
                breakdown: vec![],
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<AuditEvent>>,
    }
    impl AuditSink for RecordingSink {
        fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    struct FailingSink;
    impl AuditSink for FailingSink {
        fn record(&self, _event: AuditEvent) -> Result<(), AuditError> {
            Err(AuditError("sink offline".to_string()))
        }
    }

    fn policy() -> PayPolicy {
        PayPolicy {
            jurisdiction: "kr".to_string(),
            currency: "KRW".to_string(),
            minor_units: 0,
            standard_monthly_hours: dec("209"),
            overtime_multiplier: dec("1.5"),
        }
    }

    fn engine_with(
        salaries: &[(&str, &str)],
        overtime: &[(&str, &str)],
        audit: Arc<dyn AuditSink>,
    ) -> PayrollEngine {
        PayrollEngine::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(TenPercent),
            Arc::new(FixedCompensation::new(
                salaries.iter().map(|(id, s)| (id.to_string(), dec(s))),
            )),
            Arc::new(FixedAttendance::new(
                overtime.iter().map(|(id, h)| (id.to_string(), dec(h))),
            )),
            audit,
            policy(),
        )
    }

    fn roster(entries: &[(&str, &str)]) -> Vec<EmployeeRef> {
        entries
            .iter()
            .map(|(id, hired)| EmployeeRef {
                id: id.to_string(),
                hire_date: date(hired),
            })
            .collect()
    }

    fn new_run(company_id: Uuid) -> NewRun {
        NewRun {
            company_id,
            name: "January 2025 payroll".to_string(),
            run_type: RunType::Monthly,
            year_month: "2025-01".to_string(),
            period_start: date("2025-01-01"),
            period_end: date("2025-01-31"),
            pay_date: None,
            currency: None,
        }
    }

    #[test]
    fn test_create_run_starts_in_draft_with_zero_totals() {
        let engine = engine_with(&[], &[], Arc::new(RecordingSink::default()));
        let run = engine.create_run(new_run(Uuid::new_v4()), "admin").unwrap();

        assert_eq!(run.status, RunStatus::Draft);
        assert_eq!(run.totals, RunTotals::zero());
        assert_eq!(run.currency, "KRW");
        assert_eq!(run.version, 0);
    }

    #[test]
    fn test_create_run_rejects_inverted_period() {
        let engine = engine_with(&[], &[], Arc::new(RecordingSink::default()));
        let mut params = new_run(Uuid::new_v4());
        params.period_end = date("2024-12-31");
        match engine.create_run(params, "admin") {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "period_end"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_create_run_rejects_bad_year_month() {
        let engine = engine_with(&[], &[], Arc::new(RecordingSink::default()));
        let mut params = new_run(Uuid::new_v4());
        params.year_month = "Jan-2025".to_string();
        assert!(matches!(
            engine.create_run(params, "admin"),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn test_compute_items_reconciles_totals() {
        let engine = engine_with(
            &[
                ("emp_a", "3000000"),
                ("emp_b", "4500000"),
                ("emp_c", "2000000"),
            ],
            &[],
            Arc::new(RecordingSink::default()),
        );
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();

        let run = engine
            .compute_items(
                company_id,
                run.id,
                &roster(&[
                    ("emp_a", "2023-01-01"),
                    ("emp_b", "2022-05-01"),
                    ("emp_c", "2024-11-15"),
                ]),
                "admin",
            )
            .unwrap();

        assert_eq!(run.totals.headcount, 3);
        assert_eq!(run.totals.total_gross, dec("9500000"));
        assert_eq!(run.totals.total_deductions, dec("950000"));
        assert_eq!(run.totals.total_net, dec("8550000"));
    }

    #[test]
    fn test_compute_items_rejects_duplicate_roster_entries() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();

        let result = engine.compute_items(
            company_id,
            run.id,
            &roster(&[("emp_a", "2023-01-01"), ("emp_a", "2023-01-01")]),
            "admin",
        );
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[test]
    fn test_compute_items_unknown_employee_writes_nothing() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();

        let result = engine.compute_items(
            company_id,
            run.id,
            &roster(&[("emp_a", "2023-01-01"), ("ghost", "2023-01-01")]),
            "admin",
        );
        assert!(matches!(result, Err(EngineError::Validation { .. })));

        let (run, items) = engine.run_detail(company_id, run.id).unwrap();
        assert!(items.is_empty());
        assert_eq!(run.totals.headcount, 0);
    }

    #[test]
    fn test_compute_items_requires_draft() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();
        let roster = roster(&[("emp_a", "2023-01-01")]);
        engine.compute_items(company_id, run.id, &roster, "admin").unwrap();
        engine.submit_for_review(company_id, run.id, "admin").unwrap();

        match engine.compute_items(company_id, run.id, &roster, "admin") {
            Err(EngineError::WrongStatus { required, actual }) => {
                assert_eq!(required, RunStatus::Draft);
                assert_eq!(actual, RunStatus::Review);
            }
            other => panic!("expected wrong-status error, got {:?}", other),
        }
    }

    #[test]
    fn test_overtime_flows_into_item_and_detail() {
        let engine = engine_with(
            &[("emp_a", "3000000")],
            &[("emp_a", "10")],
            Arc::new(RecordingSink::default()),
        );
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();
        engine
            .compute_items(company_id, run.id, &roster(&[("emp_a", "2023-01-01")]), "admin")
            .unwrap();

        let (_, items) = engine.run_detail(company_id, run.id).unwrap();
        // 3,000,000 / 209 * 1.5 * 10 = 215,311
        assert_eq!(items[0].inputs.overtime_pay, dec("215311"));
        assert_eq!(items[0].detail.overtime_hours, dec("10"));
        assert!(items[0].detail.overtime_hourly_rate.is_some());
    }

    #[test]
    fn test_mid_period_hire_is_prorated() {
        let engine = engine_with(&[("emp_new", "3100000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();
        engine
            .compute_items(company_id, run.id, &roster(&[("emp_new", "2025-01-17")]), "admin")
            .unwrap();

        let (_, items) = engine.run_detail(company_id, run.id).unwrap();
        assert!(items[0].detail.pro_rated);
        assert_eq!(items[0].detail.proration_numerator, Some(15));
        assert_eq!(items[0].detail.proration_denominator, Some(31));
        assert_eq!(items[0].inputs.base_salary, dec("1500000"));
    }

    #[test]
    fn test_submit_requires_items() {
        let engine = engine_with(&[], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();

        match engine.submit_for_review(company_id, run.id, "admin") {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "items"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_full_lifecycle_to_paid() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();
        engine
            .compute_items(company_id, run.id, &roster(&[("emp_a", "2023-01-01")]), "admin")
            .unwrap();
        engine.submit_for_review(company_id, run.id, "admin").unwrap();
        engine.approve(company_id, run.id, "reviewer").unwrap();
        let run = engine
            .mark_paid(company_id, run.id, Some(date("2025-02-05")), "finance")
            .unwrap();

        assert_eq!(run.status, RunStatus::Paid);
        assert_eq!(run.pay_date, Some(date("2025-02-05")));
    }

    #[test]
    fn test_mark_paid_requires_pay_date() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();
        engine
            .compute_items(company_id, run.id, &roster(&[("emp_a", "2023-01-01")]), "admin")
            .unwrap();
        engine.submit_for_review(company_id, run.id, "admin").unwrap();
        engine.approve(company_id, run.id, "reviewer").unwrap();

        match engine.mark_paid(company_id, run.id, None, "finance") {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "pay_date"),
            other => panic!("expected validation error, got {:?}", other),
        }
        // The failed transition left the run approved and unversioned by it.
        let (run, _) = engine.run_detail(company_id, run.id).unwrap();
        assert_eq!(run.status, RunStatus::Approved);
    }

    #[test]
    fn test_illegal_transition_reports_both_statuses() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();

        match engine.approve(company_id, run.id, "reviewer") {
            Err(EngineError::InvalidTransition { from, to }) => {
                assert_eq!(from, RunStatus::Draft);
                assert_eq!(to, RunStatus::Approved);
            }
            other => panic!("expected invalid transition, got {:?}", other),
        }
    }

    #[test]
    fn test_cancel_is_terminal() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();
        engine.cancel(company_id, run.id, "admin").unwrap();

        assert!(matches!(
            engine.cancel(company_id, run.id, "admin"),
            Err(EngineError::InvalidTransition { .. })
        ));
    }

    fn review_run_with_item(engine: &PayrollEngine, company_id: Uuid) -> (Uuid, Uuid) {
        let run = engine.create_run(new_run(company_id), "admin").unwrap();
        engine
            .compute_items(company_id, run.id, &roster(&[("emp_a", "2023-01-01")]), "admin")
            .unwrap();
        engine.submit_for_review(company_id, run.id, "admin").unwrap();
        let (_, items) = engine.run_detail(company_id, run.id).unwrap();
        (run.id, items[0].id)
    }

    #[test]
    fn test_adjust_item_patches_and_reconciles() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let (run_id, item_id) = review_run_with_item(&engine, company_id);
        let (before, _) = engine.run_detail(company_id, run_id).unwrap();

        let item = engine
            .adjust_item(
                company_id,
                run_id,
                item_id,
                AdjustItem {
                    base_salary: Some(dec("3200000")),
                    adjustment_reason: "correction".to_string(),
                    ..Default::default()
                },
                "reviewer",
            )
            .unwrap();

        assert!(item.is_manually_adjusted);
        assert_eq!(item.adjustment_reason.as_deref(), Some("correction"));
        assert_eq!(item.gross_pay, dec("3200000"));
        // Unspecified fields kept their stored values.
        assert_eq!(item.inputs.overtime_pay, Decimal::ZERO);

        let (after, _) = engine.run_detail(company_id, run_id).unwrap();
        assert_eq!(after.status, RunStatus::Review);
        assert_eq!(after.totals.total_gross - before.totals.total_gross, dec("200000"));
        assert_eq!(after.version, before.version + 1);
    }

    #[test]
    fn test_adjust_item_requires_reason() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let (run_id, item_id) = review_run_with_item(&engine, company_id);

        let result = engine.adjust_item(
            company_id,
            run_id,
            item_id,
            AdjustItem {
                base_salary: Some(dec("3200000")),
                adjustment_reason: "   ".to_string(),
                ..Default::default()
            },
            "reviewer",
        );
        match result {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "adjustment_reason"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_adjust_item_rejected_outside_review() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let (run_id, item_id) = review_run_with_item(&engine, company_id);
        engine.approve(company_id, run_id, "reviewer").unwrap();
        engine
            .mark_paid(company_id, run_id, Some(date("2025-02-05")), "finance")
            .unwrap();
        let (before_run, before_items) = engine.run_detail(company_id, run_id).unwrap();

        let result = engine.adjust_item(
            company_id,
            run_id,
            item_id,
            AdjustItem {
                base_salary: Some(dec("9999999")),
                adjustment_reason: "late fix".to_string(),
                ..Default::default()
            },
            "reviewer",
        );
        match result {
            Err(EngineError::WrongStatus { required, actual }) => {
                assert_eq!(required, RunStatus::Review);
                assert_eq!(actual, RunStatus::Paid);
            }
            other => panic!("expected wrong-status error, got {:?}", other),
        }

        // Nothing moved: neither item nor run fields changed.
        let (after_run, after_items) = engine.run_detail(company_id, run_id).unwrap();
        assert_eq!(after_run, before_run);
        assert_eq!(after_items, before_items);
    }

    #[test]
    fn test_adjust_item_negative_patch_rolls_back() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let (run_id, item_id) = review_run_with_item(&engine, company_id);
        let (before_run, before_items) = engine.run_detail(company_id, run_id).unwrap();

        let result = engine.adjust_item(
            company_id,
            run_id,
            item_id,
            AdjustItem {
                bonus: Some(dec("-100")),
                adjustment_reason: "bad patch".to_string(),
                ..Default::default()
            },
            "reviewer",
        );
        assert!(matches!(result, Err(EngineError::Validation { .. })));

        let (after_run, after_items) = engine.run_detail(company_id, run_id).unwrap();
        assert_eq!(after_run, before_run);
        assert_eq!(after_items, before_items);
    }

    #[test]
    fn test_adjust_item_version_conflict() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let (run_id, item_id) = review_run_with_item(&engine, company_id);
        let (run, _) = engine.run_detail(company_id, run_id).unwrap();

        let result = engine.adjust_item(
            company_id,
            run_id,
            item_id,
            AdjustItem {
                base_salary: Some(dec("3200000")),
                adjustment_reason: "correction".to_string(),
                expected_version: Some(run.version + 7),
                ..Default::default()
            },
            "reviewer",
        );
        match result {
            Err(err @ EngineError::Conflict { .. }) => assert!(err.is_retryable()),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_adjust_item_deduction_override() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(RecordingSink::default()));
        let company_id = Uuid::new_v4();
        let (run_id, item_id) = review_run_with_item(&engine, company_id);

        let item = engine
            .adjust_item(
                company_id,
                run_id,
                item_id,
                AdjustItem {
                    deduction_override: Some(dec("123456")),
                    adjustment_reason: "agreed settlement".to_string(),
                    ..Default::default()
                },
                "reviewer",
            )
            .unwrap();

        assert_eq!(item.deductions, dec("123456"));
        assert!(item.detail.deductions_overridden);
    }

    #[test]
    fn test_anomaly_review_against_prior_paid_run() {
        let engine = engine_with(
            &[("emp_x", "3000000")],
            &[],
            Arc::new(RecordingSink::default()),
        );
        let company_id = Uuid::new_v4();

        // December run, paid at 3,333,333 gross -> 3,000,000 net after 10%.
        let mut december = new_run(company_id);
        december.name = "December 2024 payroll".to_string();
        december.year_month = "2024-12".to_string();
        december.period_start = date("2024-12-01");
        december.period_end = date("2024-12-31");
        let run = engine.create_run(december, "admin").unwrap();
        engine
            .compute_items(company_id, run.id, &roster(&[("emp_x", "2022-01-01")]), "admin")
            .unwrap();
        engine.submit_for_review(company_id, run.id, "admin").unwrap();
        // Push net to exactly 3,000,000 via a deduction override.
        let (_, items) = engine.run_detail(company_id, run.id).unwrap();
        engine
            .adjust_item(
                company_id,
                run.id,
                items[0].id,
                AdjustItem {
                    deduction_override: Some(dec("0")),
                    adjustment_reason: "baseline".to_string(),
                    ..Default::default()
                },
                "reviewer",
            )
            .unwrap();
        engine.approve(company_id, run.id, "reviewer").unwrap();
        engine
            .mark_paid(company_id, run.id, Some(date("2025-01-05")), "finance")
            .unwrap();

        // January run with a 26.7% higher net for the same employee.
        let run = engine.create_run(new_run(company_id), "admin").unwrap();
        engine
            .compute_items(company_id, run.id, &roster(&[("emp_x", "2022-01-01")]), "admin")
            .unwrap();
        engine.submit_for_review(company_id, run.id, "admin").unwrap();
        let (_, items) = engine.run_detail(company_id, run.id).unwrap();
        engine
            .adjust_item(
                company_id,
                run.id,
                items[0].id,
                AdjustItem {
                    base_salary: Some(dec("3800000")),
                    deduction_override: Some(dec("0")),
                    adjustment_reason: "raise".to_string(),
                    ..Default::default()
                },
                "reviewer",
            )
            .unwrap();

        let anomalies = engine.review_anomalies(company_id, run.id).unwrap();
        let swing: Vec<_> = anomalies
            .iter()
            .filter(|a| a.field == "net_pay")
            .collect();
        assert_eq!(swing.len(), 1);
        assert_eq!(swing[0].severity, AnomalySeverity::Error);
        assert_eq!(swing[0].employee_id, "emp_x");
    }

    #[test]
    fn test_anomaly_review_is_idempotent() {
        let engine = engine_with(
            &[("emp_a", "3000000")],
            &[("emp_a", "65")],
            Arc::new(RecordingSink::default()),
        );
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();
        engine
            .compute_items(company_id, run.id, &roster(&[("emp_a", "2023-01-01")]), "admin")
            .unwrap();

        let first = engine.review_anomalies(company_id, run.id).unwrap();
        let second = engine.review_anomalies(company_id, run.id).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].field, "overtime_hours");
    }

    #[test]
    fn test_audit_events_emitted_per_operation() {
        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(&[("emp_a", "3000000")], &[], sink.clone());
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();
        engine
            .compute_items(company_id, run.id, &roster(&[("emp_a", "2023-01-01")]), "admin")
            .unwrap();
        engine.submit_for_review(company_id, run.id, "admin").unwrap();

        let events = sink.events.lock().unwrap();
        let actions: Vec<&str> = events.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["run.created", "run.computed", "run.submitted"]);
    }

    #[test]
    fn test_audit_failure_does_not_fail_mutation() {
        let engine = engine_with(&[("emp_a", "3000000")], &[], Arc::new(FailingSink));
        let company_id = Uuid::new_v4();
        let run = engine.create_run(new_run(company_id), "admin").unwrap();
        let run = engine
            .compute_items(company_id, run.id, &roster(&[("emp_a", "2023-01-01")]), "admin")
            .unwrap();
        assert_eq!(run.totals.headcount, 1);
    }
}
