//! Review-time anomaly detection.
//!
//! Given a run's items plus the prior paid run's net pay per employee, this
//! module flags values worth human attention before approval: excess
//! overtime, large net-pay swings, mid-period hires, and capped deductions.
//! Detection is read-only and idempotent; it never mutates the run.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::{Anomaly, AnomalySeverity, PayrollItem, PayrollRun};

/// Overtime hours above which an item is flagged for review.
pub const OVERTIME_HOURS_WARNING_THRESHOLD: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// Relative net-pay change against the prior paid run above which an item
/// is flagged as an error.
pub const NET_PAY_SWING_RATIO: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// Detects anomalies across a run's items.
///
/// `prior_net_by_employee` maps employee id to the net pay from the most
/// recent prior PAID run; employees without a prior item are simply not
/// checked for swings. A prior net pay of zero is skipped rather than
/// divided by. The result is sorted by (employee, field) so repeated runs
/// over unchanged input produce an identical anomaly set.
pub fn detect_anomalies(
    run: &PayrollRun,
    items: &[PayrollItem],
    prior_net_by_employee: &HashMap<String, Decimal>,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    for item in items {
        if item.detail.overtime_hours > OVERTIME_HOURS_WARNING_THRESHOLD {
            anomalies.push(Anomaly {
                severity: AnomalySeverity::Warning,
                employee_id: item.employee_id.clone(),
                field: "overtime_hours".to_string(),
                message: format!(
                    "{} overtime hours in the period exceed the {} hour review threshold",
                    item.detail.overtime_hours.normalize(),
                    OVERTIME_HOURS_WARNING_THRESHOLD.normalize()
                ),
                observed: item.detail.overtime_hours,
                reference: Some(OVERTIME_HOURS_WARNING_THRESHOLD),
            });
        }

        if let Some(&prior_net) = prior_net_by_employee.get(&item.employee_id) {
            if prior_net != Decimal::ZERO {
                let swing = ((item.net_pay - prior_net) / prior_net).abs();
                if swing > NET_PAY_SWING_RATIO {
                    anomalies.push(Anomaly {
                        severity: AnomalySeverity::Error,
                        employee_id: item.employee_id.clone(),
                        field: "net_pay".to_string(),
                        message: format!(
                            "net pay changed {}% against the prior paid run",
                            (swing * Decimal::ONE_HUNDRED).round_dp(1).normalize()
                        ),
                        observed: item.net_pay,
                        reference: Some(prior_net),
                    });
                }
            }
        }

        if item.detail.hire_date >= run.period_start {
            anomalies.push(Anomaly {
                severity: AnomalySeverity::Info,
                employee_id: item.employee_id.clone(),
                field: "hire_date".to_string(),
                message: format!(
                    "hired {} during the pay period; confirm pro-ration",
                    item.detail.hire_date
                ),
                observed: item.inputs.base_salary,
                reference: None,
            });
        }

        if item.detail.deductions_capped {
            anomalies.push(Anomaly {
                severity: AnomalySeverity::Warning,
                employee_id: item.employee_id.clone(),
                field: "deductions".to_string(),
                message: "deductions exceeded gross pay and were capped".to_string(),
                observed: item.deductions,
                reference: Some(item.gross_pay),
            });
        }
    }

    anomalies.sort_by(|a, b| {
        (a.employee_id.as_str(), a.field.as_str()).cmp(&(b.employee_id.as_str(), b.field.as_str()))
    });
    anomalies
}
