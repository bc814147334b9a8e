//! Persistence interface for payroll runs and items.
//!
//! The core never composes storage-specific queries; it goes through this
//! explicit repository returning typed domain records. Every method is
//! scoped by the owning company, and the mutation entry point commits the
//! run and its items together or not at all.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{PayrollItem, PayrollRun};

/// The mutation closure handed to [`PayrollRepository::with_run_mut`].
///
/// Receives the run and its items; any change it makes is committed only
/// when it returns `Ok`.
pub type RunMutation<'a> =
    &'a mut dyn FnMut(&mut PayrollRun, &mut Vec<PayrollItem>) -> EngineResult<()>;

/// Storage for payroll runs and their items.
///
/// Implementations must guarantee that `with_run_mut` is atomic (the
/// closure's effects are visible all together or not at all) and that
/// mutations of the same run serialize — a single-writer-per-run
/// discipline. Read methods may run concurrently with mutations and
/// tolerate observing a run mid-transition.
pub trait PayrollRepository: Send + Sync {
    /// Persists a newly created run with no items.
    fn insert_run(&self, run: PayrollRun) -> EngineResult<()>;

    /// Fetches one run, scoped by company.
    fn fetch_run(&self, company_id: Uuid, run_id: Uuid) -> EngineResult<PayrollRun>;

    /// Lists a company's runs, most recent period first.
    fn list_runs(&self, company_id: Uuid) -> EngineResult<Vec<PayrollRun>>;

    /// Lists the items of one run.
    fn list_items(&self, company_id: Uuid, run_id: Uuid) -> EngineResult<Vec<PayrollItem>>;

    /// Fetches one item of one run.
    fn fetch_item(
        &self,
        company_id: Uuid,
        run_id: Uuid,
        item_id: Uuid,
    ) -> EngineResult<PayrollItem>;

    /// Returns the company's most recent PAID run whose period ended
    /// strictly before `before`, with its items, if any.
    fn latest_paid_run_before(
        &self,
        company_id: Uuid,
        before: NaiveDate,
    ) -> EngineResult<Option<(PayrollRun, Vec<PayrollItem>)>>;

    /// Runs `mutation` against the run and its items as one atomic unit.
    ///
    /// On `Ok` the changes are committed and the run's version counter is
    /// bumped; on `Err` the stored state is left exactly as it was.
    fn with_run_mut(
        &self,
        company_id: Uuid,
        run_id: Uuid,
        mutation: RunMutation<'_>,
    ) -> EngineResult<()>;
}
