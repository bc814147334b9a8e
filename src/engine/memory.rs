//! In-memory repository implementation.
//!
//! Runs and items live in a single map behind an `RwLock`. The write lock
//! is the single-writer-per-run discipline: mutations serialize, reads may
//! proceed concurrently. Atomicity of `with_run_mut` comes from mutating a
//! clone and swapping it in only on success.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{PayrollItem, PayrollRun, RunStatus};

use super::repository::{PayrollRepository, RunMutation};

#[derive(Debug, Clone)]
struct RunRecord {
    run: PayrollRun,
    items: Vec<PayrollItem>,
}

/// Repository keeping all runs in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: RwLock<HashMap<Uuid, RunRecord>>,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> EngineResult<std::sync::RwLockReadGuard<'_, HashMap<Uuid, RunRecord>>> {
        self.records.read().map_err(|_| EngineError::Storage {
            message: "repository lock poisoned".to_string(),
        })
    }

    fn write(&self) -> EngineResult<std::sync::RwLockWriteGuard<'_, HashMap<Uuid, RunRecord>>> {
        self.records.write().map_err(|_| EngineError::Storage {
            message: "repository lock poisoned".to_string(),
        })
    }
}

fn scoped<'a>(
    records: &'a HashMap<Uuid, RunRecord>,
    company_id: Uuid,
    run_id: Uuid,
) -> EngineResult<&'a RunRecord> {
    records
        .get(&run_id)
        .filter(|record| record.run.company_id == company_id)
        .ok_or(EngineError::RunNotFound { run_id })
}

impl PayrollRepository for InMemoryRepository {
    fn insert_run(&self, run: PayrollRun) -> EngineResult<()> {
        let mut records = self.write()?;
        if records.contains_key(&run.id) {
            return Err(EngineError::Conflict {
                message: format!("run {} already exists", run.id),
            });
        }
        records.insert(run.id, RunRecord { run, items: Vec::new() });
        Ok(())
    }

    fn fetch_run(&self, company_id: Uuid, run_id: Uuid) -> EngineResult<PayrollRun> {
        let records = self.read()?;
        Ok(scoped(&records, company_id, run_id)?.run.clone())
    }

    fn list_runs(&self, company_id: Uuid) -> EngineResult<Vec<PayrollRun>> {
        let records = self.read()?;
        let mut runs: Vec<PayrollRun> = records
            .values()
            .filter(|record| record.run.company_id == company_id)
            .map(|record| record.run.clone())
            .collect();
        runs.sort_by(|a, b| b.period_start.cmp(&a.period_start));
        Ok(runs)
    }

    fn list_items(&self, company_id: Uuid, run_id: Uuid) -> EngineResult<Vec<PayrollItem>> {
        let records = self.read()?;
        Ok(scoped(&records, company_id, run_id)?.items.clone())
    }

    fn fetch_item(
        &self,
        company_id: Uuid,
        run_id: Uuid,
        item_id: Uuid,
    ) -> EngineResult<PayrollItem> {
        let records = self.read()?;
        scoped(&records, company_id, run_id)?
            .items
            .iter()
            .find(|item| item.id == item_id)
            .cloned()
            .ok_or(EngineError::ItemNotFound { item_id })
    }

    fn latest_paid_run_before(
        &self,
        company_id: Uuid,
        before: NaiveDate,
    ) -> EngineResult<Option<(PayrollRun, Vec<PayrollItem>)>> {
        let records = self.read()?;
        Ok(records
            .values()
            .filter(|record| {
                record.run.company_id == company_id
                    && record.run.status == RunStatus::Paid
                    && record.run.period_end < before
            })
            .max_by_key(|record| record.run.period_end)
            .map(|record| (record.run.clone(), record.items.clone())))
    }

    fn with_run_mut(
        &self,
        company_id: Uuid,
        run_id: Uuid,
        mutation: RunMutation<'_>,
    ) -> EngineResult<()> {
        let mut records = self.write()?;
        let mut staged = scoped(&records, company_id, run_id)?.clone();

        mutation(&mut staged.run, &mut staged.items)?;

        staged.run.version += 1;
        records.insert(run_id, staged);
        Ok(())
    }
}
