//! Volatile in-memory report store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{ReportStore, ReportTransform};
use crate::error::{Error, Result};
use crate::model::{AnalysisReport, ReportId};

#[derive(Default)]
struct Tables {
    reports: HashMap<ReportId, AnalysisReport>,
    /// event id -> report id, one live report per event.
    by_event: HashMap<String, ReportId>,
}

/// Map-plus-index store behind a single reader/writer lock.
///
/// Contents do not survive a restart.
#[derive(Default)]
pub struct InMemoryReportStore {
    tables: RwLock<Tables>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A stored record is only replaced after its transform succeeded, so a
    // poisoned lock never guards a half-written row.
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReportStore for InMemoryReportStore {
    fn create(&self, report: AnalysisReport) -> Result<AnalysisReport> {
        let mut tables = self.write();

        if let Some(existing) = tables.reports.get(&report.report_id) {
            return Err(Error::AlreadyExists(Box::new(existing.clone())));
        }

        if let Some(existing) = tables
            .by_event
            .get(&report.event_id)
            .and_then(|id| tables.reports.get(id))
        {
            return Err(Error::AlreadyExists(Box::new(existing.clone())));
        }

        tables
            .by_event
            .insert(report.event_id.clone(), report.report_id);
        tables.reports.insert(report.report_id, report.clone());
        Ok(report)
    }

    fn get(&self, report_id: ReportId) -> Result<AnalysisReport> {
        self.read()
            .reports
            .get(&report_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(report_id.to_string()))
    }

    fn update(&self, report_id: ReportId, transform: ReportTransform<'_>) -> Result<AnalysisReport> {
        let mut tables = self.write();

        let current = tables
            .reports
            .get(&report_id)
            .ok_or_else(|| Error::NotFound(report_id.to_string()))?;

        let mut staged = current.clone();
        transform(&mut staged)?;

        if staged.report_id != current.report_id || staged.event_id != current.event_id {
            return Err(Error::IdentityChanged);
        }

        tables.reports.insert(report_id, staged.clone());
        Ok(staged)
    }
}
