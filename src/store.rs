//! Report storage.
//!
//! The store is the single long-lived owner of report records. Every value
//! that crosses its boundary is an owned copy, so callers can never observe
//! or corrupt stored state through an alias.

mod memory;

pub use memory::InMemoryReportStore;

use crate::error::Result;
use crate::model::{AnalysisReport, ReportId};

/// In-place mutation applied by [`ReportStore::update`].
pub type ReportTransform<'a> = Box<dyn FnOnce(&mut AnalysisReport) -> Result<()> + Send + 'a>;

/// Storage interface for analysis reports.
///
/// All operations may be called concurrently from any number of tasks.
pub trait ReportStore: Send + Sync {
    /// Insert a new report.
    ///
    /// Fails with `AlreadyExists` if the report id is taken or a report for
    /// the same event id already exists; the error carries a copy of that
    /// existing record.
    fn create(&self, report: AnalysisReport) -> Result<AnalysisReport>;

    /// Fetch a copy of the report.
    fn get(&self, report_id: ReportId) -> Result<AnalysisReport>;

    /// Atomically read, transform and write back a report.
    ///
    /// When the transform fails the stored record is left untouched and the
    /// error propagates.
    fn update(&self, report_id: ReportId, transform: ReportTransform<'_>) -> Result<AnalysisReport>;
}
