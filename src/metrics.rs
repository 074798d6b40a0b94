//! Pipeline metrics.
//!
//! Totals are kept locally for the CLI summary and tests, and mirrored to
//! the `metrics` facade so any installed recorder sees them.

use metrics::{counter, histogram};
use std::time::Duration;

use crate::pipeline::IngestReport;

const SCANNED: &str = "expense_tracker_messages_scanned_total";
const GATED_OUT: &str = "expense_tracker_messages_gated_out_total";
const REJECTED: &str = "expense_tracker_messages_rejected_total";
const DUPLICATES: &str = "expense_tracker_duplicates_total";
const ADDED: &str = "expense_tracker_records_added_total";
const DELETED: &str = "expense_tracker_records_deleted_total";
const SOURCE_FAILURES: &str = "expense_tracker_source_failures_total";
const INGEST_DURATION: &str = "expense_tracker_ingest_duration_seconds";

/// Running totals for the ingestion pipeline
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MetricsCollector {
    /// Ingest runs completed
    pub ingest_runs_total: u64,
    /// Raw messages seen
    pub messages_scanned_total: u64,
    /// Messages without any transaction keyword
    pub messages_gated_out_total: u64,
    /// Messages without a readable amount
    pub messages_rejected_total: u64,
    /// Candidates discarded because their id was already stored
    pub duplicates_total: u64,
    /// Records inserted
    pub records_added_total: u64,
    /// Records removed by the user
    pub records_deleted_total: u64,
    /// Failed reads of the message source
    pub source_failures_total: u64,
}

impl MetricsCollector {
    /// Record the outcome of one ingest run
    pub fn record_ingest(&mut self, report: &IngestReport, duration: Duration) {
        self.ingest_runs_total += 1;
        self.messages_scanned_total += report.scanned as u64;
        self.messages_gated_out_total += report.gated_out as u64;
        self.messages_rejected_total += report.rejected as u64;
        self.duplicates_total += report.duplicates as u64;
        self.records_added_total += report.added.len() as u64;

        counter!(SCANNED).increment(report.scanned as u64);
        counter!(GATED_OUT).increment(report.gated_out as u64);
        counter!(REJECTED).increment(report.rejected as u64);
        counter!(DUPLICATES).increment(report.duplicates as u64);
        counter!(ADDED).increment(report.added.len() as u64);
        histogram!(INGEST_DURATION).record(duration.as_secs_f64());
    }

    /// Record a user deletion attempt
    pub fn record_deletion(&mut self, removed: bool) {
        if removed {
            self.records_deleted_total += 1;
            counter!(DELETED).increment(1);
        }
    }

    /// Record a failed read of the message source
    pub fn record_source_failure(&mut self) {
        self.source_failures_total += 1;
        counter!(SOURCE_FAILURES).increment(1);
    }
}
