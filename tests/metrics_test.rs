//! Unit tests for the pipeline metrics collector

use rust_decimal::Decimal;
use std::time::Duration;
use sms_expense_tracker::metrics::MetricsCollector;
use sms_expense_tracker::models::{Category, ExpenseRecord};
use sms_expense_tracker::IngestReport;

fn report(added: usize) -> IngestReport {
    IngestReport {
        scanned: 10,
        gated_out: 4,
        rejected: 2,
        duplicates: 4 - added,
        added: (0..added)
            .map(|i| ExpenseRecord::new(format!("t-{i}"), Decimal::ONE, "d", "Rs 1 paid", Category::Others))
            .collect(),
    }
}

#[test]
fn test_metrics_collector_default() {
    let collector = MetricsCollector::default();
    assert_eq!(collector.ingest_runs_total, 0);
    assert_eq!(collector.messages_scanned_total, 0);
    assert_eq!(collector.records_added_total, 0);
    assert_eq!(collector.records_deleted_total, 0);
    assert_eq!(collector.source_failures_total, 0);
}

#[test]
fn test_record_ingest_accumulates() {
    let mut collector = MetricsCollector::default();
    collector.record_ingest(&report(3), Duration::from_millis(20));
    collector.record_ingest(&report(0), Duration::from_millis(5));

    assert_eq!(collector.ingest_runs_total, 2);
    assert_eq!(collector.messages_scanned_total, 20);
    assert_eq!(collector.messages_gated_out_total, 8);
    assert_eq!(collector.messages_rejected_total, 4);
    assert_eq!(collector.duplicates_total, 5);
    assert_eq!(collector.records_added_total, 3);
}

#[test]
fn test_record_deletion_counts_only_removals() {
    let mut collector = MetricsCollector::default();
    collector.record_deletion(true);
    collector.record_deletion(false);
    assert_eq!(collector.records_deleted_total, 1);
}

#[test]
fn test_record_source_failure() {
    let mut collector = MetricsCollector::default();
    collector.record_source_failure();
    collector.record_source_failure();
    assert_eq!(collector.source_failures_total, 2);
    assert_eq!(collector.ingest_runs_total, 0);
}
