use rust_decimal::Decimal;
use std::fs;
use tempfile::tempdir;

use sms_expense_tracker::file_writer::write_records_to_file;
use sms_expense_tracker::models::{Category, ExpenseRecord, OutputFormat};

fn records() -> Vec<ExpenseRecord> {
    vec![
        ExpenseRecord::new("9-103", Decimal::new(250, 0), "07/06/2024", "INR 250 paid to Uber", Category::Transport),
        ExpenseRecord::new(
            "7-101",
            Decimal::new(125_050, 2),
            "05/06/2024",
            "Rs 1,250.50 debited for purchase at Amazon on 05/06/2024",
            Category::Shopping,
        ),
    ]
}

#[test]
fn test_export_txt() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("expenses.txt");

    write_records_to_file(&records(), OutputFormat::Txt, &path).expect("Failed to export");

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "07/06/2024, Transport, 250, INR 250 paid to Uber");
    assert!(lines[1].starts_with("05/06/2024, Shopping, 1250.50, "));
}

#[test]
fn test_export_csv_round_trips_through_reader() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("nested").join("expenses.csv");

    write_records_to_file(&records(), OutputFormat::Csv, &path).expect("Failed to export");

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["ID", "Date", "Category", "Amount", "Description"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][0], "7-101");
    assert_eq!(&rows[1][4], "Rs 1,250.50 debited for purchase at Amazon on 05/06/2024");
}

#[test]
fn test_export_json_matches_snapshot_format() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("expenses.json");

    write_records_to_file(&records(), OutputFormat::Json, &path).expect("Failed to export");

    let parsed: Vec<ExpenseRecord> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed, records());
}

#[test]
fn test_export_empty_set_writes_header_only() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("empty.csv");

    write_records_to_file(&[], OutputFormat::Csv, &path).expect("Failed to export");

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.trim_end(), "ID,Date,Category,Amount,Description");
}
