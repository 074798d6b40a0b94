//! Export of the record set to TXT, CSV or JSON files.

use crate::error::Result;
use crate::models::{ExpenseRecord, OutputFormat};
use csv::Writer;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write records to `file_path` in the given format, creating parent
/// directories as needed. Records are written in store order.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn write_records_to_file(records: &[ExpenseRecord], format: OutputFormat, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }

    match format {
        OutputFormat::Txt => write_txt_file(records, file_path),
        OutputFormat::Csv => write_csv_file(records, file_path),
        OutputFormat::Json => write_json_file(records, file_path),
    }
}

/// Format: `date, category, amount, description` per line
fn write_txt_file(records: &[ExpenseRecord], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);

    for record in records {
        writeln!(
            writer,
            "{}, {}, {}, {}",
            record.date(),
            record.category(),
            record.amount(),
            record.description()
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Includes header row: `ID, Date, Category, Amount, Description`
fn write_csv_file(records: &[ExpenseRecord], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["ID", "Date", "Category", "Amount", "Description"])?;
    for record in records {
        let amount = record.amount().to_string();
        writer.write_record([
            record.id(),
            record.date(),
            record.category().label(),
            amount.as_str(),
            record.description(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn write_json_file(records: &[ExpenseRecord], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}
