use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use sms_expense_tracker::config::AppConfig;
use sms_expense_tracker::file_writer::write_records_to_file;
use sms_expense_tracker::logging::{init_logging, OperationTimer};
use sms_expense_tracker::models::{ExpenseRecord, OutputFormat};
use sms_expense_tracker::persistence::SledStore;
use sms_expense_tracker::source::{JsonInboxSource, SourcePermission};
use sms_expense_tracker::validation::InputValidator;
use sms_expense_tracker::ExpenseTracker;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the inbox once and record new expenses
    Refresh,
    /// Keep reading the inbox on a schedule; press Enter to refresh now
    Watch,
    /// Print every recorded expense
    List,
    /// Print expenses matching the text
    Search {
        /// Text to look for in description, category, amount or date
        text: String,
    },
    /// Remove a recorded expense
    Delete {
        /// Record id
        id: String,
    },
    /// Print spending per category
    Distribution,
    /// Write recorded expenses to a file
    Export {
        /// Output format (txt, csv or json)
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load(cli.config.as_deref())?;

    // Initialize logging
    let log_file = config.logging.file_path.as_deref().map(Path::new);
    let _guard = init_logging(Some(&config.get_log_level()), log_file, config.logging.format == "json")?;

    info!("Starting expense tracker");

    let backend = SledStore::open(&config.storage_path()).context("Failed to open record storage")?;
    let source = JsonInboxSource::new(config.inbox_path());
    let tracker = ExpenseTracker::open(&config, Arc::new(backend), Arc::new(source))?;

    match cli.command {
        Commands::Refresh => refresh(&tracker, &config).await?,
        Commands::Watch => watch(&tracker, &config).await?,
        Commands::List => print_records(&tracker.records().await),
        Commands::Search { text } => {
            let query = InputValidator::sanitize_query(&text);
            print_records(&tracker.search(&query).await);
        },
        Commands::Delete { id } => {
            InputValidator::validate_record_id(&id)?;
            if tracker.delete(&id).await {
                println!("Deleted {id}");
            } else {
                println!("No record with id {id}");
            }
        },
        Commands::Distribution => print_distribution(&tracker).await,
        Commands::Export { format, output } => export(&tracker, &format, &output).await?,
    }

    tracker.flush().await.context("Failed to flush record storage")?;

    let failures = tracker.write_failures().await;
    if failures > 0 {
        warn!(failures, "Some snapshot writes failed; recent changes may not survive a restart");
    }

    Ok(())
}

async fn refresh(tracker: &ExpenseTracker, config: &AppConfig) -> Result<()> {
    let timer = OperationTimer::new("refresh");
    let added = tracker.start(&SourcePermission::new(config.inbox_path())).await?;
    timer.finish();
    println!("Added {added} new expense(s)");
    Ok(())
}

async fn watch(tracker: &ExpenseTracker, config: &AppConfig) -> Result<()> {
    let added = tracker.start(&SourcePermission::new(config.inbox_path())).await?;
    println!("Added {added} new expense(s); watching for more (Enter refreshes, Ctrl-C stops)");

    let (trigger_tx, trigger_rx) = mpsc::channel(8);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            if trigger_tx.send(()).await.is_err() {
                break;
            }
        }
    });

    tracker
        .run(trigger_rx, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    let metrics = tracker.metrics().await;
    info!(
        runs = metrics.ingest_runs_total,
        added = metrics.records_added_total,
        source_failures = metrics.source_failures_total,
        "Watch stopped"
    );
    Ok(())
}

async fn export(tracker: &ExpenseTracker, format: &str, output: &Path) -> Result<()> {
    InputValidator::validate_export_path(output)?;
    let format: OutputFormat = format.parse()?;
    let output = if output.extension().is_none() {
        output.with_extension(format.extension())
    } else {
        output.to_path_buf()
    };

    let records = tracker.records().await;
    write_records_to_file(&records, format, &output)
        .with_context(|| format!("Failed to export to {}", output.display()))?;
    println!("Exported {} record(s) to {}", records.len(), output.display());
    Ok(())
}

fn print_records(records: &[ExpenseRecord]) {
    if records.is_empty() {
        println!("No expenses recorded");
        return;
    }
    for record in records {
        println!(
            "{:<24} {:<10} {:<9} {:>12}  {}",
            record.id(),
            record.date(),
            record.category().label(),
            record.amount().to_string(),
            record.description()
        );
    }
}

async fn print_distribution(tracker: &ExpenseTracker) {
    let distribution = tracker.distribution().await;
    for share in &distribution.shares {
        println!(
            "{:<9} {:>12} {:>7}%",
            share.category.label(),
            share.amount.to_string(),
            share.percentage.to_string()
        );
    }
    println!("{:<9} {:>12}", "Total", distribution.total.to_string());
}
