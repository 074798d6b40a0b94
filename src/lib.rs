//! SMS Expense Tracker
//!
//! Turns bank and payment text messages into categorized expense records.
//!
//! # Features
//!
//! - Transaction keyword gate and amount/date extraction
//! - Keyword-table categorization into Food, Shopping, Transport, Bills, Others
//! - Id-based deduplication with a persisted snapshot
//! - Search and per-category spending distribution
//! - Export to TXT, CSV and JSON

/// Keyword-based category assignment
pub mod categorizer;
/// Configuration management
pub mod config;
/// Error types
pub mod error;
/// Amount, date and identity extraction
pub mod extractor;
/// Record export
pub mod file_writer;
/// Category and transaction keyword tables
pub mod keywords;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Key-value storage backends
pub mod persistence;
/// Ingestion pipeline
pub mod pipeline;
/// Search and distribution
pub mod query;
/// Tracker service and refresh loop
pub mod service;
/// Message source and permission collaborators
pub mod source;
/// Deduplicating record store
pub mod store;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use config::AppConfig;
pub use error::{Result, TrackerError};
pub use models::{Category, ExpenseRecord, OutputFormat, RawMessage};
pub use pipeline::{IngestReport, Pipeline};
pub use service::ExpenseTracker;
pub use store::RecordStore;
