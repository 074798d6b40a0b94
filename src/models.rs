//! Data models for message ingestion and expense records
//!
//! This module contains the data structures shared by the pipeline,
//! the record store and the command surface.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// A raw text message as delivered by the device inbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Message text, untouched
    pub body: String,
    /// Instant the message was received
    pub timestamp: DateTime<Utc>,
    /// Conversation identifier, when the source provides one
    pub thread_id: Option<String>,
    /// Per-message identifier, when the source provides one
    pub message_id: Option<String>,
}

impl RawMessage {
    /// Create a message without any identifiers
    #[must_use]
    pub fn new(body: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            body: body.into(),
            timestamp,
            thread_id: None,
            message_id: None,
        }
    }

    /// Attach source identifiers
    #[must_use]
    pub fn with_ids(mut self, thread_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self.message_id = Some(message_id.into());
        self
    }
}

/// Spending category assigned at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Restaurants, delivery, groceries
    Food,
    /// Retail and online shopping
    Shopping,
    /// Cabs, transit, travel
    Transport,
    /// Utilities and recurring bills
    Bills,
    /// Anything no keyword matched
    Others,
}

impl Category {
    /// All categories in declaration order; this order is the match priority
    pub const ALL: [Self; 5] = [Self::Food, Self::Shopping, Self::Transport, Self::Bills, Self::Others];

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Shopping => "Shopping",
            Self::Transport => "Transport",
            Self::Bills => "Bills",
            Self::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TrackerError::InvalidInput(format!("Unknown category: {s}")))
    }
}

/// A recorded expense derived from one qualifying message.
///
/// Fields are fixed at creation; the store only ever inserts or removes
/// whole records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    id: String,
    amount: Decimal,
    date: String,
    description: String,
    category: Category,
}

impl ExpenseRecord {
    /// Build a record from already extracted fields
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        amount: Decimal,
        date: impl Into<String>,
        description: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            date: date.into(),
            description: description.into(),
            category,
        }
    }

    /// Stable identity used for deduplication
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Non-negative amount in rupees
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Date as found in the message, or the receive date
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Full message body
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Assigned category
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }
}

/// Mailbox scanned by the message source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mailbox {
    /// Received messages only
    #[default]
    Inbox,
    /// Sent messages only
    Sent,
    /// Every message
    All,
}

/// Options bounding a single read of the message source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFilter {
    /// Mailbox to scan
    pub mailbox: Mailbox,
    /// Maximum number of most recent messages returned
    pub max_count: usize,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            mailbox: Mailbox::Inbox,
            max_count: 1000,
        }
    }
}

/// Outcome of the device capability gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// Reading messages is allowed
    Granted,
    /// Reading messages was refused for this session
    Denied,
}

/// Output format for exported records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// Plain text format
    Txt,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" => Ok(Self::Txt),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(TrackerError::InvalidInput(format!(
                "Invalid export format: {other}. Must be one of: txt, csv, json"
            ))),
        }
    }
}
