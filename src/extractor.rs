//! Field extraction from raw SMS bodies.
//!
//! A message only becomes a candidate expense when a rupee amount can be
//! read from it; that check is the main validity gate of the pipeline.

use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, TrackerError};
use crate::models::{Category, ExpenseRecord, RawMessage};

/// Placeholder used when the source gives no thread id
pub const DEFAULT_THREAD_ID: &str = "thread";
/// Placeholder used when the source gives no message id
pub const DEFAULT_MESSAGE_ID: &str = "sms";
/// Default rendering of the receive date when the body has no date
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

// Rs, Rs., INR or the rupee sign, then the number.
const AMOUNT_PATTERN: &str = r"(?i)(?:\b(?:rs\.?|inr)|₹)\s*([0-9]+(?:,[0-9]+)*(?:\.[0-9]{1,2})?)";
const DATE_PATTERN: &str = r"([0-9]{1,2}[/-][0-9]{1,2}[/-](?:[0-9]{4}|[0-9]{2}))";

/// How record ids are formed when the source omits identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentityPolicy {
    /// `thread-sms` style placeholders; id-less messages collapse together
    #[default]
    Placeholder,
    /// Append a digest of body and timestamp when the message id is missing
    ContentHash,
}

/// A parsed message that has not been categorized or merged yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Derived identity
    pub id: String,
    /// Amount read from the body
    pub amount: Decimal,
    /// Date found in the body, or the receive date
    pub date: String,
    /// Unmodified body
    pub description: String,
}

impl Candidate {
    /// Fix the category and turn the candidate into a record
    #[must_use]
    pub fn into_record(self, category: Category) -> ExpenseRecord {
        ExpenseRecord::new(self.id, self.amount, self.date, self.description, category)
    }
}

/// Result of running the extractor on one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The message carries a readable amount
    Expense(Candidate),
    /// No amount could be read; the message is dropped silently
    NotAnExpense,
}

/// Reads amount, date and identity out of raw messages
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    amount_re: Regex,
    date_re: Regex,
    date_format: String,
    identity: IdentityPolicy,
}

impl FieldExtractor {
    /// Build an extractor; `date_format` is a chrono strftime string
    pub fn new(date_format: &str, identity: IdentityPolicy) -> Result<Self> {
        if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
            return Err(TrackerError::InvalidConfig(format!("Invalid date format: {date_format}")));
        }

        Ok(Self {
            amount_re: Regex::new(AMOUNT_PATTERN)?,
            date_re: Regex::new(DATE_PATTERN)?,
            date_format: date_format.to_string(),
            identity,
        })
    }

    /// Parse one message. Pure: no logging above debug, no side effects.
    #[must_use]
    pub fn extract(&self, raw: &RawMessage) -> Extraction {
        let Some(amount) = self.extract_amount(&raw.body) else {
            return Extraction::NotAnExpense;
        };

        let date = self.extract_date(&raw.body).map_or_else(
            || raw.timestamp.with_timezone(&Local).format(&self.date_format).to_string(),
            str::to_string,
        );

        Extraction::Expense(Candidate {
            id: self.identity(raw),
            amount,
            date,
            description: raw.body.clone(),
        })
    }

    /// First rupee amount in the body, thousands separators removed
    #[must_use]
    pub fn extract_amount(&self, body: &str) -> Option<Decimal> {
        let literal = self.amount_re.captures(body)?.get(1)?.as_str();
        let normalized = literal.replace(',', "");
        match normalized.parse::<Decimal>() {
            Ok(amount) => Some(amount),
            Err(e) => {
                debug!(literal, error = %e, "Amount literal out of range");
                None
            },
        }
    }

    /// First day/month/year literal in the body, verbatim
    #[must_use]
    pub fn extract_date<'a>(&self, body: &'a str) -> Option<&'a str> {
        self.date_re.captures(body)?.get(1).map(|m| m.as_str())
    }

    /// Identity of a message under the configured policy
    #[must_use]
    pub fn identity(&self, raw: &RawMessage) -> String {
        let thread = non_empty(raw.thread_id.as_deref()).unwrap_or(DEFAULT_THREAD_ID);
        match (non_empty(raw.message_id.as_deref()), self.identity) {
            (Some(message), _) => format!("{thread}-{message}"),
            (None, IdentityPolicy::Placeholder) => format!("{thread}-{DEFAULT_MESSAGE_ID}"),
            (None, IdentityPolicy::ContentHash) => {
                format!("{thread}-{DEFAULT_MESSAGE_ID}-{}", content_digest(raw))
            },
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn content_digest(raw: &RawMessage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.body.as_bytes());
    hasher.update(raw.timestamp.timestamp_millis().to_be_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}
