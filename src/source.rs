//! Collaborators that supply raw messages and read permission.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::{Result, TrackerError};
use crate::models::{ListFilter, Mailbox, PermissionStatus, RawMessage};

/// Something that can list the device's text messages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Messages matching `filter`, newest first
    async fn list(&self, filter: &ListFilter) -> Result<Vec<RawMessage>>;
}

/// Grants or refuses access to the message source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Current answer; `Denied` ends the session
    async fn request(&self) -> PermissionStatus;
}

const TYPE_INBOX: i64 = 1;
const TYPE_SENT: i64 = 2;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdField {
    Number(i64),
    Text(String),
}

impl IdField {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InboxEntry {
    #[serde(rename = "_id")]
    id: Option<IdField>,
    thread_id: Option<IdField>,
    #[serde(default)]
    body: String,
    date: i64,
    #[serde(rename = "type")]
    kind: Option<i64>,
}

impl InboxEntry {
    fn in_mailbox(&self, mailbox: Mailbox) -> bool {
        match mailbox {
            Mailbox::All => true,
            Mailbox::Inbox => self.kind.unwrap_or(TYPE_INBOX) == TYPE_INBOX,
            Mailbox::Sent => self.kind == Some(TYPE_SENT),
        }
    }

    fn into_raw(self) -> Option<RawMessage> {
        let Some(timestamp) = Utc.timestamp_millis_opt(self.date).single() else {
            warn!(date = self.date, "Skipping message with out-of-range timestamp");
            return None;
        };
        Some(RawMessage {
            body: self.body,
            timestamp,
            thread_id: self.thread_id.map(IdField::into_string),
            message_id: self.id.map(IdField::into_string),
        })
    }
}

/// Reads an exported inbox: a JSON array of `{_id, thread_id, body, date, type}`
#[derive(Debug, Clone)]
pub struct JsonInboxSource {
    path: PathBuf,
}

impl JsonInboxSource {
    /// Source reading the export at `path` on every `list`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse an export already in memory
    pub fn parse(json: &str, filter: &ListFilter) -> Result<Vec<RawMessage>> {
        let entries: Vec<InboxEntry> =
            serde_json::from_str(json).map_err(|e| TrackerError::Source(format!("Malformed inbox export: {e}")))?;

        let mut messages: Vec<RawMessage> = entries
            .into_iter()
            .filter(|entry| entry.in_mailbox(filter.mailbox))
            .filter_map(InboxEntry::into_raw)
            .collect();

        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        messages.truncate(filter.max_count);
        Ok(messages)
    }
}

#[async_trait]
impl MessageSource for JsonInboxSource {
    async fn list(&self, filter: &ListFilter) -> Result<Vec<RawMessage>> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| TrackerError::Source(format!("Cannot read {}: {e}", self.path.display())))?;
        let messages = Self::parse(&json, filter)?;
        debug!(path = %self.path.display(), count = messages.len(), "Listed messages");
        Ok(messages)
    }
}

/// Granted when the inbox export can be opened for reading
#[derive(Debug, Clone)]
pub struct SourcePermission {
    path: PathBuf,
}

impl SourcePermission {
    /// Gate for the export at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PermissionGate for SourcePermission {
    async fn request(&self) -> PermissionStatus {
        match tokio::fs::File::open(&self.path).await {
            Ok(_) => PermissionStatus::Granted,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Message source not readable");
                PermissionStatus::Denied
            },
        }
    }
}

/// Always answers with the same status
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission(pub PermissionStatus);

#[async_trait]
impl PermissionGate for StaticPermission {
    async fn request(&self) -> PermissionStatus {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"[
        {"_id": 11, "thread_id": 3, "body": "Rs 40 paid at cafe", "date": 1717761600000, "type": 1},
        {"_id": "12", "thread_id": "3", "body": "sent one", "date": 1717848000000, "type": 2},
        {"_id": 13, "body": "Rs 99 debited", "date": 1717934400000},
        {"body": "no ids", "date": 1717675200000, "type": 1}
    ]"#;

    #[test]
    fn test_parse_inbox_newest_first() {
        let messages = JsonInboxSource::parse(EXPORT, &ListFilter::default()).unwrap();
        let ids: Vec<Option<&str>> = messages.iter().map(|m| m.message_id.as_deref()).collect();
        assert_eq!(ids, vec![Some("13"), Some("11"), None]);
        assert_eq!(messages[1].thread_id.as_deref(), Some("3"));
        assert_eq!(messages[0].thread_id, None);
    }

    #[test]
    fn test_parse_respects_mailbox_and_max_count() {
        let sent = ListFilter {
            mailbox: Mailbox::Sent,
            max_count: 10,
        };
        let messages = JsonInboxSource::parse(EXPORT, &sent).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body, "sent one");

        let capped = ListFilter {
            mailbox: Mailbox::All,
            max_count: 2,
        };
        assert_eq!(JsonInboxSource::parse(EXPORT, &capped).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_malformed_is_source_error() {
        let err = JsonInboxSource::parse("{not json", &ListFilter::default()).unwrap_err();
        assert!(matches!(err, TrackerError::Source(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_denied_and_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        assert_eq!(SourcePermission::new(&path).request().await, PermissionStatus::Denied);
        let err = JsonInboxSource::new(&path).list(&ListFilter::default()).await.unwrap_err();
        assert!(matches!(err, TrackerError::Source(_)));
    }

    #[tokio::test]
    async fn test_reads_export_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.json");
        std::fs::write(&path, EXPORT).unwrap();

        assert_eq!(SourcePermission::new(&path).request().await, PermissionStatus::Granted);
        let messages = JsonInboxSource::new(&path).list(&ListFilter::default()).await.unwrap();
        assert_eq!(messages.len(), 3);
    }
}
