use anyhow::{Context, Result};
use config::{Config, ConfigBuilder, Environment, File};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::extractor::{IdentityPolicy, DEFAULT_DATE_FORMAT};
use crate::keywords::{default_keywords, default_transaction_keywords, CategoryKeywordTable, TransactionKeywordSet};
use crate::models::{Category, ListFilter, Mailbox};
use crate::store::DEFAULT_SNAPSHOT_KEY;

/// Application configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub source: SourceConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
    pub keywords: KeywordConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: String,
    pub key: String,
    pub reset_on_corrupt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub inbox_path: String,
    pub mailbox: Mailbox,
    pub max_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub poll_interval_secs: u64,
    pub date_format: String,
    pub identity: IdentityPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordConfig {
    pub food: Vec<String>,
    pub shopping: Vec<String>,
    pub transport: Vec<String>,
    pub bills: Vec<String>,
    pub transaction: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                path: "./data/expenses".to_string(),
                key: DEFAULT_SNAPSHOT_KEY.to_string(),
                reset_on_corrupt: false,
            },
            source: SourceConfig {
                inbox_path: "./inbox.json".to_string(),
                mailbox: Mailbox::Inbox,
                max_count: 1000,
            },
            pipeline: PipelineConfig {
                poll_interval_secs: 300,
                date_format: DEFAULT_DATE_FORMAT.to_string(),
                identity: IdentityPolicy::Placeholder,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            keywords: KeywordConfig {
                food: default_keywords(Category::Food),
                shopping: default_keywords(Category::Shopping),
                transport: default_keywords(Category::Transport),
                bills: default_keywords(Category::Bills),
                transaction: default_transaction_keywords(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence.
    ///
    /// Built-in defaults, then `config/default`, `config/local` and
    /// `expense-tracker` files when present, then `explicit` (required when
    /// given), then `EXPENSE_TRACKER__*` environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("expense-tracker").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("EXPENSE_TRACKER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("keywords.food")
                    .with_list_parse_key("keywords.shopping")
                    .with_list_parse_key("keywords.transport")
                    .with_list_parse_key("keywords.bills")
                    .with_list_parse_key("keywords.transaction"),
            )
            .build()
            .context("Failed to load configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let d = Self::default();
        let builder = Config::builder()
            .set_default("storage.path", d.storage.path)?
            .set_default("storage.key", d.storage.key)?
            .set_default("storage.reset_on_corrupt", d.storage.reset_on_corrupt)?
            .set_default("source.inbox_path", d.source.inbox_path)?
            .set_default("source.mailbox", "inbox")?
            .set_default("source.max_count", d.source.max_count as u64)?
            .set_default("pipeline.poll_interval_secs", d.pipeline.poll_interval_secs)?
            .set_default("pipeline.date_format", d.pipeline.date_format)?
            .set_default("pipeline.identity", "placeholder")?
            .set_default("logging.level", d.logging.level)?
            .set_default("logging.format", d.logging.format)?
            .set_default("keywords.food", d.keywords.food)?
            .set_default("keywords.shopping", d.keywords.shopping)?
            .set_default("keywords.transport", d.keywords.transport)?
            .set_default("keywords.bills", d.keywords.bills)?
            .set_default("keywords.transaction", d.keywords.transaction)?;
        Ok(builder)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate storage config
        if self.storage.path.trim().is_empty() {
            return Err(anyhow::anyhow!("storage.path cannot be empty"));
        }
        if self.storage.key.trim().is_empty() {
            return Err(anyhow::anyhow!("storage.key cannot be empty"));
        }

        // Validate source config
        if self.source.max_count == 0 {
            return Err(anyhow::anyhow!("max_count must be greater than 0"));
        }

        // Validate pipeline config
        if self.pipeline.poll_interval_secs == 0 {
            return Err(anyhow::anyhow!("poll_interval_secs must be greater than 0"));
        }
        if self.pipeline.date_format.trim().is_empty() {
            return Err(anyhow::anyhow!("date_format cannot be empty"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate keywords
        if self.keywords.transaction.iter().all(|w| w.trim().is_empty()) {
            return Err(anyhow::anyhow!("keywords.transaction must contain at least one keyword"));
        }
        let all_keywords = self
            .keywords
            .food
            .iter()
            .chain(&self.keywords.shopping)
            .chain(&self.keywords.transport)
            .chain(&self.keywords.bills)
            .chain(&self.keywords.transaction);
        for word in all_keywords {
            if *word != word.to_lowercase() {
                return Err(anyhow::anyhow!("Keyword must be lowercase: {}", word));
            }
        }

        Ok(())
    }

    /// Path of the snapshot store
    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.path)
    }

    /// Path of the exported inbox
    pub fn inbox_path(&self) -> PathBuf {
        PathBuf::from(&self.source.inbox_path)
    }

    /// Bounds for each read of the message source
    pub fn list_filter(&self) -> ListFilter {
        ListFilter {
            mailbox: self.source.mailbox,
            max_count: self.source.max_count,
        }
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}

impl KeywordConfig {
    /// Category table in the fixed Food, Shopping, Transport, Bills order
    pub fn category_table(&self) -> CategoryKeywordTable {
        CategoryKeywordTable::from_lists(
            self.food.clone(),
            self.shopping.clone(),
            self.transport.clone(),
            self.bills.clone(),
        )
    }

    /// Transaction gate keywords
    pub fn transaction_set(&self) -> TransactionKeywordSet {
        TransactionKeywordSet::new(self.transaction.clone())
    }
}
