//! Ingestion pipeline: raw messages in, newly merged records out.
//!
//! Steps per batch: transaction keyword gate, field extraction,
//! categorization, then an id-based merge into the record store. Running
//! the same batch twice adds nothing the second time.

use tracing::{debug, info};

use crate::categorizer::categorize;
use crate::config::AppConfig;
use crate::error::Result;
use crate::extractor::{Extraction, FieldExtractor};
use crate::keywords::{CategoryKeywordTable, TransactionKeywordSet};
use crate::models::{ExpenseRecord, RawMessage};
use crate::store::RecordStore;

/// What happened to one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Messages in the batch
    pub scanned: usize,
    /// Messages without any transaction keyword
    pub gated_out: usize,
    /// Messages that passed the gate but had no readable amount
    pub rejected: usize,
    /// Candidates whose id was already known
    pub duplicates: usize,
    /// Records actually inserted, in store order
    pub added: Vec<ExpenseRecord>,
}

impl IngestReport {
    /// Number of newly added records
    #[must_use]
    pub fn added_count(&self) -> usize {
        self.added.len()
    }
}

/// Extractor plus keyword tables, built once and reused per batch
#[derive(Debug, Clone)]
pub struct Pipeline {
    extractor: FieldExtractor,
    categories: CategoryKeywordTable,
    transactions: TransactionKeywordSet,
}

impl Pipeline {
    /// Assemble a pipeline from its parts
    #[must_use]
    pub fn new(
        extractor: FieldExtractor,
        categories: CategoryKeywordTable,
        transactions: TransactionKeywordSet,
    ) -> Self {
        Self {
            extractor,
            categories,
            transactions,
        }
    }

    /// Build the pipeline described by the configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let extractor = FieldExtractor::new(&config.pipeline.date_format, config.pipeline.identity)?;
        Ok(Self::new(
            extractor,
            config.keywords.category_table(),
            config.keywords.transaction_set(),
        ))
    }

    /// Gate, extract and categorize a batch without touching any store
    #[must_use]
    pub fn candidates(&self, messages: &[RawMessage]) -> (Vec<ExpenseRecord>, IngestReport) {
        let mut report = IngestReport {
            scanned: messages.len(),
            ..IngestReport::default()
        };
        let mut candidates = Vec::new();

        for raw in messages {
            if !self.transactions.matches(&raw.body) {
                report.gated_out += 1;
                continue;
            }

            match self.extractor.extract(raw) {
                Extraction::Expense(candidate) => {
                    let category = categorize(&candidate.description, &self.categories);
                    debug!(id = %candidate.id, %category, "Candidate expense");
                    candidates.push(candidate.into_record(category));
                },
                Extraction::NotAnExpense => report.rejected += 1,
            }
        }

        (candidates, report)
    }

    /// Run a batch through the pipeline and merge it into `store`
    pub fn ingest(&self, messages: &[RawMessage], store: &mut RecordStore) -> IngestReport {
        let (candidates, mut report) = self.candidates(messages);
        let offered = candidates.len();

        report.added = store.merge(candidates);
        report.duplicates = offered - report.added.len();

        info!(
            scanned = report.scanned,
            gated_out = report.gated_out,
            rejected = report.rejected,
            duplicates = report.duplicates,
            added = report.added.len(),
            "Ingested message batch"
        );
        report
    }
}
