//! Keyword tables used by the transaction gate and the categorizer.
//!
//! Both tables are plain values built once and passed to whoever needs
//! them, so tests can substitute their own lists.

use crate::error::{Result, TrackerError};
use crate::models::Category;

const FOOD: &[&str] = &[
    "restaurant",
    "food",
    "dinner",
    "lunch",
    "breakfast",
    "cafe",
    "uber eats",
    "swiggy",
    "zomato",
];
const SHOPPING: &[&str] = &["amazon", "flipkart", "ebay", "shopping", "store", "mall"];
const TRANSPORT: &[&str] = &["uber", "ola", "metro", "taxi", "bus", "train", "flight", "transport"];
const BILLS: &[&str] = &["electricity", "water", "internet", "bill", "utility"];

const TRANSACTION: &[&str] = &[
    "debited",
    "credited",
    "debit",
    "credit",
    "spent",
    "paid",
    "payment",
    "purchase",
    "txn",
    "transaction",
    "withdrawn",
    "transferred",
];

/// Built-in keywords for a category (empty for `Others`)
#[must_use]
pub fn default_keywords(category: Category) -> Vec<String> {
    let words = match category {
        Category::Food => FOOD,
        Category::Shopping => SHOPPING,
        Category::Transport => TRANSPORT,
        Category::Bills => BILLS,
        Category::Others => &[],
    };
    words.iter().map(|w| (*w).to_string()).collect()
}

/// Built-in transaction keywords
#[must_use]
pub fn default_transaction_keywords() -> Vec<String> {
    TRANSACTION.iter().map(|w| (*w).to_string()).collect()
}

fn normalize(words: Vec<String>) -> Vec<String> {
    words
        .into_iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Ordered mapping from category to lowercase keywords.
///
/// Declaration order is the tie-break: the first category with a matching
/// keyword wins. `Others` is always last and never has keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryKeywordTable {
    entries: Vec<(Category, Vec<String>)>,
}

impl CategoryKeywordTable {
    /// Build a table from explicit entries, kept in the given order.
    ///
    /// `Others` may be omitted; it is appended with an empty set.
    pub fn new(entries: Vec<(Category, Vec<String>)>) -> Result<Self> {
        let mut ordered: Vec<(Category, Vec<String>)> = Vec::with_capacity(entries.len() + 1);
        for (category, words) in entries {
            if ordered.iter().any(|(c, _)| *c == category) {
                return Err(TrackerError::InvalidConfig(format!(
                    "Category {category} declared twice in keyword table"
                )));
            }
            if category == Category::Others {
                if !words.is_empty() {
                    return Err(TrackerError::InvalidConfig(
                        "Others is the fallback category and takes no keywords".to_string(),
                    ));
                }
                continue;
            }
            ordered.push((category, normalize(words)));
        }
        ordered.push((Category::Others, Vec::new()));
        Ok(Self { entries: ordered })
    }

    /// Table in the fixed Food, Shopping, Transport, Bills order
    #[must_use]
    pub fn from_lists(food: Vec<String>, shopping: Vec<String>, transport: Vec<String>, bills: Vec<String>) -> Self {
        Self {
            entries: vec![
                (Category::Food, normalize(food)),
                (Category::Shopping, normalize(shopping)),
                (Category::Transport, normalize(transport)),
                (Category::Bills, normalize(bills)),
                (Category::Others, Vec::new()),
            ],
        }
    }

    /// Categories with their keywords, in priority order
    pub fn entries(&self) -> impl Iterator<Item = (Category, &[String])> {
        self.entries.iter().map(|(c, words)| (*c, words.as_slice()))
    }

    /// Keywords of one category
    #[must_use]
    pub fn keywords(&self, category: Category) -> &[String] {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(&[][..], |(_, words)| words.as_slice())
    }
}

impl Default for CategoryKeywordTable {
    fn default() -> Self {
        Self::from_lists(
            default_keywords(Category::Food),
            default_keywords(Category::Shopping),
            default_keywords(Category::Transport),
            default_keywords(Category::Bills),
        )
    }
}

/// Flat set of words that mark a message as a financial transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionKeywordSet {
    words: Vec<String>,
}

impl TransactionKeywordSet {
    /// Build from a list of keywords; empty entries are dropped
    #[must_use]
    pub fn new(words: Vec<String>) -> Self {
        Self { words: normalize(words) }
    }

    /// True if the lower-cased body contains any keyword
    #[must_use]
    pub fn matches(&self, body: &str) -> bool {
        let lower = body.to_lowercase();
        self.words.iter().any(|w| lower.contains(w.as_str()))
    }

    /// Number of keywords in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True if the set has no keywords (then nothing passes the gate)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for TransactionKeywordSet {
    fn default() -> Self {
        Self::new(default_transaction_keywords())
    }
}
