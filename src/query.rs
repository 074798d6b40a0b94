//! Read-only queries over the record set: text search and the
//! per-category spending distribution.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{Category, ExpenseRecord};

const SLOTS: usize = Category::ALL.len();

/// Records where any of description, category, amount or date contains
/// `query`, ignoring case. An empty query matches everything. Input order
/// is preserved.
#[must_use]
pub fn filter(records: &[ExpenseRecord], query: &str) -> Vec<ExpenseRecord> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| matches_query(record, &needle))
        .cloned()
        .collect()
}

fn matches_query(record: &ExpenseRecord, needle: &str) -> bool {
    record.description().to_lowercase().contains(needle)
        || record.category().label().to_lowercase().contains(needle)
        || record.amount().to_string().contains(needle)
        || record.date().to_lowercase().contains(needle)
}

/// Spending of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    /// Category
    pub category: Category,
    /// Sum of amounts in the category
    pub amount: Decimal,
    /// Share of the grand total, two decimal places
    pub percentage: Decimal,
}

/// Per-category totals and percentages, always covering all five categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distribution {
    /// Sum of every amount
    pub total: Decimal,
    /// One entry per category, in category order
    pub shares: Vec<CategoryShare>,
}

impl Distribution {
    /// Percentage of the total spent in `category`
    #[must_use]
    pub fn percentage(&self, category: Category) -> Decimal {
        self.share(category).map_or(Decimal::ZERO, |s| s.percentage)
    }

    /// Amount spent in `category`
    #[must_use]
    pub fn amount(&self, category: Category) -> Decimal {
        self.share(category).map_or(Decimal::ZERO, |s| s.amount)
    }

    fn share(&self, category: Category) -> Option<&CategoryShare> {
        self.shares.iter().find(|s| s.category == category)
    }
}

/// Sum amounts per category and express each as a percentage of the total.
///
/// Each percentage is the exact share rounded half away from zero to two
/// decimal places. When those rounded values drift more than 0.01 from
/// 100.00, the difference is settled in steps of 0.01 by largest remainder
/// (earlier category first on ties). A zero total gives 0.00 everywhere.
#[must_use]
pub fn aggregate_by_category(records: &[ExpenseRecord]) -> Distribution {
    let mut amounts = [Decimal::ZERO; SLOTS];
    for record in records {
        let slot = category_index(record.category());
        amounts[slot] = amounts[slot].saturating_add(record.amount());
    }

    let total = amounts.iter().fold(Decimal::ZERO, |acc, a| acc.saturating_add(*a));
    let mut percentages = if total.is_zero() {
        [Decimal::ZERO; SLOTS]
    } else {
        apportion(&amounts, total)
    };
    for p in &mut percentages {
        p.rescale(2);
    }

    let shares = Category::ALL
        .into_iter()
        .zip(amounts)
        .zip(percentages)
        .map(|((category, amount), percentage)| CategoryShare {
            category,
            amount,
            percentage,
        })
        .collect();

    Distribution { total, shares }
}

fn category_index(category: Category) -> usize {
    Category::ALL
        .iter()
        .position(|c| *c == category)
        .unwrap_or(SLOTS - 1)
}

fn apportion(amounts: &[Decimal; SLOTS], total: Decimal) -> [Decimal; SLOTS] {
    let unit = Decimal::new(1, 2);
    let exact = amounts.map(|a| a / total * Decimal::ONE_HUNDRED);
    let mut rounded = exact.map(|p| p.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero));

    let assigned = rounded.iter().fold(Decimal::ZERO, |acc, p| acc + *p);
    let drift = Decimal::ONE_HUNDRED - assigned;
    if drift.abs() <= unit {
        return rounded;
    }

    // Positive drift: raise the most under-rounded shares. Negative: lower
    // the most over-rounded ones.
    let step = if drift.is_sign_positive() { unit } else { -unit };
    let mut order: Vec<usize> = (0..SLOTS).collect();
    order.sort_by(|&a, &b| {
        let ra = (exact[a] - rounded[a]) * step;
        let rb = (exact[b] - rounded[b]) * step;
        rb.cmp(&ra).then(a.cmp(&b))
    });

    let mut remaining = (drift.abs() / unit).round();
    for i in order {
        if remaining <= Decimal::ZERO {
            break;
        }
        if amounts[i].is_zero() {
            continue;
        }
        rounded[i] += step;
        remaining -= Decimal::ONE;
    }

    rounded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, amount: &str, category: Category, description: &str, date: &str) -> ExpenseRecord {
        ExpenseRecord::new(id, amount.parse().unwrap(), date, description, category)
    }

    fn sample() -> Vec<ExpenseRecord> {
        vec![
            record("1", "250", Category::Transport, "Rs 250 debited at UBER trip", "01/06/2024"),
            record("2", "1250.50", Category::Shopping, "Rs 1,250.50 debited at Amazon", "05/06/2024"),
            record("3", "90", Category::Food, "Paid Rs 90 to Uber Eats", "06/06/2024"),
            record("4", "1200", Category::Bills, "Electricity bill Rs 1200 paid", "07/06/2024"),
        ]
    }

    #[test]
    fn test_filter_empty_query_returns_all() {
        assert_eq!(filter(&sample(), ""), sample());
    }

    #[test]
    fn test_filter_is_case_insensitive_over_description() {
        let ids: Vec<String> = filter(&sample(), "uber").iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_filter_matches_category_amount_and_date() {
        assert_eq!(filter(&sample(), "SHOPPING").len(), 1);
        assert_eq!(filter(&sample(), "1250.5").len(), 1);
        assert_eq!(filter(&sample(), "07/06").len(), 1);
        assert!(filter(&sample(), "netflix").is_empty());
    }

    #[test]
    fn test_aggregate_empty_is_all_zero() {
        let dist = aggregate_by_category(&[]);
        assert_eq!(dist.total, Decimal::ZERO);
        assert_eq!(dist.shares.len(), 5);
        for share in &dist.shares {
            assert_eq!(share.percentage, Decimal::ZERO);
        }
    }

    #[test]
    fn test_aggregate_simple_split() {
        let records = vec![
            record("1", "300", Category::Food, "a", "d"),
            record("2", "100", Category::Food, "b", "d"),
            record("3", "100", Category::Transport, "c", "d"),
        ];
        let dist = aggregate_by_category(&records);
        assert_eq!(dist.total, Decimal::new(500, 0));
        assert_eq!(dist.amount(Category::Food), Decimal::new(400, 0));
        assert_eq!(dist.percentage(Category::Food), Decimal::new(8000, 2));
        assert_eq!(dist.percentage(Category::Transport), Decimal::new(2000, 2));
        assert_eq!(dist.percentage(Category::Bills), Decimal::ZERO);
    }

    #[test]
    fn test_aggregate_thirds_sum_to_hundred() {
        let records = vec![
            record("1", "1", Category::Food, "a", "d"),
            record("2", "1", Category::Shopping, "b", "d"),
            record("3", "1", Category::Bills, "c", "d"),
        ];
        let dist = aggregate_by_category(&records);
        // each share rounds on its own; 99.99 is within tolerance
        for category in [Category::Food, Category::Shopping, Category::Bills] {
            assert_eq!(dist.percentage(category), Decimal::new(3333, 2));
        }
        let sum: Decimal = dist.shares.iter().map(|s| s.percentage).sum();
        assert_eq!(sum, Decimal::new(9999, 2));
    }

    #[test]
    fn test_percentages_always_have_two_places() {
        let empty = aggregate_by_category(&[]);
        assert!(empty.shares.iter().all(|s| s.percentage.to_string() == "0.00"));

        let records = vec![
            record("1", "100", Category::Food, "a", "d"),
            record("2", "400", Category::Bills, "b", "d"),
        ];
        let rendered: Vec<String> = aggregate_by_category(&records)
            .shares
            .iter()
            .map(|s| s.percentage.to_string())
            .collect();
        assert_eq!(rendered, vec!["20.00", "0.00", "0.00", "80.00", "0.00"]);
    }

    #[test]
    fn test_aggregate_many_half_hundredths() {
        let records = vec![
            record("1", "20005", Category::Food, "a", "d"),
            record("2", "20005", Category::Shopping, "b", "d"),
            record("3", "20005", Category::Transport, "c", "d"),
            record("4", "20005", Category::Bills, "e", "d"),
            record("5", "19980", Category::Others, "f", "d"),
        ];
        let dist = aggregate_by_category(&records);
        let sum: Decimal = dist.shares.iter().map(|s| s.percentage).sum();
        // four shares of 20.005 round up to 20.01 and overshoot by 0.02
        assert_eq!(sum, Decimal::ONE_HUNDRED);
        assert_eq!(dist.percentage(Category::Food), Decimal::new(2000, 2));
        assert_eq!(dist.percentage(Category::Shopping), Decimal::new(2000, 2));
        assert_eq!(dist.percentage(Category::Transport), Decimal::new(2001, 2));
        assert_eq!(dist.percentage(Category::Others), Decimal::new(1998, 2));
    }
}
