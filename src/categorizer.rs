//! Keyword categorization of expense descriptions.

use crate::keywords::CategoryKeywordTable;
use crate::models::Category;

/// Assign a category to a description.
///
/// Categories are tried in table order and the first one with a keyword
/// contained in the lower-cased description wins. A description with
/// both a Food and a Shopping keyword is therefore always Food.
#[must_use]
pub fn categorize(description: &str, table: &CategoryKeywordTable) -> Category {
    let desc = description.to_lowercase();

    table
        .entries()
        .find(|(_, keywords)| keywords.iter().any(|k| desc.contains(k.as_str())))
        .map_or(Category::Others, |(category, _)| category)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CategoryKeywordTable {
        CategoryKeywordTable::default()
    }

    #[test]
    fn test_categorize_food() {
        assert_eq!(categorize("Paid Rs 450 to SWIGGY", &table()), Category::Food);
    }

    #[test]
    fn test_categorize_shopping() {
        assert_eq!(categorize("Purchase at Flipkart", &table()), Category::Shopping);
    }

    #[test]
    fn test_categorize_transport() {
        assert_eq!(categorize("Uber trip INR 230 debited", &table()), Category::Transport);
    }

    #[test]
    fn test_categorize_bills() {
        assert_eq!(categorize("Electricity bill payment received", &table()), Category::Bills);
    }

    #[test]
    fn test_uber_eats_is_food_not_transport() {
        assert_eq!(categorize("Uber Eats order Rs 300", &table()), Category::Food);
    }

    #[test]
    fn test_first_declared_category_wins() {
        assert_eq!(categorize("Lunch at the mall food court", &table()), Category::Food);
    }

    #[test]
    fn test_fallback_is_others() {
        assert_eq!(categorize("Rs 999 debited at XYZ Pvt Ltd", &table()), Category::Others);
    }

    #[test]
    fn test_custom_table_order_is_honoured() {
        let custom = CategoryKeywordTable::new(vec![
            (Category::Shopping, vec!["mall".to_string()]),
            (Category::Food, vec!["food".to_string()]),
        ])
        .unwrap();
        assert_eq!(categorize("mall food court", &custom), Category::Shopping);
    }
}
