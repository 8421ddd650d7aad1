/// Free-text matcher: every query token must occur somewhere in the row

use super::predicate::{apply_mask, build_mask, RowPredicate};
use crate::types::{Dataset, Row};

/// Lower-cased, whitespace-separated query tokens
pub fn tokenize(query: &str) -> Vec<String> {
    query.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Lower-cased row serialization: cell texts joined by one space, column order
pub fn serialize_row(row: &Row) -> String {
    row.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Matches rows whose serialization contains all tokens (order-independent)
#[derive(Debug, Clone)]
pub struct FreeTextPredicate {
    tokens: Vec<String>,
}

impl FreeTextPredicate {
    pub fn new(query: &str) -> Self {
        Self { tokens: tokenize(query) }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl RowPredicate for FreeTextPredicate {
    fn matches(&self, row: &Row) -> bool {
        if self.tokens.is_empty() {
            return true;
        }
        let text = serialize_row(row);
        self.tokens.iter().all(|t| text.contains(t.as_str()))
    }
}

/// Rows of `dataset` matching `query`; projection is never narrowed
pub fn filter<'a>(dataset: &'a Dataset, query: &str) -> Vec<&'a Row> {
    let predicate = FreeTextPredicate::new(query);
    tracing::debug!(tokens = ?predicate.tokens(), "free-text filter");
    let mask = build_mask(dataset.rows(), &[predicate]);
    apply_mask(dataset.rows(), &mask)
}
