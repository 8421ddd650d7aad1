/// Predicate evaluators - comparison semantics shared by the structured languages
///
/// Every comparison is a case-insensitive string comparison performed on
/// the text form of the cell.
use crate::schema::{resolve_field, FieldAliasTable};
use crate::types::{Dataset, Row};
use std::fmt;

/// Comparison operator of a parsed condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOp {
    Equals,
    StartsWith,
    Contains,
    EndsWith,
}

impl MatchOp {
    /// Compile a SQL `LIKE` pattern.
    ///
    /// Only leading/trailing `%` are wildcards: `%x%` contains, `x%` prefix,
    /// `%x` suffix, and a pattern without wildcards is plain equality.
    pub fn from_like_pattern(pattern: &str) -> (MatchOp, String) {
        let starts = pattern.starts_with('%');
        let ends = pattern.ends_with('%');
        match (starts, ends) {
            (true, true) => (MatchOp::Contains, pattern.trim_matches('%').to_string()),
            (false, true) => (MatchOp::StartsWith, pattern.trim_end_matches('%').to_string()),
            (true, false) => (MatchOp::EndsWith, pattern.trim_start_matches('%').to_string()),
            (false, false) => (MatchOp::Equals, pattern.to_string()),
        }
    }

    /// `text` and `needle` must already be lower-cased
    #[inline]
    pub fn apply(self, text: &str, needle: &str) -> bool {
        match self {
            MatchOp::Equals => text == needle,
            MatchOp::StartsWith => text.starts_with(needle),
            MatchOp::Contains => text.contains(needle),
            MatchOp::EndsWith => text.ends_with(needle),
        }
    }
}

impl fmt::Display for MatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchOp::Equals => "equals",
            MatchOp::StartsWith => "starts with",
            MatchOp::Contains => "contains",
            MatchOp::EndsWith => "ends with",
        };
        f.write_str(s)
    }
}

/// A parsed `(field, operator, value)` triple, field still unresolved
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: MatchOp,
    pub value: String,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: MatchOp, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Bind the condition to a dataset column.
    ///
    /// Returns `None` when the field cannot be resolved; such conditions
    /// are skipped by the caller.
    pub fn compile(&self, dataset: &Dataset, aliases: &FieldAliasTable) -> Option<ColumnPredicate> {
        let column = resolve_field(&self.field, aliases, dataset.columns())?;
        let column_index = dataset.column_index(column)?;
        Some(ColumnPredicate {
            column_index,
            op: self.op,
            needle: self.value.to_lowercase(),
        })
    }
}

/// Anything that can accept or reject a row
pub trait RowPredicate {
    fn matches(&self, row: &Row) -> bool;
}

impl<F> RowPredicate for F
where
    F: Fn(&Row) -> bool,
{
    fn matches(&self, row: &Row) -> bool {
        self(row)
    }
}

/// A condition bound to a column position
#[derive(Debug, Clone)]
pub struct ColumnPredicate {
    column_index: usize,
    op: MatchOp,
    needle: String,
}

impl ColumnPredicate {
    pub fn new(column_index: usize, op: MatchOp, value: &str) -> Self {
        Self {
            column_index,
            op,
            needle: value.to_lowercase(),
        }
    }
}

impl RowPredicate for ColumnPredicate {
    fn matches(&self, row: &Row) -> bool {
        match row.get(self.column_index) {
            Some(cell) => self.op.apply(&cell.to_lowercase_text(), &self.needle),
            None => false,
        }
    }
}

/// Row mask: AND-fold of predicates over the rows, starting all-true
pub fn build_mask<P: RowPredicate>(rows: &[Row], predicates: &[P]) -> Vec<bool> {
    predicates.iter().fold(vec![true; rows.len()], |mut mask, pred| {
        for (keep, row) in mask.iter_mut().zip(rows) {
            if *keep {
                *keep = pred.matches(row);
            }
        }
        mask
    })
}

/// Rows selected by `mask`, in original order
pub fn apply_mask<'a>(rows: &'a [Row], mask: &[bool]) -> Vec<&'a Row> {
    rows.iter()
        .zip(mask)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect()
}
