//! Query engine
//!
//! One free-form input string is routed to exactly one of three engines:
//!
//! - `{ ... }`        → GraphQL subset (`graphql`)
//! - `SELECT ...`     → SQL subset (`sql`)
//! - anything else    → free-text token filter (`free_text`)
//!
//! Parsing produces a [`Query`]; executing it against a [`Dataset`]
//! produces a [`QueryResult`]. [`SearchEngine::search`] is the dispatch
//! boundary: format errors stop there and become a user-facing message.

pub mod token;
pub mod lexer;
pub mod predicate;
pub mod free_text;
pub mod graphql;
pub mod sql;

pub use graphql::GraphQlQuery;
pub use lexer::Lexer;
pub use predicate::{build_mask, ColumnPredicate, Condition, MatchOp, RowPredicate};
pub use sql::{Projection, SqlQuery};
pub use token::{Token, TokenType};

use crate::error::Result;
use crate::types::{Dataset, Row, Value};
use std::fmt;

/// Which engine interprets an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    FreeText,
    GraphQl,
    Sql,
}

impl QueryKind {
    /// Leading-character heuristic; `None` for blank input
    pub fn detect(input: &str) -> Option<QueryKind> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.starts_with('{') {
            Some(QueryKind::GraphQl)
        } else if trimmed
            .get(..6)
            .map(|p| p.eq_ignore_ascii_case("select"))
            .unwrap_or(false)
        {
            Some(QueryKind::Sql)
        } else {
            Some(QueryKind::FreeText)
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::FreeText => f.write_str("Free-text"),
            QueryKind::GraphQl => f.write_str("GraphQL"),
            QueryKind::Sql => f.write_str("SQL"),
        }
    }
}

/// A parsed query, independent of any dataset
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    FreeText(String),
    GraphQl(GraphQlQuery),
    Sql(SqlQuery),
}

impl Query {
    /// Parse `input` with the engine chosen by [`QueryKind::detect`].
    ///
    /// Returns `Ok(None)` for blank input.
    pub fn parse(input: &str) -> Result<Option<Query>> {
        let query = match QueryKind::detect(input) {
            None => return Ok(None),
            Some(QueryKind::GraphQl) => Query::GraphQl(GraphQlQuery::parse(input)?),
            Some(QueryKind::Sql) => Query::Sql(SqlQuery::parse(input)?),
            Some(QueryKind::FreeText) => Query::FreeText(input.to_string()),
        };
        Ok(Some(query))
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            Query::FreeText(_) => QueryKind::FreeText,
            Query::GraphQl(_) => QueryKind::GraphQl,
            Query::Sql(_) => QueryKind::Sql,
        }
    }

    pub fn execute<'a>(&self, dataset: &'a Dataset) -> QueryResult<'a> {
        match self {
            Query::FreeText(text) => QueryResult {
                rows: free_text::filter(dataset, text),
                columns: dataset.columns().to_vec(),
                warnings: Vec::new(),
            },
            Query::GraphQl(q) => q.execute(dataset),
            Query::Sql(q) => q.execute(dataset),
        }
    }
}

/// Matching rows (original order) plus the ordered output columns
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<'a> {
    pub rows: Vec<&'a Row>,
    pub columns: Vec<String>,
    pub warnings: Vec<String>,
}

impl<'a> QueryResult<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows restricted to `columns`, in column order
    pub fn project(&self, dataset: &Dataset) -> Vec<Vec<&'a Value>> {
        let indices: Vec<usize> = self
            .columns
            .iter()
            .filter_map(|c| dataset.column_index(c))
            .collect();
        self.rows
            .iter()
            .map(|row| indices.iter().filter_map(|&i| row.get(i)).collect())
            .collect()
    }
}

/// What the caller should render for one submission
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<'a> {
    /// Blank input: ask for a query
    Prompt,
    Results {
        kind: QueryKind,
        result: QueryResult<'a>,
    },
    /// Fatal format error, message shown verbatim
    Error(String),
}

pub const PROMPT: &str = "Enter a search query above to filter data.";

/// Runs queries against one immutable dataset snapshot
#[derive(Debug)]
pub struct SearchEngine<'d> {
    dataset: &'d Dataset,
}

impl<'d> SearchEngine<'d> {
    pub fn new(dataset: &'d Dataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &'d Dataset {
        self.dataset
    }

    /// Dispatch one submission. Never panics and never propagates errors.
    pub fn search(&self, input: &str) -> SearchOutcome<'d> {
        match Query::parse(input) {
            Ok(None) => SearchOutcome::Prompt,
            Ok(Some(query)) => {
                let kind = query.kind();
                let result = query.execute(self.dataset);
                tracing::debug!(%kind, rows = result.len(), columns = result.columns.len(), "query executed");
                SearchOutcome::Results { kind, result }
            }
            Err(e) => {
                tracing::debug!(error = %e, "query rejected");
                SearchOutcome::Error(e.to_string())
            }
        }
    }
}
