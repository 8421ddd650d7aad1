//! Voter search engine
//!
//! Search a tabular voter-registration dataset with one input box that
//! accepts three query styles.
//!
//! ## Query styles
//! - Free text: whitespace tokens, every token must appear somewhere in the row
//! - GraphQL subset: `{ people(where: {city: "Mesa"}) { firstName } }`
//! - SQL subset: `SELECT firstName FROM people WHERE city LIKE 'Me%' LIMIT 10`
//!
//! ## Layout
//! - Data: typed cells, CSV loading (`types`)
//! - Schema: canonical columns and per-language alias tables (`schema`)
//! - Query: lexer, parsers, predicates and dispatch (`query`)
//! - Enrichment: geocoding, analytics and map planning (`geo`, `analytics`, `map`)

pub mod analytics;
pub mod config;
pub mod geo;
pub mod map;
pub mod query;
pub mod schema;
pub mod types;

mod error;

pub use config::{AnalyticsConfig, GeocodeConfig, MapConfig, SearchConfig};
pub use error::{Result, SearchError};

pub use query::{Query, QueryKind, QueryResult, SearchEngine, SearchOutcome};
pub use types::{Dataset, Row, Value};
