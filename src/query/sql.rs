/// SQL-subset parser
///
/// Grammar:
///
/// ```text
/// SELECT <cols> FROM people [WHERE <cond> (AND <cond>)*] [LIMIT <n>] [;]
/// <cols> := * | name (, name)*
/// <cond> := field (= | LIKE) 'value'
/// ```
///
/// A malformed condition or limit is reported as a warning and skipped;
/// only a broken skeleton is fatal.
use super::lexer::Lexer;
use super::predicate::{apply_mask, build_mask, Condition, MatchOp};
use super::token::{render, Token, TokenType};
use super::QueryResult;
use crate::error::{Result, SearchError};
use crate::schema::{resolve_selection, SQL_ALIASES};
use crate::types::Dataset;

pub const FORMAT_ERROR: &str = "SQL query format not recognized.";
pub const INVALID_LIMIT: &str = "Invalid limit value, ignoring limit.";

const TABLE: &str = "people";

/// Output columns requested by the SELECT list
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `SELECT *`
    All,
    /// Field names as written, resolved at execution time
    Fields(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub projection: Projection,
    pub conditions: Vec<Condition>,
    pub limit: Option<usize>,
    /// Non-fatal problems found while parsing
    pub warnings: Vec<String>,
}

impl SqlQuery {
    pub fn parse(input: &str) -> Result<Self> {
        let tokens = Lexer::new(input)
            .tokenize()
            .map_err(|_| SearchError::format(FORMAT_ERROR))?;
        SqlParser::new(&tokens).parse()
    }

    pub fn execute<'a>(&self, dataset: &'a Dataset) -> QueryResult<'a> {
        let predicates: Vec<_> = self
            .conditions
            .iter()
            .filter_map(|c| c.compile(dataset, &SQL_ALIASES))
            .collect();
        let mask = build_mask(dataset.rows(), &predicates);

        let mut rows = apply_mask(dataset.rows(), &mask);
        if let Some(n) = self.limit {
            rows.truncate(n);
        }

        let columns = match &self.projection {
            Projection::All => dataset.columns().to_vec(),
            Projection::Fields(fields) => resolve_selection(fields, &SQL_ALIASES, dataset.columns()),
        };

        QueryResult {
            rows,
            columns,
            warnings: self.warnings.clone(),
        }
    }
}

struct SqlParser<'t> {
    tokens: &'t [Token],
    position: usize,
    warnings: Vec<String>,
}

impl<'t> SqlParser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            position: 0,
            warnings: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<SqlQuery> {
        self.expect(TokenType::Select)?;

        let projection = self.parse_projection()?;

        self.expect(TokenType::From)?;
        match self.current().word() {
            Some(table) if table.eq_ignore_ascii_case(TABLE) => self.advance(),
            _ => return Err(format_error()),
        }

        let conditions = if self.match_token(TokenType::Where) {
            self.parse_where()?
        } else {
            Vec::new()
        };

        let limit = if self.match_token(TokenType::Limit) {
            self.parse_limit()
        } else {
            None
        };

        self.match_token(TokenType::Semicolon);
        if !self.current().is_eof() {
            return Err(format_error());
        }

        Ok(SqlQuery {
            projection,
            conditions,
            limit,
            warnings: self.warnings,
        })
    }

    fn parse_projection(&mut self) -> Result<Projection> {
        let cols = self.take_until(|t| matches!(t, TokenType::From));
        if cols.is_empty() {
            return Err(format_error());
        }
        if cols.len() == 1 && cols[0].token_type == TokenType::Star {
            return Ok(Projection::All);
        }

        // a multi-token name ("First Name") is glued back together;
        // resolution normalizes whitespace away anyway
        let fields = cols
            .split(|t| t.token_type == TokenType::Comma)
            .map(|group| group.iter().map(|t| t.lexeme.as_str()).collect::<String>())
            .filter(|name| !name.is_empty())
            .collect();
        Ok(Projection::Fields(fields))
    }

    fn parse_where(&mut self) -> Result<Vec<Condition>> {
        let clause = self.take_until(|t| {
            matches!(t, TokenType::Limit | TokenType::Semicolon | TokenType::Eof)
        });
        if clause.is_empty() {
            return Err(format_error());
        }

        let mut conditions = Vec::new();
        for segment in clause.split(|t| t.token_type == TokenType::And) {
            // a dangling AND leaves nothing to report
            if segment.is_empty() {
                continue;
            }
            match parse_condition(segment) {
                Some(cond) => conditions.push(cond),
                None => self.warn(format!("Invalid condition: {}", render(segment))),
            }
        }
        Ok(conditions)
    }

    fn parse_limit(&mut self) -> Option<usize> {
        let arg = self.take_until(|t| matches!(t, TokenType::Semicolon | TokenType::Eof));
        let limit = match arg {
            [Token { token_type: TokenType::Number(n), .. }] => n.parse::<usize>().ok(),
            _ => None,
        };
        if limit.is_none() {
            self.warn(INVALID_LIMIT.to_string());
        }
        limit
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    /// Consume tokens up to (not including) the first one accepted by `stop`
    fn take_until(&mut self, stop: impl Fn(&TokenType) -> bool) -> &'t [Token] {
        let start = self.position;
        while !self.current().is_eof() && !stop(&self.current().token_type) {
            self.advance();
        }
        &self.tokens[start..self.position]
    }

    fn current(&self) -> &'t Token {
        // the lexer always terminates the stream with Eof
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.position.min(last)]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn match_token(&mut self, expected: TokenType) -> bool {
        if self.current().token_type == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: TokenType) -> Result<()> {
        if self.match_token(expected) {
            Ok(())
        } else {
            Err(format_error())
        }
    }
}

/// `field (= | LIKE) 'value'` at the start of the segment; anything after
/// the value is ignored
fn parse_condition(segment: &[Token]) -> Option<Condition> {
    let [field, op, value, rest @ ..] = segment else {
        return None;
    };
    if !rest.is_empty() {
        tracing::debug!(ignored = %render(rest), "trailing tokens after condition");
    }
    let field = match &field.token_type {
        TokenType::Identifier(name) => name.as_str(),
        _ => return None,
    };
    let value = value.quoted('\'').filter(|v| !v.is_empty())?;

    match op.token_type {
        TokenType::Eq => Some(Condition::new(field, MatchOp::Equals, value)),
        TokenType::Like => {
            let (op, needle) = MatchOp::from_like_pattern(value);
            Some(Condition::new(field, op, needle))
        }
        _ => None,
    }
}

fn format_error() -> SearchError {
    SearchError::format(FORMAT_ERROR)
}
