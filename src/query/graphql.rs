/// GraphQL-subset parser
///
/// Recognized shape (whitespace-insensitive, usually wrapped in `{ ... }`):
///
/// ```text
/// people(where: { firstName: "John", city_startsWith: "Me" }) { firstName city }
/// ```
use super::lexer::Lexer;
use super::predicate::{apply_mask, build_mask, Condition, MatchOp};
use super::token::{Token, TokenType};
use super::QueryResult;
use crate::error::{Result, SearchError};
use crate::schema::{resolve_selection, GRAPHQL_ALIASES};
use crate::types::Dataset;

pub const FORMAT_ERROR: &str = "GraphQL query format not recognized.";

const STARTS_WITH_SUFFIX: &str = "_startsWith";

#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlQuery {
    pub conditions: Vec<Condition>,
    pub selection: Vec<String>,
}

impl GraphQlQuery {
    pub fn parse(input: &str) -> Result<Self> {
        let tokens = Lexer::new(input)
            .tokenize()
            .map_err(|_| SearchError::format(FORMAT_ERROR))?;

        (0..tokens.len())
            .find_map(|start| match_people(&tokens, start))
            .map(|(conds, sel)| GraphQlQuery {
                conditions: parse_conditions(conds),
                selection: sel.iter().filter_map(Token::word).map(str::to_string).collect(),
            })
            .ok_or_else(|| SearchError::format(FORMAT_ERROR))
    }

    /// Apply resolvable conditions, then project the selection.
    pub fn execute<'a>(&self, dataset: &'a Dataset) -> QueryResult<'a> {
        let predicates: Vec<_> = self
            .conditions
            .iter()
            .filter_map(|c| {
                let compiled = c.compile(dataset, &GRAPHQL_ALIASES);
                if compiled.is_none() {
                    tracing::debug!(field = %c.field, "skipping unresolvable graphql condition");
                }
                compiled
            })
            .collect();
        let mask = build_mask(dataset.rows(), &predicates);

        QueryResult {
            rows: apply_mask(dataset.rows(), &mask),
            columns: resolve_selection(&self.selection, &GRAPHQL_ALIASES, dataset.columns()),
            warnings: Vec::new(),
        }
    }
}

/// Try to match `people ( where : { ... } ) { ... }` at `start`.
/// Returns the condition tokens and the selection tokens.
fn match_people(tokens: &[Token], start: usize) -> Option<(&[Token], &[Token])> {
    let at = |i: usize| tokens.get(start + i);
    let is = |i: usize, t: TokenType| at(i).map(|tok| tok.token_type == t).unwrap_or(false);
    let word_is = |i: usize, w: &str| at(i).and_then(Token::word) == Some(w);

    if !(word_is(0, "people")
        && is(1, TokenType::LParen)
        && word_is(2, "where")
        && is(3, TokenType::Colon)
        && is(4, TokenType::LBrace))
    {
        return None;
    }

    let cond_start = start + 5;
    // conditions end at the first `}` directly followed by `)`
    let cond_end = (cond_start..tokens.len()).find(|&i| {
        tokens[i].token_type == TokenType::RBrace
            && tokens.get(i + 1).map(|t| &t.token_type) == Some(&TokenType::RParen)
    })?;

    if tokens.get(cond_end + 2).map(|t| &t.token_type) != Some(&TokenType::LBrace) {
        return None;
    }
    let sel_start = cond_end + 3;
    let sel_end = (sel_start..tokens.len()).find(|&i| tokens[i].token_type == TokenType::RBrace)?;

    Some((&tokens[cond_start..cond_end], &tokens[sel_start..sel_end]))
}

/// Collect `name : "value"` pairs; anything else between them is ignored
fn parse_conditions(tokens: &[Token]) -> Vec<Condition> {
    let mut conditions = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let pair = tokens[i].word().and_then(|name| {
            let colon = tokens.get(i + 1)?;
            if colon.token_type != TokenType::Colon {
                return None;
            }
            let value = tokens.get(i + 2)?.quoted('"')?;
            (!value.is_empty()).then_some((name, value))
        });

        match pair {
            Some((name, value)) => {
                conditions.push(condition_for(name, value));
                i += 3;
            }
            None => i += 1,
        }
    }
    conditions
}

fn condition_for(name: &str, value: &str) -> Condition {
    match name.strip_suffix(STARTS_WITH_SUFFIX) {
        Some(base) => Condition::new(base, MatchOp::StartsWith, value),
        None => Condition::new(name, MatchOp::Equals, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::columns;
    use crate::types::Value;

    fn dataset() -> Dataset {
        Dataset::new(
            vec![
                columns::FIRST_NAME.into(),
                columns::LAST_NAME.into(),
                columns::CITY.into(),
            ],
            vec![
                vec!["John".into(), "Smith".into(), "Mesa".into()],
                vec!["john".into(), "Doe".into(), "Mexico Hills".into()],
                vec!["John".into(), "Roe".into(), "Tucson".into()],
                vec!["Jane".into(), "Poe".into(), "Mesa".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_conditions_and_selection() {
        let q = GraphQlQuery::parse(
            r#"{ people(where: { firstName: "John", city_startsWith: "Me" }) { firstName city } }"#,
        )
        .unwrap();
        assert_eq!(
            q.conditions,
            vec![
                Condition::new("firstName", MatchOp::Equals, "John"),
                Condition::new("city", MatchOp::StartsWith, "Me"),
            ]
        );
        assert_eq!(q.selection, vec!["firstName".to_string(), "city".to_string()]);
    }

    #[test]
    fn test_parse_multiline() {
        let q = GraphQlQuery::parse(
            "{\n  people(where: {\n    firstName: \"John\"\n    city: \"Mesa\"\n  }) {\n    firstName\n    lastName\n  }\n}",
        )
        .unwrap();
        assert_eq!(q.conditions.len(), 2);
        assert_eq!(q.selection.len(), 2);
    }

    #[test]
    fn test_format_error() {
        for bad in [
            "{ people { firstName } }",
            "{ persons(where: {a: \"b\"}) { a } }",
            "{ people(where: {a: \"b\"}) }",
            "{ people(where: {a: \"b\" { a } }",
            "{ people(where: {a: \"b }) { a } }",
        ] {
            let err = GraphQlQuery::parse(bad).unwrap_err();
            assert_eq!(err.to_string(), FORMAT_ERROR, "input: {}", bad);
        }
    }

    #[test]
    fn test_empty_values_and_junk_are_ignored() {
        let q = GraphQlQuery::parse(r#"{ people(where: { a: "", 42 b: "x" c }) { a } }"#).unwrap();
        assert_eq!(q.conditions, vec![Condition::new("b", MatchOp::Equals, "x")]);
    }

    #[test]
    fn test_execute_filters_case_insensitively() {
        let ds = dataset();
        let q = GraphQlQuery::parse(
            r#"{ people(where: { firstName: "JOHN", city_startsWith: "me" }) { firstName city } }"#,
        )
        .unwrap();
        let result = q.execute(&ds);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[1][2], Value::Text("Mexico Hills".into()));
        assert_eq!(result.columns, vec![columns::FIRST_NAME.to_string(), columns::CITY.to_string()]);
    }

    #[test]
    fn test_unresolvable_fields_are_lenient() {
        let ds = dataset();
        let q = GraphQlQuery::parse(r#"{ people(where: { bogus: "x", firstName: "Jane" }) { firstName bogusField } }"#)
            .unwrap();
        let result = q.execute(&ds);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.columns, vec![columns::FIRST_NAME.to_string()]);

        let q = GraphQlQuery::parse(r#"{ people(where: {}) { nothing here } }"#).unwrap();
        let result = q.execute(&ds);
        assert_eq!(result.rows.len(), 4);
        assert_eq!(result.columns, ds.columns().to_vec());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let ds = dataset();
        let text = r#"{ people(where: { lastName_startsWith: "s" }) { lastName } }"#;
        let a = GraphQlQuery::parse(text).unwrap();
        let b = GraphQlQuery::parse(text).unwrap();
        assert_eq!(a, b);
        let (ra, rb) = (a.execute(&ds), b.execute(&ds));
        assert_eq!(ra.rows, rb.rows);
        assert_eq!(ra.columns, rb.columns);
    }
}
