//! Address cleaning and the coarsening fallback chain

use crate::schema::columns;
use crate::types::{Dataset, Row, Value};

/// Format a zip cell as a 5-digit string.
///
/// Numeric text (including "85201.0" and scientific notation) is accepted;
/// anything else yields an empty string.
pub fn clean_zip_code(value: &Value) -> String {
    let n = match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(f) if f.is_finite() && f >= 0.0 => format!("{:05}", f.trunc() as i64),
        _ => String::new(),
    }
}

/// Trimmed component text; missing or "nan" cells become empty
pub fn clean_component(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(v) => {
            let s = v.to_string();
            let s = s.trim();
            if s.eq_ignore_ascii_case("nan") {
                String::new()
            } else {
                s.to_string()
            }
        }
    }
}

/// Cleaned address pieces of one row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressParts {
    pub street: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl AddressParts {
    pub fn from_row(dataset: &Dataset, row: &Row) -> Self {
        let get = |col: &str| dataset.cell(row, col);
        Self {
            street: clean_component(get(columns::ADDRESS)),
            street2: clean_component(get(columns::ADDRESS_LINE_2)),
            city: clean_component(get(columns::CITY)),
            state: clean_component(get(columns::STATE)),
            zip: get(columns::ZIP).map(clean_zip_code).unwrap_or_default(),
        }
    }

    /// Addresses to try, most precise first:
    /// full address, street + city, city only, zip only.
    ///
    /// Empty when the zip code is unusable.
    pub fn variants(&self, country: &str) -> Vec<String> {
        if self.zip.is_empty() {
            return Vec::new();
        }

        let mut out = vec![join(&[
            &self.street,
            &self.street2,
            &self.city,
            &self.state,
            &self.zip,
            country,
        ])];
        if !self.street.is_empty() && !self.city.is_empty() {
            out.push(join(&[&self.street, &self.city, &self.state, &self.zip, country]));
        }
        if !self.city.is_empty() {
            out.push(join(&[&self.city, &self.state, &self.zip, country]));
        }
        out.push(join(&[&self.zip, &self.state, country]));
        out
    }
}

fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_zip_code() {
        assert_eq!(clean_zip_code(&Value::Integer(85201)), "85201");
        assert_eq!(clean_zip_code(&Value::Integer(2134)), "02134");
        assert_eq!(clean_zip_code(&Value::Float(85201.0)), "85201");
        assert_eq!(clean_zip_code(&Value::Text("8.5201e4".into())), "85201");
        assert_eq!(clean_zip_code(&Value::Text("85201-1234".into())), "");
        assert_eq!(clean_zip_code(&Value::Text("nan".into())), "");
        assert_eq!(clean_zip_code(&Value::Null), "");
    }

    #[test]
    fn test_clean_component() {
        assert_eq!(clean_component(None), "");
        assert_eq!(clean_component(Some(&Value::Null)), "");
        assert_eq!(clean_component(Some(&Value::Text(" NaN ".into()))), "");
        assert_eq!(clean_component(Some(&Value::Text(" 12 Main St ".into()))), "12 Main St");
        assert_eq!(clean_component(Some(&Value::Integer(4))), "4");
    }

    #[test]
    fn test_variants_order() {
        let parts = AddressParts {
            street: "12 Main St".into(),
            street2: "Apt 4".into(),
            city: "Mesa".into(),
            state: "AZ".into(),
            zip: "85201".into(),
        };
        assert_eq!(
            parts.variants("USA"),
            vec![
                "12 Main St, Apt 4, Mesa, AZ, 85201, USA".to_string(),
                "12 Main St, Mesa, AZ, 85201, USA".to_string(),
                "Mesa, AZ, 85201, USA".to_string(),
                "85201, AZ, USA".to_string(),
            ]
        );
    }

    #[test]
    fn test_variants_skip_missing_pieces() {
        let parts = AddressParts {
            state: "AZ".into(),
            zip: "85201".into(),
            ..Default::default()
        };
        assert_eq!(
            parts.variants("USA"),
            vec!["AZ, 85201, USA".to_string(), "85201, AZ, USA".to_string()]
        );

        let no_zip = AddressParts {
            city: "Mesa".into(),
            ..Default::default()
        };
        assert!(no_zip.variants("USA").is_empty());
    }

    #[test]
    fn test_from_row() {
        let ds = Dataset::new(
            vec![columns::ADDRESS.into(), columns::CITY.into(), columns::ZIP.into()],
            vec![vec!["1 A St".into(), "nan".into(), Value::Float(85004.0)]],
        )
        .unwrap();
        let parts = AddressParts::from_row(&ds, &ds.rows()[0]);
        assert_eq!(parts.street, "1 A St");
        assert_eq!(parts.city, "");
        assert_eq!(parts.state, "");
        assert_eq!(parts.zip, "85004");
    }
}
