//! Registration and turnout analytics over a voter dataset
//!
//! All windows are measured back from an explicit `now` date so results are
//! reproducible. Rows whose registration date is missing are left out of
//! every date-based figure but still count towards totals.

use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::types::{Dataset, Row, Value};
use ahash::AHashMap;
use chrono::{Datelike, Days, NaiveDate};
use rand::Rng;
use serde::Serialize;

/// Registrant counts over the configured windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistrationMetrics {
    pub total: usize,
    pub last_month: usize,
    pub last_year: usize,
}

/// Percent of registrants who voted
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TurnoutMetrics {
    pub overall_pct: f64,
    /// Among registrants of the last year
    pub new_registrants_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTurnout {
    pub year: i32,
    pub voted: usize,
    pub total: usize,
    pub pct: f64,
}

/// Everything the `.stats` view prints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub registrations: RegistrationMetrics,
    pub turnout: TurnoutMetrics,
    pub parties: Option<Vec<(String, usize)>>,
    pub turnout_by_year: Vec<YearTurnout>,
    pub registrations_by_month: Vec<(String, usize)>,
}

impl AnalyticsReport {
    pub fn compute(dataset: &Dataset, config: &AnalyticsConfig, now: NaiveDate) -> Self {
        Self {
            registrations: registration_metrics(dataset, config, now),
            turnout: turnout_metrics(dataset, config, now),
            parties: party_distribution(dataset, config),
            turnout_by_year: turnout_by_year(dataset, config),
            registrations_by_month: registrations_by_month(dataset, config),
        }
    }
}

/// `part / whole` as a percentage, 0 for an empty group
pub fn safe_percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// A voter status cell counts as voted for `true` (any case, surrounding
/// whitespace ignored) or a non-zero number.
pub fn has_voted(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Integer(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Text(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn days_before(now: NaiveDate, days: i64) -> NaiveDate {
    now.checked_sub_days(Days::new(days.max(0) as u64))
        .unwrap_or(NaiveDate::MIN)
}

fn registration_date(dataset: &Dataset, row: &Row, config: &AnalyticsConfig) -> Option<NaiveDate> {
    dataset
        .cell(row, &config.registration_date_col)
        .and_then(Value::as_date)
}

fn voted(dataset: &Dataset, row: &Row, config: &AnalyticsConfig) -> bool {
    dataset
        .cell(row, &config.voter_status_col)
        .map(has_voted)
        .unwrap_or(false)
}

fn registered_since<'a>(
    dataset: &'a Dataset,
    config: &'a AnalyticsConfig,
    since: NaiveDate,
) -> impl Iterator<Item = &'a Row> + 'a {
    dataset
        .rows()
        .iter()
        .filter(move |row| registration_date(dataset, row, config).map_or(false, |d| d >= since))
}

pub fn registration_metrics(dataset: &Dataset, config: &AnalyticsConfig, now: NaiveDate) -> RegistrationMetrics {
    RegistrationMetrics {
        total: dataset.len(),
        last_month: registered_since(dataset, config, days_before(now, config.month_days)).count(),
        last_year: registered_since(dataset, config, days_before(now, config.year_days)).count(),
    }
}

pub fn turnout_metrics(dataset: &Dataset, config: &AnalyticsConfig, now: NaiveDate) -> TurnoutMetrics {
    let total_voted = dataset
        .rows()
        .iter()
        .filter(|row| voted(dataset, row, config))
        .count();

    let (new_total, new_voted) = registered_since(dataset, config, days_before(now, config.year_days))
        .fold((0, 0), |(total, voters), row| {
            (total + 1, voters + usize::from(voted(dataset, row, config)))
        });

    TurnoutMetrics {
        overall_pct: safe_percentage(total_voted, dataset.len()),
        new_registrants_pct: safe_percentage(new_voted, new_total),
    }
}

/// Registrants per party, largest first; ties ordered by name.
///
/// `None` when the dataset has no party column. Empty cells are skipped.
pub fn party_distribution(dataset: &Dataset, config: &AnalyticsConfig) -> Option<Vec<(String, usize)>> {
    let values = dataset.column_values(&config.party_col)?;
    let mut counts: AHashMap<String, usize> = AHashMap::new();
    for v in values.filter(|v| !v.is_null()) {
        *counts.entry(v.to_string()).or_insert(0) += 1;
    }
    let mut parties: Vec<(String, usize)> = counts.into_iter().collect();
    parties.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Some(parties)
}

/// Turnout grouped by registration year, ascending
pub fn turnout_by_year(dataset: &Dataset, config: &AnalyticsConfig) -> Vec<YearTurnout> {
    let mut groups: AHashMap<i32, (usize, usize)> = AHashMap::new();
    for row in dataset.rows() {
        if let Some(date) = registration_date(dataset, row, config) {
            let entry = groups.entry(date.year()).or_insert((0, 0));
            entry.0 += usize::from(voted(dataset, row, config));
            entry.1 += 1;
        }
    }
    let mut years: Vec<YearTurnout> = groups
        .into_iter()
        .map(|(year, (voted, total))| YearTurnout {
            year,
            voted,
            total,
            pct: safe_percentage(voted, total),
        })
        .collect();
    years.sort_by_key(|y| y.year);
    years
}

/// Registrations per `YYYY-MM` month, ascending
pub fn registrations_by_month(dataset: &Dataset, config: &AnalyticsConfig) -> Vec<(String, usize)> {
    let mut counts: AHashMap<String, usize> = AHashMap::new();
    for row in dataset.rows() {
        if let Some(date) = registration_date(dataset, row, config) {
            *counts.entry(date.format("%Y-%m").to_string()).or_insert(0) += 1;
        }
    }
    let mut months: Vec<(String, usize)> = counts.into_iter().collect();
    months.sort();
    months
}

/// Ensure a registration date column exists.
///
/// When the dataset has none, every row gets a random date within the last
/// `backfill_years` years. An existing column is left untouched.
pub fn backfill_registration_dates<R: Rng>(
    dataset: Dataset,
    config: &AnalyticsConfig,
    now: NaiveDate,
    rng: &mut R,
) -> Result<Dataset> {
    if dataset.has_column(&config.registration_date_col) {
        return Ok(dataset);
    }

    let span = (config.backfill_years.max(0) * 365) as u64;
    let dates: Vec<Value> = (0..dataset.len())
        .map(|_| Value::Date(days_before(now, rng.gen_range(0..=span) as i64)))
        .collect();
    tracing::info!(
        column = %config.registration_date_col,
        rows = dates.len(),
        "registration date column missing, back-filled with random dates"
    );
    dataset.with_column(&config.registration_date_col, dates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::columns;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> NaiveDate {
        date(2024, 6, 30)
    }

    fn voters() -> Dataset {
        let row = |reg: Value, status: Value, party: Value| -> Row { vec![reg, status, party] };
        Dataset::new(
            vec![
                columns::REGISTRATION_DATE.into(),
                columns::VOTER_STATUS.into(),
                columns::PARTY.into(),
            ],
            vec![
                row(date(2024, 6, 15).into(), true.into(), "DEM".into()),
                row(date(2024, 1, 10).into(), "false".into(), "REP".into()),
                row(date(2024, 1, 20).into(), " TRUE ".into(), "REP".into()),
                row(date(2020, 3, 1).into(), true.into(), "IND".into()),
                row(Value::Null, false.into(), Value::Null),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_registration_metrics() {
        let m = registration_metrics(&voters(), &AnalyticsConfig::default(), now());
        assert_eq!(
            m,
            RegistrationMetrics {
                total: 5,
                last_month: 1,
                last_year: 3
            }
        );
    }

    #[test]
    fn test_turnout_metrics() {
        let t = turnout_metrics(&voters(), &AnalyticsConfig::default(), now());
        assert!((t.overall_pct - 60.0).abs() < 1e-9);
        assert!((t.new_registrants_pct - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_turnout_with_no_new_registrants() {
        let t = turnout_metrics(&voters(), &AnalyticsConfig::default(), date(2030, 1, 1));
        assert_eq!(t.new_registrants_pct, 0.0);
        assert_eq!(turnout_metrics(&Dataset::empty(), &AnalyticsConfig::default(), now()).overall_pct, 0.0);
    }

    #[test]
    fn test_has_voted() {
        assert!(has_voted(&Value::Bool(true)));
        assert!(has_voted(&Value::from(" True")));
        assert!(!has_voted(&Value::from("yes")));
        assert!(has_voted(&Value::Integer(1)));
        assert!(!has_voted(&Value::Integer(0)));
        assert!(has_voted(&Value::Float(1.0)));
        assert!(!has_voted(&Value::Float(0.0)));
        assert!(!has_voted(&Value::Null));
    }

    #[test]
    fn test_numeric_voter_status_from_csv() {
        let csv = "Voter Status,Registration Date\n1,01/15/2024\n0,2024-02-01\n";
        let ds = Dataset::from_csv_reader(csv.as_bytes()).unwrap();
        let t = turnout_metrics(&ds, &AnalyticsConfig::default(), now());
        assert!((t.overall_pct - 50.0).abs() < 1e-9);
        assert!((t.new_registrants_pct - 50.0).abs() < 1e-9);
        assert_eq!(
            registrations_by_month(&ds, &AnalyticsConfig::default()),
            vec![("2024-01".to_string(), 1), ("2024-02".to_string(), 1)]
        );
    }

    #[test]
    fn test_party_distribution() {
        let parties = party_distribution(&voters(), &AnalyticsConfig::default()).unwrap();
        assert_eq!(
            parties,
            vec![("REP".to_string(), 2), ("DEM".to_string(), 1), ("IND".to_string(), 1)]
        );

        let no_party = Dataset::new(vec!["x".into()], vec![]).unwrap();
        assert!(party_distribution(&no_party, &AnalyticsConfig::default()).is_none());
    }

    #[test]
    fn test_turnout_by_year() {
        let years = turnout_by_year(&voters(), &AnalyticsConfig::default());
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2020);
        assert_eq!((years[0].voted, years[0].total), (1, 1));
        assert_eq!(years[1].year, 2024);
        assert_eq!((years[1].voted, years[1].total), (2, 3));
    }

    #[test]
    fn test_registrations_by_month() {
        assert_eq!(
            registrations_by_month(&voters(), &AnalyticsConfig::default()),
            vec![
                ("2020-03".to_string(), 1),
                ("2024-01".to_string(), 2),
                ("2024-06".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_backfill_only_when_missing() {
        let config = AnalyticsConfig::default();
        let mut rng = StdRng::seed_from_u64(7);

        let existing = backfill_registration_dates(voters(), &config, now(), &mut rng).unwrap();
        assert_eq!(existing.rows(), voters().rows());

        let ds = Dataset::new(
            vec![columns::VOTER_STATUS.into()],
            vec![vec![true.into()]; 50],
        )
        .unwrap();
        let filled = backfill_registration_dates(ds, &config, now(), &mut rng).unwrap();
        let earliest = date(2019, 7, 2);
        for v in filled.column_values(columns::REGISTRATION_DATE).unwrap() {
            let d = v.as_date().unwrap();
            assert!(d <= now() && d >= earliest, "{} out of range", d);
        }
    }

    #[test]
    fn test_report() {
        let report = AnalyticsReport::compute(&voters(), &AnalyticsConfig::default(), now());
        assert_eq!(report.registrations.total, 5);
        assert_eq!(report.turnout_by_year.len(), 2);
        assert!(report.parties.is_some());
    }
}
