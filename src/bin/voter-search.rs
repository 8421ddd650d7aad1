//! voter-search - interactive search shell over a voter CSV
//!
//! Every non-command line is one submission: free text, a `{ people ... }`
//! GraphQL query or a `SELECT ... FROM people` SQL query.

use anyhow::{bail, Context};
use chrono::Local;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use votersearch::analytics::{backfill_registration_dates, AnalyticsReport};
use votersearch::map::{MapStyle, MapView};
use votersearch::query::PROMPT;
use votersearch::schema::GRAPHQL_ALIASES;
use votersearch::{Dataset, SearchConfig, SearchEngine, SearchOutcome, Value};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const MAX_CELL_WIDTH: usize = 40;

struct Args {
    csv: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = match parse_args(env::args().skip(1))? {
        Some(args) => args,
        None => return Ok(()),
    };

    let mut config = match &args.config {
        Some(path) => SearchConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SearchConfig::default(),
    };
    if let Some(csv) = args.csv {
        config.dataset_path = csv;
    }

    let dataset = Dataset::load_or_empty(&config.dataset_path);
    interactive_mode(&dataset, &config)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Option<Args>> {
    let mut parsed = Args { csv: None, config: None };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            "--version" | "-v" => {
                println!("voter-search v{}", VERSION);
                return Ok(None);
            }
            "--config" | "-c" => match args.next() {
                Some(path) => parsed.config = Some(PathBuf::from(path)),
                None => bail!("--config needs a file argument"),
            },
            flag if flag.starts_with('-') => {
                print_help();
                bail!("unknown option: {}", flag);
            }
            path if parsed.csv.is_none() => parsed.csv = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument: {}", extra),
        }
    }
    Ok(Some(parsed))
}

fn print_help() {
    println!(
        r#"
voter-search v{} - search a voter registration CSV

Usage:
  voter-search                       open ./macrodata.csv
  voter-search <file.csv>            open the given CSV
  voter-search --config <file.json>  load settings from JSON
  voter-search --version | --help
"#,
        VERSION
    );
}

fn print_interactive_help() {
    println!(
        r#"
Queries:
  john mesa                                        free text, every word must match
  {{ people(where: {{city: "Mesa"}}) {{ firstName }} }}   GraphQL subset
  SELECT firstName FROM people WHERE city LIKE 'Me%' LIMIT 5
                                                   SQL subset

Commands:
  .help            show this help
  .columns         list dataset columns with their query names
  .stats           registration and turnout summary
  .map [style]     plan a map view of the geocoded file (default, street, satellite)
  .exit / .quit    leave the shell
"#
    );
}

fn interactive_mode(dataset: &Dataset, config: &SearchConfig) -> anyhow::Result<()> {
    let engine = SearchEngine::new(dataset);

    println!("voter-search v{}", VERSION);
    println!(
        "Dataset: {} ({} rows, {} columns)",
        config.dataset_path.display(),
        dataset.len(),
        dataset.columns().len()
    );
    println!("Type '.help' for help, '.exit' to quit\n");

    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        print!("search> ");
        io::stdout().flush()?;

        buffer.clear();
        if stdin.lock().read_line(&mut buffer)? == 0 {
            break;
        }
        let input = buffer.trim();

        if input.starts_with('.') {
            let mut parts = input.splitn(2, char::is_whitespace);
            match (parts.next().unwrap_or(""), parts.next().map(str::trim)) {
                (".exit" | ".quit", _) => break,
                (".help", _) => print_interactive_help(),
                (".columns", _) => {
                    for (i, col) in dataset.columns().iter().enumerate() {
                        match GRAPHQL_ALIASES.alias_for(col) {
                            Some(alias) => println!("  {:>3}  {:<40} {}", i + 1, col, alias),
                            None => println!("  {:>3}  {}", i + 1, col),
                        }
                    }
                }
                (".stats", _) => show_stats(dataset, config),
                (".map", style) => show_map(config, style.unwrap_or("default")),
                _ => {
                    eprintln!("Unknown command: {}", input);
                    println!("Type '.help' for available commands");
                }
            }
            continue;
        }

        match engine.search(input) {
            SearchOutcome::Prompt => println!("{}", PROMPT),
            SearchOutcome::Error(msg) => eprintln!("Error: {}", msg),
            SearchOutcome::Results { kind, result } => {
                for warning in &result.warnings {
                    eprintln!("Warning: {}", warning);
                }
                let rows = result.project(dataset);
                display_table(&result.columns, &rows);
                println!("{} query: {} row(s)", kind, result.len());
            }
        }
    }

    Ok(())
}

fn show_stats(dataset: &Dataset, config: &SearchConfig) {
    let today = Local::now().date_naive();
    let dataset = match backfill_registration_dates(dataset.clone(), &config.analytics, today, &mut rand::thread_rng()) {
        Ok(ds) => ds,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    let report = AnalyticsReport::compute(&dataset, &config.analytics, today);

    let r = report.registrations;
    println!("Registrants (last month): {}", r.last_month);
    println!("Registrants (last year):  {}", r.last_year);
    println!("Total registrants:        {}", r.total);
    println!("All registrants voted:    {:.1}%", report.turnout.overall_pct);
    println!("New registrants voted:    {:.1}%", report.turnout.new_registrants_pct);

    if let Some(parties) = &report.parties {
        println!("\nParty distribution:");
        for (party, count) in parties {
            println!("  {:<20} {}", party, count);
        }
    }

    println!("\nTurnout by registration year:");
    for y in &report.turnout_by_year {
        println!("  {}  {:>5.1}%  ({}/{})", y.year, y.pct, y.voted, y.total);
    }

    println!("\nRegistrations per month:");
    for (month, count) in &report.registrations_by_month {
        println!("  {}  {}", month, count);
    }
}

fn show_map(config: &SearchConfig, style: &str) {
    let style = match style.parse::<MapStyle>() {
        Ok(style) => style,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    let geocoded = Dataset::load_or_empty(&config.map_dataset_path);
    if geocoded.is_empty() {
        eprintln!("No data available in {}.", config.map_dataset_path.display());
        return;
    }
    let plan = MapView::plan(&geocoded, &config.map, style);
    match plan {
        Ok(view) => println!(
            "Centre {:.5}, {:.5}  zoom {}  pitch {}  {} point(s)\nLayer {:?}\nStyle {}",
            view.center.lat,
            view.center.lon,
            view.zoom,
            view.pitch,
            view.points,
            view.layer,
            view.style.as_deref().unwrap_or("default")
        ),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn cell_text(value: &Value) -> String {
    let s = value.to_string();
    if s.chars().count() > MAX_CELL_WIDTH {
        let cut: String = s.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{}...", cut)
    } else {
        s
    }
}

fn display_table(columns: &[String], rows: &[Vec<&Value>]) {
    if rows.is_empty() {
        println!("No results");
        return;
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|v| cell_text(v)).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (i, s) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(s.chars().count());
            }
        }
    }

    print_rule(&widths, '┌', '┬', '┐');
    print_row(columns, &widths);
    print_rule(&widths, '├', '┼', '┤');
    for row in &cells {
        print_row(row, &widths);
    }
    print_rule(&widths, '└', '┴', '┘');
}

fn print_rule(widths: &[usize], left: char, mid: char, right: char) {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    println!("{}{}{}", left, segments.join(&mid.to_string()), right);
}

fn print_row(cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let s = cells.get(i).map(String::as_str).unwrap_or("");
            let pad = w.saturating_sub(s.chars().count());
            format!(" {}{} ", s, " ".repeat(pad))
        })
        .collect();
    println!("│{}│", padded.join("│"));
}
