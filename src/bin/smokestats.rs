/// SmokeStats command line
///
/// Loads a smoking statistics CSV, applies a year/country selection and
/// prints the dashboard snapshot as text or JSON.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use smokestats::{
    cache, filter, ChartPayload, DashboardConfig, DashboardSnapshot, Dataset, FilterSelection,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Charts,
}

#[derive(Debug, Parser)]
#[command(name = "smokestats", version, about = "Global smoking statistics dashboard data")]
struct Cli {
    /// CSV file to load [default: $SMOKESTATS_DATA or smoking.csv]
    #[arg(long)]
    data: Option<PathBuf>,

    /// Year to include (repeatable); all years when omitted
    #[arg(long = "year", value_name = "YEAR")]
    years: Vec<i32>,

    /// Select no years, producing an empty dashboard
    #[arg(long, conflicts_with = "years")]
    no_years: bool,

    /// Country to include (repeatable); all countries when omitted
    #[arg(long = "country", value_name = "COUNTRY")]
    countries: Vec<String>,

    /// Select no countries, producing an empty dashboard
    #[arg(long, conflicts_with = "countries")]
    no_countries: bool,

    /// Number of countries in the top chart [default: $SMOKESTATS_TOP_N or 10]
    #[arg(long)]
    top: Option<usize>,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print the available years and countries and exit
    #[arg(long)]
    list_options: bool,
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    let mut config = DashboardConfig::from_env()?;
    if let Some(path) = cli.data.clone() {
        config.data_path = path;
    }
    if let Some(top) = cli.top {
        config.top_n = top;
    }

    let dataset = cache::shared_cache()
        .load_with_layout(&config.data_path, config.layout.clone())
        .with_context(|| format!("failed to load {}", config.data_path.display()))?;

    if cli.list_options {
        print_options(&dataset);
        return Ok(());
    }

    let selection = selection_from_cli(&cli, &dataset);
    info!(
        "selected {} year(s), {} country(ies)",
        selection.years.len(),
        selection.countries.len()
    );

    let view = filter(&dataset, &selection);
    let snapshot = DashboardSnapshot::compute(&view, config.top_n);

    match cli.format {
        OutputFormat::Text => print_text(&snapshot),
        OutputFormat::Json => println!("{}", snapshot.to_json()?),
        OutputFormat::Charts => println!("{}", serde_json::to_string_pretty(&snapshot.charts())?),
    }

    Ok(())
}

/// Omitted filters default to every value, like the dashboard sidebar.
fn selection_from_cli(cli: &Cli, dataset: &Dataset) -> FilterSelection {
    let years = if cli.no_years {
        Some(Vec::new())
    } else if cli.years.is_empty() {
        None
    } else {
        Some(cli.years.clone())
    };
    let countries = if cli.no_countries {
        Some(Vec::new())
    } else if cli.countries.is_empty() {
        None
    } else {
        Some(cli.countries.clone())
    };
    FilterSelection::from_choices(dataset, years, countries)
}

fn print_options(dataset: &Dataset) {
    println!("Columns: {}", dataset.schema().get_column_names().join(", "));
    let years: Vec<String> = dataset.years().iter().map(|y| y.to_string()).collect();
    println!("Years: {}", years.join(", "));
    println!("Countries: {}", dataset.countries().join(", "));
}

fn print_text(snapshot: &DashboardSnapshot) {
    println!("Global Smoking Statistics");
    println!("====================================");
    println!("Records:              {}", snapshot.kpis.records);
    println!("Countries:            {}", snapshot.kpis.countries);
    println!("Avg Smoking Rate (%): {}", snapshot.kpis.mean_rate_label());

    if snapshot.is_empty() {
        println!();
        println!("No data for the current selection.");
        return;
    }

    for chart in snapshot.charts() {
        println!();
        match chart {
            ChartPayload::Bar { title, rows, .. } => {
                println!("{}", title);
                for r in rows {
                    println!("  {:<32} {:>6.2}", r.country, r.rate);
                }
            }
            ChartPayload::Box { title, rows, .. } => {
                println!("{}", title);
                let mut labels: Vec<&str> = Vec::new();
                for r in &rows {
                    if !labels.contains(&r.gender.as_str()) {
                        labels.push(&r.gender);
                    }
                }
                for label in labels {
                    let rates: Vec<f64> = rows
                        .iter()
                        .filter(|r| r.gender == label)
                        .filter_map(|r| r.rate)
                        .collect();
                    let lo = rates.iter().copied().reduce(f64::min);
                    let hi = rates.iter().copied().reduce(f64::max);
                    match lo.zip(hi) {
                        Some((lo, hi)) => println!(
                            "  {:<8} n={:<6} min {:>6.2}  max {:>6.2}",
                            label,
                            rates.len(),
                            lo,
                            hi
                        ),
                        None => println!("  {:<8} n=0", label),
                    }
                }
            }
            ChartPayload::Line { title, rows, .. } => {
                println!("{}", title);
                for r in rows {
                    println!("  {}  {:>6.2}", r.year, r.rate);
                }
            }
            ChartPayload::Choropleth { title, rows, .. } => {
                println!("{} ({} countries)", title, rows.len());
            }
            ChartPayload::Info { message } => println!("{}", message),
        }
    }
}
