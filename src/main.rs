// Entry point and high-level CLI flow.
//
// - `metrics` loads the export and lists locations with their metrics.
// - `pivot` prints one metric as a grouped month table.
// - `export` writes the same table to CSV and JSON files.
//
// The dataset is loaded once per invocation; a failed load is the only error
// the user sees.
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use studio_metrics::config::Config;
use studio_metrics::error::Error;
use studio_metrics::loader::{self, Dataset};
use studio_metrics::output::{self, LocationRow};
use studio_metrics::reports::{self, Selection};
use studio_metrics::types::{Dimension, Schema};
use studio_metrics::util::format_int;
use studio_metrics::views::ViewMode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "studio-metrics",
    about = "Studio performance metrics as grouped month/quarter/year pivot tables"
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "studio-metrics.toml")]
    config: PathBuf,

    /// CSV path or http(s) URL; overrides the config
    #[arg(short, long, global = true)]
    source: Option<String>,

    /// Column layout of the export: package or trainer
    #[arg(long, global = true)]
    schema: Option<Schema>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List locations and the metrics recorded for each
    Metrics,

    /// Print a pivot table for one metric
    Pivot(PivotArgs),

    /// Write a pivot table to CSV and JSON
    Export {
        #[command(flatten)]
        pivot: PivotArgs,

        /// Directory the files are written to
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Args)]
struct PivotArgs {
    /// Metric name, matched exactly (e.g. "Gross Sales")
    metric: String,

    /// Dimension to group rows by; defaults to the layout's main one
    #[arg(short, long)]
    by: Option<Dimension>,

    /// chronological, year-on-year, quarterly or comparative
    #[arg(short, long, default_value = "chronological")]
    view: ViewMode,

    /// Only rows of this location
    #[arg(short, long)]
    location: Option<String>,

    /// Groups to show expanded (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    expand: Vec<String>,

    /// Expand every group
    #[arg(long)]
    expand_all: bool,
}

impl PivotArgs {
    fn selection(&self, schema: Schema) -> Selection {
        let dimension = self.by.unwrap_or(schema.default_dimension());
        if !schema.dimensions().contains(&dimension) {
            warn!(%dimension, "this layout has no such column; every row lands in one group");
        }
        let mut selection = Selection::new(&self.metric, dimension);
        selection.view = self.view;
        selection.location = self.location.clone();
        selection.expanded = self.expand.iter().cloned().collect();
        selection.expand_all = self.expand_all;
        selection
    }
}

fn load_dataset(cli: &Cli, config: &Config) -> Result<Dataset> {
    let source = cli.source.as_deref().unwrap_or(&config.source);
    let schema = cli.schema.unwrap_or(config.schema);
    let settings = config.catalog_settings()?;
    let (dataset, report) = loader::load(source, schema, &settings)
        .with_context(|| format!("Failed to load metrics data from {source}"))?;
    info!(
        "{} rows loaded ({} padded)",
        format_int(report.total_rows),
        format_int(report.short_rows)
    );
    Ok(dataset)
}

fn handle_metrics(dataset: &Dataset, config: &Config) {
    let rows: Vec<LocationRow> = reports::location_summaries(dataset)
        .iter()
        .map(|s| LocationRow::new(config.display_name(&s.location), s.rows, &s.metrics))
        .collect();
    println!("{} Locations\n", rows.len());
    println!("{}", output::preview_table_rows(&rows, rows.len()));
}

fn build_table(dataset: &Dataset, config: &Config, args: &PivotArgs) -> Result<reports::PivotTable> {
    let selection = args.selection(dataset.schema);
    let table = reports::build_pivot(dataset, &config.policies(), &selection);
    if table.is_empty() {
        return Err(Error::UnknownMetric(args.metric.clone()).into());
    }
    Ok(table)
}

fn handle_export(dataset: &Dataset, config: &Config, args: &PivotArgs, out_dir: &Path) -> Result<()> {
    let table = build_table(dataset, config, args)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let stem = file_stem(&args.metric, table.view);
    let csv_path = out_dir.join(format!("{stem}.csv"));
    let json_path = out_dir.join(format!("{stem}.json"));
    output::write_pivot_csv(&csv_path, &table)?;
    output::write_json(&json_path, &table)?;
    println!("(Full table exported to {} and {})", csv_path.display(), json_path.display());
    Ok(())
}

fn file_stem(metric: &str, view: ViewMode) -> String {
    let slug: String = metric
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let view = view.to_string().to_lowercase().replace(' ', "_");
    format!("{slug}_{view}")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("studio_metrics=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;
    let dataset = load_dataset(&cli, &config)?;

    match &cli.command {
        Command::Metrics => handle_metrics(&dataset, &config),
        Command::Pivot(args) => {
            let table = build_table(&dataset, &config, args)?;
            print!("{}", output::render_pivot(&table));
        }
        Command::Export { pivot, out_dir } => handle_export(&dataset, &config, pivot, out_dir)?,
    }
    Ok(())
}
