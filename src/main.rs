use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

mod chart;
mod error;
mod model;
mod render;
mod series;
mod table;

use chart::ChartConfig;
use series::{SeriesBuilder, TimeSeries, Window, WindowPolicy};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "perf-series")]
#[command(about = "Smoothed benchmark timing charts per operation and dataset", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

/// Series selection shared by `report` and `series`. Flags override the chart config.
#[derive(clap::Args)]
struct Selection {
    /// Benchmark table (.csv, .tsv, .json records or an .xlsx workbook).
    #[arg(long)]
    data: PathBuf,

    /// Worksheet to read from a workbook. Defaults to "data".
    #[arg(long)]
    sheet: Option<String>,

    /// Chart config (charts.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only rows with this classifier take part.
    #[arg(long)]
    classifier: Option<String>,

    /// Smoothing window width. Required here or in the config.
    #[arg(long)]
    window: Option<usize>,

    /// Where each window's mean is placed.
    #[arg(long, value_enum)]
    window_policy: Option<WindowPolicy>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one chart document per operation.
    Report {
        #[command(flatten)]
        selection: Selection,

        /// Datasets to plot, in legend order (repeatable).
        #[arg(long = "dataset")]
        datasets: Vec<String>,

        /// Operations to plot (repeatable). Defaults to all.
        #[arg(long = "operation")]
        operations: Vec<String>,

        /// Abort on the first (operation, dataset) pair without rows instead of skipping it.
        #[arg(long)]
        strict: bool,

        #[arg(short = 'o', long)]
        out: PathBuf,
    },

    /// Print one smoothed series as JSON.
    Series {
        #[command(flatten)]
        selection: Selection,

        #[arg(long)]
        operation: String,

        #[arg(long)]
        dataset: String,
    },

    /// List datasets, classifiers and operations in a table with row counts.
    Inspect {
        #[arg(long)]
        data: PathBuf,

        #[arg(long)]
        sheet: Option<String>,
    },
}

/// Settings after merging flags over the chart config.
#[derive(Debug)]
struct Resolved {
    config: ChartConfig,
    classifier: String,
    window: Window,
}

impl Selection {
    fn resolve(&self) -> Result<Resolved> {
        let config = match &self.config {
            Some(path) => ChartConfig::from_file(path)?,
            None => ChartConfig::default(),
        };
        merge_settings(
            self.classifier.clone(),
            self.window,
            self.window_policy,
            config,
        )
    }
}

/// Command-line values win; the chart config fills the gaps.
fn merge_settings(
    classifier: Option<String>,
    window: Option<usize>,
    window_policy: Option<WindowPolicy>,
    config: ChartConfig,
) -> Result<Resolved> {
    let Some(classifier) = classifier.or_else(|| config.classifier.clone()) else {
        anyhow::bail!("no classifier given: pass --classifier or set \"classifier\" in the chart config");
    };
    let Some(size) = window.or(config.window) else {
        anyhow::bail!("no window size given: pass --window or set \"window\" in the chart config");
    };
    let policy = window_policy.or(config.window_policy).unwrap_or_default();
    let window = Window::new(size, policy)?;

    Ok(Resolved {
        config,
        classifier,
        window,
    })
}

#[derive(Serialize)]
struct SeriesOutput<'a> {
    operation: &'a str,
    dataset: &'a str,
    classifier: &'a str,
    window: usize,
    window_policy: WindowPolicy,
    #[serde(flatten)]
    series: TimeSeries,
}

fn load_table(path: &Path, sheet: Option<&str>) -> Result<table::RawTable> {
    let table = table::load_file(path, sheet)?;
    log::info!("loaded {} observations from {}", table.len(), path.display());
    Ok(table)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Report {
            selection,
            datasets,
            operations,
            strict,
            out,
        } => {
            // 1) Resolve settings (flags over chart config).
            let Resolved {
                mut config,
                classifier,
                window,
            } = selection.resolve()?;

            // Datasets given on the command line replace the config's list but keep its labels.
            if !datasets.is_empty() {
                config.select_datasets(&datasets)?;
            }
            let skip_missing = !strict && config.skip_missing.unwrap_or(true);

            // 2) Load table.
            let table = load_table(&selection.data, selection.sheet.as_deref())?;

            // 3) Build series.
            let mut builder = SeriesBuilder::new(&table, classifier.as_str(), window);
            if let Some(names) = config.dataset_names() {
                builder = builder.datasets(names);
            }
            if !operations.is_empty() {
                builder = builder.operations(operations);
            }
            log::info!(
                "building series: classifier={} window={} policy={:?}",
                classifier,
                window.size(),
                window.policy()
            );

            let series = if skip_missing {
                let built = builder.build_lenient()?;
                for (key, err) in &built.skipped {
                    log::warn!("skipping {} / {}: {}", key.operation, key.dataset, err);
                }
                built.series
            } else {
                builder.build()?
            };
            if series.is_empty() {
                anyhow::bail!("no series to plot for classifier '{}'", classifier);
            }

            // 4) Render charts.
            let charts = model::build_chart_views(&series, &config)?;
            let written = render::write_charts(&charts, &out)?;
            println!("Wrote {} chart(s) to {}", written.len(), out.display());
        }

        Commands::Series {
            selection,
            operation,
            dataset,
        } => {
            let Resolved {
                classifier, window, ..
            } = selection.resolve()?;
            let table = load_table(&selection.data, selection.sheet.as_deref())?;

            let series = SeriesBuilder::new(&table, classifier.as_str(), window)
                .build_one(&operation, &dataset)?;

            let output = SeriesOutput {
                operation: &operation,
                dataset: &dataset,
                classifier: &classifier,
                window: window.size(),
                window_policy: window.policy(),
                series,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Inspect { data, sheet } => {
            let table = load_table(&data, sheet.as_deref())?;
            for (heading, counts) in [
                ("datasets", table.datasets()),
                ("classifiers", table.classifiers()),
                ("operations", table.operations()),
            ] {
                println!("{}:", heading);
                for (name, rows) in counts {
                    println!("  {:<40} {:>8}", name, rows);
                }
            }
        }
    }

    Ok(())
}
