#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `area_map`: load the London area datasets, filter them, and export the
//! map data.
//!
//! Run without a subcommand for the interactive explorer. Uses
//! `indicatif-log-bridge` (via [`area_map_cli_utils::init_logger`]) so log
//! output and the download progress bar share the terminal cleanly.

mod interactive;
mod report;

use std::path::PathBuf;

use area_map_analysis::Session;
use area_map_area_models::{FilterSettings, IncomeThreshold, PriceThreshold};
use area_map_cli_utils::CensusProgress;
use area_map_presentation::{LayerVisibility, present, write_export};
use area_map_source::DatasetConfig;
use area_map_source::paths;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "area_map", about = "London area ethnicity, income, and house price map data")]
struct Cli {
    /// Dataset layout TOML overriding the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the input files (defaults to `data/` in the project root)
    #[arg(long, env = "AREA_MAP_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify that every input file is present
    Check,
    /// Download the census ethnicity counts from the ONS API
    FetchCensus {
        /// Output CSV path (defaults to the ethnicity file in the data directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Load the data and print statistics and the number of matching areas
    Summary {
        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
    /// Write `areas.geojson` and `layers.json` for a map renderer
    Export {
        #[command(flatten)]
        thresholds: ThresholdArgs,
        /// Directory to write into
        #[arg(long)]
        out_dir: PathBuf,
    },
}

#[derive(Args, Clone, Copy, Debug, Default)]
struct ThresholdArgs {
    /// Minimum group share in percent (e.g. 15)
    #[arg(long, value_parser = parse_percent)]
    min_share: Option<f64>,
    /// Minimum income in pounds (default: the dataset mean)
    #[arg(long)]
    min_income: Option<f64>,
    /// Maximum house price in pounds (default: the configured percentile)
    #[arg(long)]
    max_price: Option<f64>,
}

impl ThresholdArgs {
    fn settings(&self, default_share: f64) -> FilterSettings {
        FilterSettings {
            min_group_share: self.min_share.map_or(default_share, |pct| pct / 100.0),
            income: self
                .min_income
                .map_or(IncomeThreshold::AboveMean, IncomeThreshold::Custom),
            price: self
                .max_price
                .map_or(PriceThreshold::BelowPercentile, PriceThreshold::Custom),
        }
    }
}

/// Parses a percentage in `[0, 100]`.
fn parse_percent(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|e| format!("'{raw}' is not a number: {e}"))?;
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside 0-100"))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = area_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DatasetConfig::load(path)?,
        None => DatasetConfig::default(),
    };
    let data_dir = cli.data_dir.unwrap_or_else(paths::data_dir);
    log::debug!("Data directory: {}", data_dir.display());
    let mut session = Session::new(config, data_dir);

    let Some(command) = cli.command else {
        return interactive::run(&mut session);
    };

    match command {
        Commands::Check => {
            let inputs = session.check_inputs()?;
            println!("All input files present in {}", session.data_dir().display());
            for path in [&inputs.boundaries, &inputs.income, &inputs.ethnicity, &inputs.housing] {
                println!("  {}", path.display());
            }
        }
        Commands::FetchCensus { output } => {
            let config = session.config();
            let output = output.unwrap_or_else(|| session.data_dir().join(&config.files.ethnicity));
            let progress = CensusProgress::attach(&multi, "Fetching census observations");
            let rows = area_map_source::census::download(
                &config.census_api,
                &config.ethnicity,
                &output,
                &progress,
            )
            .await?;
            println!("Wrote {rows} rows to {}", output.display());
        }
        Commands::Summary { thresholds } => {
            let settings = thresholds.settings(session.config().filters.default_min_group_share);
            let data = session.load()?;
            let criteria = settings.resolve(&data.stats);
            let presentation = present(&data.table, &data.stats, &criteria, &LayerVisibility::default());

            report::print_load(data);
            report::print_criteria(&criteria, &settings);
            report::print_matches(&data.table, &presentation.mask, report::MATCH_LIST_LIMIT);
        }
        Commands::Export {
            thresholds,
            out_dir,
        } => {
            let settings = thresholds.settings(session.config().filters.default_min_group_share);
            let map = session.config().map.clone();
            let data = session.load()?;
            let criteria = settings.resolve(&data.stats);
            let presentation = present(&data.table, &data.stats, &criteria, &LayerVisibility::default());
            let (geojson, layers) = write_export(&out_dir, &data.table, &presentation, &map)?;
            println!(
                "{} of {} areas match; wrote {} and {}",
                presentation.match_count,
                data.table.len(),
                geojson.display(),
                layers.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_percent_inputs() {
        assert!((parse_percent("15").unwrap() - 15.0).abs() < f64::EPSILON);
        assert!((parse_percent(" 22.5% ").unwrap() - 22.5).abs() < f64::EPSILON);
        assert!(parse_percent("101").is_err());
        assert!(parse_percent("-1").is_err());
        assert!(parse_percent("lots").is_err());
    }

    #[test]
    fn absent_flags_use_default_modes() {
        let settings = ThresholdArgs::default().settings(0.15);
        assert_eq!(settings, FilterSettings::new(0.15));
    }

    #[test]
    fn flags_override_modes() {
        let cli = Cli::try_parse_from([
            "area_map",
            "summary",
            "--min-share",
            "30",
            "--min-income",
            "42000",
            "--max-price",
            "250000",
        ])
        .unwrap();
        let Some(Commands::Summary { thresholds }) = cli.command else {
            panic!("expected summary");
        };
        let settings = thresholds.settings(0.15);
        assert!((settings.min_group_share - 0.3).abs() < f64::EPSILON);
        assert_eq!(settings.income, IncomeThreshold::Custom(42_000.0));
        assert_eq!(settings.price, PriceThreshold::Custom(250_000.0));
    }

    #[test]
    fn export_requires_out_dir() {
        assert!(Cli::try_parse_from(["area_map", "export"]).is_err());
        let cli = Cli::try_parse_from(["area_map", "export", "--out-dir", "out"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Export { .. })));
    }
}
