//! Landwatch demo tool
//!
//! Runs each model on synthetic data: generate, (train), predict, print.

mod tabular_demo;
mod vision_demo;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use landwatch_core::{
    cli::{load_toml_config, setup_cli_logging},
    LandwatchConfig,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::tabular_demo::TabularReport;
use crate::vision_demo::{ErosionReport, VegetationReport};

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Random-forest degradation classifier and vegetation-loss regressor
    Tabular,
    /// Erosion severity CNN on a synthetic image
    Erosion,
    /// Vegetation loss CNN and pseudo-NDVI on a synthetic image
    Vegetation,
    /// Every demo in turn
    All,
}

/// Land degradation model demos
#[derive(Parser, Debug)]
#[command(
    name = "landwatch",
    about = "Run the land degradation models on synthetic data",
    long_about = "Generates synthetic observations and imagery, trains the models where \
                  applicable and prints their predictions."
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override every seed
    #[arg(short, long, value_name = "SEED", global = true)]
    seed: Option<u64>,

    /// Override the number of synthetic tabular samples
    #[arg(short = 'n', long, value_name = "N", global = true)]
    samples: Option<usize>,

    /// Erosion CNN training epochs on synthetic images (0 = untrained weights)
    #[arg(short, long, value_name = "N", global = true)]
    epochs: Option<usize>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Everything a run produced, for `--json`
#[derive(Debug, Default, Serialize)]
struct DemoReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    tabular: Option<TabularReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    erosion: Option<ErosionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vegetation: Option<VegetationReport>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    setup_cli_logging(args.verbose).context("Failed to initialize logging")?;

    let config = build_config(&args)?;
    info!("Landwatch demo: {:?}", args.command);

    let run_tabular = matches!(args.command, Command::Tabular | Command::All);
    let run_erosion = matches!(args.command, Command::Erosion | Command::All);
    let run_vegetation = matches!(args.command, Command::Vegetation | Command::All);

    let mut report = DemoReport::default();

    if run_tabular {
        let tabular = tabular_demo::run(&config).context("Tabular demo failed")?;
        if !args.json {
            tabular.print();
        }
        report.tabular = Some(tabular);
    }

    if run_erosion {
        let erosion = vision_demo::run_erosion(&config, args.json).context("Erosion demo failed")?;
        if !args.json {
            erosion.print();
        }
        report.erosion = Some(erosion);
    }

    if run_vegetation {
        let vegetation =
            vision_demo::run_vegetation(&config).context("Vegetation demo failed")?;
        if !args.json {
            vegetation.print();
        }
        report.vegetation = Some(vegetation);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", "Done.".green().bold());
    }

    Ok(())
}

/// File (or defaults), then command-line overrides, then validation
fn build_config(args: &Args) -> Result<LandwatchConfig> {
    let mut config: LandwatchConfig = match &args.config {
        Some(path) => load_toml_config(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?,
        None => {
            // Without a file the erosion model runs untrained, like a fresh detector
            let mut config = LandwatchConfig::default();
            config.erosion_training.epochs = 0;
            config
        }
    };

    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(samples) = args.samples {
        if samples == 0 {
            bail!("--samples must be greater than 0");
        }
        config.synthetic.n_samples = samples;
    }
    if let Some(epochs) = args.epochs {
        config.erosion_training.epochs = epochs;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_config_file() {
        let args = parse(&["landwatch", "tabular"]);
        let config = build_config(&args).unwrap();

        assert_eq!(args.command, Command::Tabular);
        assert_eq!(config.synthetic.n_samples, 1000);
        assert_eq!(config.synthetic.seed, 42);
        assert_eq!(config.erosion_training.epochs, 0);
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "landwatch", "all", "--seed", "7", "--samples", "200", "--epochs", "3", "--json",
        ]);
        let config = build_config(&args).unwrap();

        assert!(args.json);
        assert_eq!(config.synthetic.n_samples, 200);
        assert_eq!(config.classifier.seed, 7);
        assert_eq!(config.regressor.seed, 7);
        assert_eq!(config.erosion_training.epochs, 3);
    }

    #[test]
    fn test_zero_samples_rejected() {
        let args = parse(&["landwatch", "tabular", "--samples", "0"]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let args = parse(&["landwatch", "erosion", "--config", "/nonexistent/landwatch.toml"]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_json_report_is_a_single_document() {
        let mut config = LandwatchConfig::default().with_seed(3);
        config.synthetic.n_samples = 100;
        config.classifier.n_estimators = 5;
        config.regressor.n_estimators = 5;

        let report = DemoReport {
            tabular: Some(tabular_demo::run(&config).unwrap()),
            ..Default::default()
        };
        let json = serde_json::to_string_pretty(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let tabular = &value["tabular"];
        assert!(tabular["degradation"].is_object());
        assert!(tabular["vegetation_loss"].is_object());
        assert!(tabular["quick_assessment"].is_object());
        assert_eq!(tabular["feature_importance"].as_array().map(Vec::len), Some(7));
        assert!(value.get("erosion").is_none());
        assert!(value.get("vegetation").is_none());
    }
}
