//! schichtplan CLI - yearly shift-schedule workbooks
//!
//! Generates one xlsx workbook per person: a summary sheet plus one sheet per
//! month of the target year, with public holidays marked.

mod exit;

use anyhow::{Context, Result};
use clap::Parser;
use exit::ExitCode;
use schichtplan_core::GeneratorConfig;
use schichtplan_render::OutputSummary;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "schichtplan")]
#[command(author, version, about = "Yearly shift-schedule workbook generator", long_about = None)]
struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Target year, defaults to next year
    #[arg(short, long, env = "SCHICHTPLAN_YEAR")]
    year: Option<String>,

    /// Person to generate a workbook for, repeatable; the first is rendered
    #[arg(short = 'n', long = "name", value_name = "NAME", env = "SCHICHTPLAN_NAME")]
    names: Vec<String>,

    /// Holiday country code
    #[arg(long, env = "SCHICHTPLAN_COUNTRY")]
    country: Option<String>,

    /// Holiday subdivision (federal state) code, e.g. mv, by, nw
    #[arg(long, visible_alias = "subdivision", env = "SCHICHTPLAN_COUNTY")]
    county: Option<String>,

    /// Template layout: legacy or planning
    #[arg(long, env = "SCHICHTPLAN_PROFILE")]
    profile: Option<String>,

    /// Month label language: de or en
    #[arg(long, env = "SCHICHTPLAN_LOCALE")]
    locale: Option<String>,

    /// External template workbook instead of the built-in one
    #[arg(short, long, value_name = "XLSX", env = "SCHICHTPLAN_TEMPLATE")]
    template: Option<PathBuf>,

    /// Directory for the generated workbooks
    #[arg(short, long, value_name = "DIR", env = "SCHICHTPLAN_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Name files "Schichtplan <Name> <Year>.xlsx"
    #[arg(long, env = "SCHICHTPLAN_LEGACY_NAMES")]
    legacy_names: bool,

    /// TOML file with default settings; flags override it
    #[arg(short, long, value_name = "FILE", env = "SCHICHTPLAN_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> GeneratorConfig {
        GeneratorConfig {
            year: self.year.clone(),
            names: self.names.clone(),
            country: self.country.clone(),
            subdivision: self.county.clone(),
            profile: self.profile.clone(),
            locale: self.locale.clone(),
            legacy_names: self.legacy_names.then_some(true),
            output_dir: self.output_dir.clone(),
            template: self.template.clone(),
        }
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(cli.verbose))))
        .init();

    let result = run(&cli);
    match &result {
        Ok(summary) => {
            for path in &summary.failed {
                warn!(path = %path.display(), "no copy written");
            }
            info!("done generating {} document(s)", summary.requested);
        }
        Err(e) => error!("{e:#}"),
    }
    ExitCode::from_result(&result).into()
}

/// Default filter for `-v` repetitions
fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn run(cli: &Cli) -> Result<OutputSummary> {
    let base = match &cli.config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    let config = base.merge(cli.overrides());

    let today = chrono::Local::now().date_naive();
    schichtplan_render::generate(&config, today).context("Failed to generate schedules")
}
