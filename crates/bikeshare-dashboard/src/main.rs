//! Bike sharing dashboard - main entry point

use anyhow::{bail, Context, Result};
use bikeshare_common::{init_logging, BusinessQuestion, LoggingConfig, TimeFrame};
use bikeshare_config::{Config, ConfigLoader};
use bikeshare_dashboard::{watch, Dashboard};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    /// Re-run the dashboard whenever the configuration file changes
    #[arg(short, long)]
    watch: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

/// Settings given on the command line; they win over the file and environment.
#[derive(clap::Args, Debug, Clone, Default)]
struct Overrides {
    /// Business question: rental-factors or user-patterns
    #[arg(short, long)]
    question: Option<BusinessQuestion>,

    /// Time frame: hourly or daily
    #[arg(short, long)]
    time_frame: Option<TimeFrame>,

    /// Cleaned bike sharing CSV file
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Directory receiving the page and chart files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Log level filter
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Overrides {
    fn apply(&self, config: &mut Config) {
        if let Some(question) = self.question {
            config.dashboard.question = question;
        }
        if let Some(time_frame) = self.time_frame {
            config.dashboard.time_frame = time_frame;
        }
        if let Some(data) = &self.data {
            config.data.path.clone_from(data);
        }
        if let Some(dir) = &self.output_dir {
            config.dashboard.output_dir.clone_from(dir);
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        ConfigLoader::read(args.config.as_deref()).context("Failed to load configuration")?;
    args.overrides.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    if args.dump_config {
        print!("{}", ConfigLoader::to_toml(&config)?);
        return Ok(());
    }

    init_logging(&LoggingConfig::from(&config.logging))?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting bike sharing dashboard");

    let dashboard = Arc::new(Dashboard::load(config)?);

    match dashboard.run_pass() {
        Ok(report) => info!(
            question = %report.question,
            time_frame = %report.time_frame,
            charts = report.charts,
            index = %report.files.index.display(),
            "Dashboard written"
        ),
        Err(e) if args.watch && e.is_recoverable() => {
            error!(error = %e, "Initial dashboard pass failed; waiting for a configuration change");
        }
        Err(e) => return Err(e.into()),
    }

    if args.watch {
        let Some(path) = ConfigLoader::locate(args.config.as_deref()) else {
            bail!("--watch needs a configuration file (--config, BIKESHARE_CONFIG or ./bikeshare.toml)");
        };
        let overrides = args.overrides;
        watch(dashboard, path, move |config: &mut Config| overrides.apply(config)).await?;
    }

    Ok(())
}
