pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use simfit_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

use commands::recommend::RecommendArgs;

const AFTER_HELP: &str = "Examples:
  simfit recommend --lifestyle travel --budget 15
  simfit recommend --priority \"I hate running out of data\" --priority hotspot --sort price
  simfit recommend --description-audio needs.wav --narrative
  simfit catalog
  simfit config";

#[derive(Debug, Parser)]
#[command(
    name = "simfit",
    about = "SIM-only plan recommendations",
    long_about = "Score a UK SIM-only plan catalog against how you use your phone, then filter, sort and explain the matches.",
    after_help = AFTER_HELP
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a simfit.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Rank the configured catalog for a profile and print a JSON report")]
    Recommend(RecommendArgs),
    #[command(about = "Fetch and map the configured catalog and report what loaded")]
    Catalog,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config.clone(),
            ..LoadOptions::default()
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    if let Ok(config) = AppConfig::load(options.clone()) {
        init_logging(&config.logging);
    }

    let result = match &cli.command {
        Command::Recommend(args) => commands::recommend::run(&options, args),
        Command::Catalog => commands::catalog::run(&options),
        Command::Config => commands::config::run(&options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the command's JSON output.
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(error) = installed {
        eprintln!("logging already initialised: {error}");
    }
}
