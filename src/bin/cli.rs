//! newspipe CLI
//!
//! Entry point for the scheduler (e.g. a crontab line running
//! `newspipe -c /srv/news/pipeline.toml run --pipeline full`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use newspipe::{
    models::Config,
    pipeline::{Orchestrator, PipelineKind, RunConfig},
};

/// newspipe - crawl-then-analyze pipeline runner
#[derive(Parser, Debug)]
#[command(name = "newspipe", version, about = "Scheduled news crawl and analysis pipeline")]
struct Cli {
    /// Path to the pipeline configuration file
    #[arg(short, long, default_value = "pipeline.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a pipeline once, appending to the run log
    Run {
        /// Named pipeline: "full" (crawl then analyze) or "analyze-only"
        #[arg(short, long, default_value = "full")]
        pipeline: PipelineKind,
    },

    /// Print the resolved stage commands without running them
    Plan {
        #[arg(short, long, default_value = "full")]
        pipeline: PipelineKind,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { pipeline } => {
            // A missing config file must not silently run default stages.
            let config = match Config::load(&cli.config) {
                Ok(config) => config,
                Err(e) => {
                    init_logging(cli.verbose, "info");
                    log::error!("Failed to load {}: {}", cli.config.display(), e);
                    return ExitCode::FAILURE;
                }
            };
            init_logging(cli.verbose, &config.logging.level);

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return ExitCode::FAILURE;
            }

            log::info!("Running '{}' pipeline from {}", pipeline, cli.config.display());
            let run_config = RunConfig::from_config(&config, pipeline);
            let outcome = Orchestrator::default().run(&run_config).await;

            exit_code(outcome.exit_code())
        }

        Command::Plan { pipeline } => {
            init_logging(cli.verbose, "info");
            let config = Config::load_or_default(&cli.config);

            let run_config = RunConfig::from_config(&config, pipeline);
            println!("pipeline:          {}", pipeline);
            println!("working directory: {}", run_config.working_directory.display());
            println!("log file:          {}", run_config.log_path.display());
            for (i, stage) in run_config.stages.iter().enumerate() {
                println!("  {}. {}: {}", i + 1, stage.name(), stage);
                if let Some(timeout) = stage.timeout_duration() {
                    println!("     timeout: {}s", timeout.as_secs());
                }
            }
            ExitCode::SUCCESS
        }

        Command::Validate => {
            init_logging(cli.verbose, "info");
            log::info!("Validating {}...", cli.config.display());

            let config = match Config::load(&cli.config) {
                Ok(config) => config,
                Err(e) => {
                    log::error!("Failed to load config: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return ExitCode::FAILURE;
            }
            if let Err(e) = newspipe::pipeline::resolve_working_directory(&config.working_directory) {
                log::warn!("{}", e);
            }

            log::info!("✓ Config OK (limit {}, day window {})", config.limit, config.day_window);
            ExitCode::SUCCESS
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}
