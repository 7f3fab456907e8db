//! Degrader CLI - Reproducible Audio Degradation
//!
//! Command-line interface for the Degrader library.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use degrader::cli::commands::{self, codec_config};
use degrader::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!("Degrader v{}", env!("CARGO_PKG_VERSION"));

    match handle_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            if let Some(err) = e.downcast_ref::<degrader::DegraderError>() {
                for suggestion in err.recovery_suggestions() {
                    eprintln!("  hint: {}", suggestion);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Apply {
            input,
            output,
            bit_depth,
            history,
            lame_path,
            degradations,
        } => commands::apply(
            &input,
            &output,
            bit_depth,
            history.as_deref(),
            &codec_config(lame_path.as_deref()),
            &degradations,
        ),
        Commands::Batch {
            input_dir,
            output_dir,
            jobs,
            bit_depth,
            lame_path,
            degradations,
        } => commands::batch(
            &input_dir,
            &output_dir,
            jobs,
            bit_depth,
            &codec_config(lame_path.as_deref()),
            &degradations,
        ),
        Commands::List => commands::list(&codec_config(None)),
    }
}
