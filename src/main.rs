//! Clinicbot - conversational appointment booking engine
//!
//! Main entry point: initializes tracing, loads configuration, and
//! dispatches to the selected command.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clinicbot::cli::{Cli, Commands};
use clinicbot::commands;
use clinicbot::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    let config = Config::load(&cli.config)?;
    config.validate()?;

    match cli.command {
        Commands::Serve { bind, dry_run } => {
            tracing::info!("Starting webhook server");
            commands::serve::run_serve(config, bind, dry_run).await?;
            Ok(())
        }
        Commands::Appointments => {
            commands::appointments::run_list(config).await?;
            Ok(())
        }
        Commands::Session { user_id } => {
            commands::session::run_show(config, &user_id).await?;
            Ok(())
        }
    }
}

/// Initializes the tracing subscriber
///
/// Defaults to `info` (or `debug` with `--verbose`); `RUST_LOG` takes
/// precedence when set.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
