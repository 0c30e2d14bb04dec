//! authbridge - run authentication flows against recorded navigations.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use bridge_config_and_utils::{init_logging, Config, Paths};
use clap::{Parser, Subcommand};

/// Auth bridge command-line interface.
#[derive(Parser)]
#[command(name = "authbridge")]
#[command(about = "Drive WebView authentication flows from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (config, logs). Defaults to ~/.webauth-bridge
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded navigation through a full auth flow
    Replay {
        /// AuthConfig JSON file (camelCase, as sent by the host)
        #[arg(short, long)]
        config: PathBuf,

        /// JSON array of script steps to replay
        #[arg(short, long)]
        script: PathBuf,

        /// Cancel the flow after this many milliseconds
        #[arg(long)]
        cancel_after_ms: Option<u64>,
    },
    /// Parse an expiry value and print it as RFC 3339
    ParseExpiry {
        /// Raw expiry string
        raw: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(level);

    match cli.command {
        Commands::Replay {
            config: auth_config,
            script,
            cancel_after_ms,
        } => {
            let response =
                commands::replay(&config, &auth_config, &script, cancel_after_ms).await?;
            println!("{}", response.to_json()?);
            Ok(if response.is_resolved() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::ParseExpiry { raw } => {
            println!("{}", commands::parse_expiry(&raw)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
