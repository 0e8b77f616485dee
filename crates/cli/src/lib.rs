pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dinebot_core::config::{AppConfig, LoadOptions};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "dinebot",
    about = "Dinebot operator CLI",
    long_about = "Inspect configuration, check component readiness, and drive the dining \
                  assistant's router, code hook and suggestion worker by hand.",
    after_help = "Examples:\n  dinebot doctor --json\n  dinebot chat \"I'd like dinner\"\n  \
                  dinebot dialog event.json\n  dinebot poll"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Show effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and report which components can run")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Process at most one queued suggestion request")]
    Poll,
    #[command(about = "Send one chat message through the message router")]
    Chat {
        #[arg(help = "Message text")]
        text: String,
        #[arg(long, help = "Session id forwarded to the recognition service")]
        session_id: Option<String>,
    },
    #[command(about = "Feed a code-hook event JSON file to the fulfillment handler")]
    Dialog {
        #[arg(help = "Path to the event JSON")]
        file: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Poll => commands::poll::run(),
        Command::Chat { text, session_id } => commands::chat::run(&text, session_id.as_deref()),
        Command::Dialog { file } => commands::dialog::run(&file),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging() {
    let level = AppConfig::load(LoadOptions::default())
        .map(|config| config.logging.level)
        .unwrap_or_else(|_| "warn".to_string());
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
