use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod prompt;
mod render;

#[derive(Parser)]
#[command(name = "taskcal", version, about = "Recurring task scheduler for Google Calendar")]
struct Cli {
    /// Configuration file [default: ~/.config/taskcal/config.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the schedule that `apply` would write
    Plan {
        /// Ignore the remote calendar (no per-day limit lookups)
        #[arg(long)]
        offline: bool,
    },
    /// Schedule tasks and write them to the calendar
    Apply {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Undo recorded sync passes
    Undo {
        #[command(subcommand)]
        action: commands::undo::UndoAction,
    },
    /// Inspect sync history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Bulk event maintenance
    Events {
        #[command(subcommand)]
        action: commands::events::EventsAction,
    },
    /// Access token management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("taskcal=debug,taskcal_core=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("taskcal=info,taskcal_core=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Plan { offline } => commands::plan::run(config_path, offline),
        Commands::Apply { yes } => commands::apply::run(config_path, yes),
        Commands::Undo { action } => commands::undo::run(config_path, action),
        Commands::History { action } => commands::history::run(config_path, action),
        Commands::Events { action } => commands::events::run(config_path, action),
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Config { action } => commands::config::run(config_path, action),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
