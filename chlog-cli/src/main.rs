//! chlog CLI - Prepare ChangeLog entries from working-copy changes
//!
//! Reads `git status`, works out which functions each modified file touches
//! and prepends a GNU-style entry block to the nearest ChangeLog.

use std::path::Path;

use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::*;
use config::ChlogConfig;
use output::OutputFormat;

/// Prepare ChangeLog entries from working-copy changes.
#[derive(Parser)]
#[command(name = "chlog")]
#[command(author, version)]
#[command(about = "Prepare ChangeLog entries from working-copy changes")]
#[command(propagate_version = true)]
#[command(after_help = "Examples:
  chlog prepare --dry-run   Show the entries without writing them
  chlog prepare --create    Start a top-level ChangeLog if none exists
  chlog languages           List languages with function-name resolution")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepend entries for the current changes to the nearest ChangeLog
    #[command(visible_alias = "p")]
    Prepare {
        /// Directory inside the git working copy (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Print the entries and the text that would be written, without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Create a top-level ChangeLog when none exists
        #[arg(short, long)]
        create: bool,

        /// Fail on .chlogrc.toml errors instead of silently using defaults
        #[arg(long)]
        strict: bool,

        /// Date for the entry header (YYYY-MM-DD, defaults to today)
        #[arg(long, value_parser = prepare::parse_date)]
        date: Option<NaiveDate>,

        /// Changelog formatter (overrides config)
        #[arg(long)]
        formatter: Option<String>,
    },

    /// List languages with function-name resolution
    #[command(visible_alias = "langs")]
    Languages,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: completions::Shell,

        /// Show installation instructions instead of generating completions
        #[arg(long)]
        instructions: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Load configuration from .chlogrc.toml at the project root
    let start_dir = match &cli.command {
        Some(Commands::Prepare { path, .. }) => path.as_str(),
        _ => ".",
    };
    let config = ChlogConfig::load(&ChlogConfig::project_root(Path::new(start_dir)));

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    if let Some(use_color) = config.use_color() {
        colored::control::set_override(use_color);
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(());
        }
    };

    match command {
        Commands::Prepare {
            path,
            dry_run,
            create,
            strict,
            date,
            formatter,
        } => {
            let options = prepare::PrepareOptions {
                path,
                dry_run,
                create,
                strict,
                date,
                formatter,
            };
            prepare::run(options, format).await
        }
        Commands::Languages => languages::run(&config, format),
        Commands::Completions {
            shell,
            instructions,
        } => {
            if instructions {
                completions::show_instructions(shell, format)
            } else {
                let mut cmd = Cli::command();
                completions::generate_completions_with_cmd(shell, &mut cmd);
                Ok(())
            }
        }
    }
}
