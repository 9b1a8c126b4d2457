//! lgpm - module package manager for the Logos host

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

mod cmd;
mod ui;

#[derive(Parser)]
#[command(name = "lgpm")]
#[command(author, version, about = "lgpm - install modules for the Logos host")]
pub(crate) struct Cli {
    /// Core modules directory (default: <exe dir>/bin/modules)
    #[arg(long, global = true, value_name = "DIR")]
    modules_dir: Option<PathBuf>,

    /// UI plugins directory (default: `plugins` next to the modules directory)
    #[arg(long, global = true, value_name = "DIR")]
    ui_plugins_dir: Option<PathBuf>,

    /// Release tag to use (default: latest)
    #[arg(long, global = true, value_name = "TAG")]
    release: Option<String>,

    /// Print machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search packages by name or description
    Search {
        /// Search query (case-insensitive)
        query: String,
    },
    /// List available packages
    List {
        /// Only show packages in this category
        #[arg(long)]
        category: Option<String>,
        /// Only show installed packages
        #[arg(long)]
        installed: bool,
    },
    /// Install packages and their dependencies
    Install {
        /// Package name(s)
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        packages: Vec<String>,
        /// Install a local container file instead
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Skip packages whose installed version is the same or newer
        #[arg(long)]
        only_newer: bool,
    },
    /// List package categories
    Categories,
    /// Show package details
    Info {
        /// Package name
        package: String,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        cmd::completions::completions(shell);
        return Ok(());
    }

    let settings = cmd::Settings::from_cli(&cli)?;

    match cli.command {
        Commands::Search { query } => cmd::search::search(&settings, &query).await,
        Commands::List {
            category,
            installed,
        } => cmd::list::list(&settings, category.as_deref(), installed).await,
        Commands::Install {
            packages,
            file,
            only_newer,
        } => match file {
            Some(path) => cmd::install::install_file(&settings, &path, only_newer).await,
            None => cmd::install::install(&settings, &packages, only_newer).await,
        },
        Commands::Categories => cmd::categories::categories(&settings).await,
        Commands::Info { package } => cmd::info::info(&settings, &package).await,
        Commands::Completions { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so `--json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
