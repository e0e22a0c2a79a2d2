//! gitwrapper - command-line front end for the gitwrapper library
//!
//! Run with `gitwrapper --help` for usage.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gitwrapper::{config::Config, Comparison, Git, LogOptions, APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(version = VERSION)]
#[command(about = "Query and drive git repositories through the git CLI")]
#[command(long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Repository to operate on (default: discovered from the current directory)
    #[arg(short = 'C', long)]
    repo: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a repository
    Init {
        /// Directory to initialize (created if missing)
        path: PathBuf,

        /// Create a bare repository
        #[arg(long)]
        bare: bool,
    },

    /// Show changes against HEAD
    Status {
        /// Group files into uncommitted, unstaged and untracked
        #[arg(long)]
        full: bool,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// List files changed between two treeishes, or a treeish and the index
    Changed {
        /// One or two treeishes
        #[arg(required = true, num_args = 1..=2)]
        treeishes: Vec<String>,
    },

    /// Show the commit log
    Log {
        /// Limit the number of commits
        #[arg(short = 'n', long, default_value_t = 0)]
        count: usize,

        /// One line per commit
        #[arg(long)]
        oneline: bool,
    },

    /// Print the most recent tag
    LatestTag,

    /// Print the HEAD commit id
    LatestCommit {
        /// Print the full id
        #[arg(long)]
        long: bool,
    },

    /// List local branches
    Heads,

    /// List tags
    Tags,

    /// List remotes and their locations
    Remotes {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// List paths with unresolved conflicts
    Unmerged,

    /// Show configuration
    Config {
        /// Initialize config file with defaults
        #[arg(long)]
        init: bool,
    },
}

fn setup_logging(debug: bool, log_file: Option<&PathBuf>) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        // Use info level for our crate, warn for dependencies
        EnvFilter::new("info")
            .add_directive("gix=warn".parse()?)
            .add_directive("tokio=warn".parse()?)
    };

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(file).with_target(false))
            .with(filter)
            .init();
    } else {
        // stdout carries command output (including JSON)
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .init();
    }

    Ok(())
}

fn open_repo(cli_repo: Option<PathBuf>, config: &Config) -> Result<Git> {
    let path = match cli_repo {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let git = Git::discover(&path)?.with_runner(Arc::new(config.executor()));
    debug!("Using repository {:?}", git.path());
    Ok(git)
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre error hooks
    color_eyre::install()?;

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config, using defaults: {}", e);
        Config::default()
    });

    setup_logging(cli.debug || config.debug, config.log_file.as_ref())?;

    match cli.command {
        Commands::Init { path, bare } => {
            let git = Git::init_create_with(&path, bare, true, Arc::new(config.executor())).await?;
            info!("Initialized repository at {:?}", git.path());
        }

        Commands::Status { full, json } => {
            let git = open_repo(cli.repo, &config)?;
            if full {
                let status = git.status_full().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&status)?);
                } else {
                    for (label, files) in [
                        ("uncommitted", &status.uncommitted),
                        ("unstaged", &status.unstaged),
                        ("untracked", &status.untracked),
                    ] {
                        for file in files {
                            println!("{:<12} {}", label, file);
                        }
                    }
                }
            } else {
                let entries = git.status(&[]).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                } else {
                    for entry in entries {
                        println!("{}\t{}", entry.status, entry.path);
                    }
                }
            }
        }

        Commands::Changed { treeishes } => {
            let git = open_repo(cli.repo, &config)?;
            let comparison = Comparison::from_slice(treeishes.as_slice())?;
            print_lines(&git.list_changed_files(comparison, &[]).await?);
        }

        Commands::Log { count, oneline } => {
            let git = open_repo(cli.repo, &config)?;
            let log = git.log(&[], LogOptions { oneline, count }).await?;
            println!("{}", log);
        }

        Commands::LatestTag => {
            let git = open_repo(cli.repo, &config)?;
            match git.latest_tag().await? {
                Some(tag) => println!("{}", tag),
                None => eprintln!("No tags found"),
            }
        }

        Commands::LatestCommit { long } => {
            let git = open_repo(cli.repo, &config)?;
            println!("{}", git.latest_commit(!long).await?);
        }

        Commands::Heads => {
            let git = open_repo(cli.repo, &config)?;
            print_lines(&git.list_heads().await?);
        }

        Commands::Tags => {
            let git = open_repo(cli.repo, &config)?;
            print_lines(&git.list_tags().await?);
        }

        Commands::Remotes { json } => {
            let git = open_repo(cli.repo, &config)?;
            let remotes = git.remotes().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&remotes)?);
            } else {
                for (name, locations) in &remotes {
                    for location in locations {
                        println!("{}\t{}", name, location);
                    }
                }
            }
        }

        Commands::Unmerged => {
            let git = open_repo(cli.repo, &config)?;
            print_lines(&git.list_unmerged().await?);
        }

        Commands::Config { init } => {
            if init {
                config.save()?;
                println!(
                    "Configuration initialized at {:?}",
                    Config::config_file_path()?
                );
            } else {
                println!("Configuration:");
                println!("{}", toml::to_string_pretty(&config)?);
                println!("\nConfig file: {:?}", Config::config_file_path()?);
            }
        }
    }

    Ok(())
}
