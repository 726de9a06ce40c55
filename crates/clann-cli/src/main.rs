//! clann CLI tool.
//!
//! Usage:
//! ```bash
//! clann [OPTIONS] <PATH>
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Analyze class files in a JAR file and print a report on annotation usage
#[derive(Parser)]
#[command(name = "clann")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JAR file to analyze
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of threads used to decode class files
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Exclude entries matching a glob (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let source = config_resolver::resolve(&cwd, cli.config.as_deref());

    match commands::analyze::run(&cli.path, &source, cli.jobs, cli.exclude) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(commands::EXIT_USAGE)
        }
    }
}
