//! Analyze command implementation.

use anyhow::{Context, Result};
use clann_classfile::ClassFileDecoder;
use clann_core::{ArchiveAnalyzer, Config};
use std::path::Path;
use std::process::ExitCode;

use super::{EXIT_IO, EXIT_USAGE};
use crate::config_resolver::ConfigSource;

/// Runs the analysis and prints the report.
///
/// Returns `Err` only for configuration problems; a missing archive or an
/// I/O failure is reported here and mapped to its exit code.
pub fn run(
    path: &Path,
    source: &ConfigSource,
    jobs: Option<usize>,
    exclude: Vec<String>,
) -> Result<ExitCode> {
    if !path.is_file() {
        tracing::error!("Archive file not found: {}", path.display());
        return Ok(ExitCode::from(EXIT_USAGE));
    }

    let config = load_config(source)?;

    let mut builder = ArchiveAnalyzer::builder()
        .decoder(ClassFileDecoder::new())
        .config(config)
        .excludes(exclude);
    if let Some(jobs) = jobs {
        builder = builder.parallelism(jobs);
    }
    let analyzer = builder.build().context("Failed to build analyzer")?;

    let result = match analyzer.analyze_path(path) {
        Ok(result) => result,
        Err(err) => {
            tracing::error!("Error analyzing archive: {}", path.display());
            eprintln!("{:?}", miette::Report::new(err));
            return Ok(ExitCode::from(EXIT_IO));
        }
    };

    super::output::print(&result).context("Failed to write report")?;

    Ok(ExitCode::SUCCESS)
}

fn load_config(source: &ConfigSource) -> Result<Config> {
    match source {
        ConfigSource::Default => Ok(Config::default()),
        other => {
            // Invariant: non-Default variants always have a path
            let p = other.path().context("resolved config has no path")?;
            if source.is_global() {
                tracing::info!("Using global config: {}", p.display());
            } else {
                tracing::debug!("Using config: {}", p.display());
            }
            Config::from_file(p).with_context(|| format!("Failed to load config: {}", p.display()))
        }
    }
}
