//! Report output.

use anyhow::Result;
use clann_core::{format_report, AnalysisResult};
use std::io::Write;

/// Writes the annotation usage report to stdout.
pub fn print(result: &AnalysisResult) -> Result<()> {
    let report = format_report(&result.classes);
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(report.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
