//! The `generate` and `clean` commands.

use std::path::Path;

use anyhow::{Context, Result, bail};
use body_jobs::{GenerateRequest, ServerConfig, clean_generated};
use owo_colors::OwoColorize;

pub fn generate(config: &ServerConfig, request: GenerateRequest) -> Result<()> {
    let response = body_jobs::generate(config, &request)
        .with_context(|| format!("Failed to generate a model for {:?}", request.nickname))?;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

pub fn clean(config: &ServerConfig, dir: Option<&Path>) -> Result<()> {
    let dir = dir.map_or_else(|| config.output_path(), Path::to_path_buf);
    let report = clean_generated(&dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    println!(
        "{} Removed {} files and {} directories from {}",
        "✓".green(),
        report.files_removed,
        report.dirs_removed,
        dir.display()
    );
    for (path, reason) in &report.failed {
        println!("  {} {}: {reason}", "✗".red(), path.display());
    }
    if !report.is_clean() {
        bail!("{} entries could not be removed", report.failed.len());
    }
    Ok(())
}
