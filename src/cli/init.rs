//! Init command - write an example config file

use crate::config::Settings;
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

pub(super) fn run(path: Option<&Path>) -> Result<()> {
    let existed = path
        .map(Path::to_path_buf)
        .or_else(Settings::user_config_path)
        .is_some_and(|p| p.exists());
    let written = Settings::init_user_config(path).context("Failed to write config file")?;

    if existed {
        println!(
            "{} Config already exists at {}",
            style("✓").green(),
            style(written.display()).cyan()
        );
    } else {
        println!(
            "{} Created {}",
            style("✓").green(),
            style(written.display()).cyan()
        );
    }
    println!("\nEnvironment variables override the file:");
    println!("  {}", style("CACHE_DIR, CACHE_TTL_SECONDS, REQUEST_TIMEOUT_SECONDS, POLITE_DELAY_SECONDS").dim());
    println!("  {}", style("STRING_API_BASE, STRING_CALLER_IDENTITY, STRING_DEFAULT_SPECIES, ENCORI_API_BASE").dim());
    Ok(())
}
