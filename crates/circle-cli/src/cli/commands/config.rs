//! Config command handlers.

use anyhow::{Context, Result};
use circle_core::config::{Config, paths};

/// Prints every file circle reads or writes under `CIRCLE_HOME`.
pub fn path() {
    println!("config:  {}", paths::config_path().display());
    println!("session: {}", paths::session_path().display());
    println!("logs:    {}", paths::logs_dir().display());
}

pub fn init() -> Result<()> {
    let target = paths::config_path();
    Config::init(&target).with_context(|| format!("init config at {}", target.display()))?;
    println!("Created config at {}", target.display());
    println!("  Set api_base_url there, or export CIRCLE_API_URL, then run `circle login`.");
    Ok(())
}

pub fn generate() -> Result<()> {
    let rendered = Config::generate().context("render default config")?;
    print!("{rendered}");
    Ok(())
}
