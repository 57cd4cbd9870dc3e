use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$SUNCHANG_HOME`, else `~/.sunchang`
pub fn sunchang_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SUNCHANG_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".sunchang"))
}

pub fn ensure_sunchang_home() -> Result<PathBuf> {
    let dir = sunchang_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
