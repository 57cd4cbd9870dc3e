use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::state::ensure_sunchang_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sheet: SheetSection,
    #[serde(default)]
    pub advisor: AdvisorSection,
    #[serde(default)]
    pub display: DisplaySection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetSection {
    /// Apps Script web-app URL serving the rows as JSON.
    /// Unset means offline mode (built-in demo collection).
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorSection {
    pub model: String,
    pub base_url: String,
    /// Falls back to $GEMINI_API_KEY, then $API_KEY
    pub api_key: Option<String>,
}

impl Default for AdvisorSection {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    /// Look-ahead window for the "payments due soon" notice
    pub upcoming_days: i64,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self { upcoming_days: 5 }
    }
}

/// Longest look-ahead window accepted from the file (ten years)
pub const MAX_UPCOMING_DAYS: i64 = 3650;

impl DisplaySection {
    /// Clamp `upcoming_days` into `0..=MAX_UPCOMING_DAYS`.
    fn sanitize(&mut self) {
        let clamped = self.upcoming_days.clamp(0, MAX_UPCOMING_DAYS);
        if clamped != self.upcoming_days {
            warn!(
                configured = self.upcoming_days,
                using = clamped,
                "display.upcoming_days out of range"
            );
            self.upcoming_days = clamped;
        }
    }
}

impl Config {
    /// Configured endpoint, if non-blank
    pub fn endpoint(&self) -> Option<&str> {
        self.sheet
            .endpoint_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// `--url` flag wins over the file
    pub fn resolve_endpoint(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::trim)
            .filter(|u| !u.is_empty())
            .or_else(|| self.endpoint())
            .map(str::to_string)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_sunchang_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    let mut cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    cfg.display.sanitize();
    Ok(cfg)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    save_config_to(&config_path()?, cfg)
}

pub fn save_config_to(p: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.endpoint(), None);
        assert_eq!(cfg.advisor.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.sheet.endpoint_url = Some("https://script.google.com/macros/s/abc/exec".into());
        cfg.display.upcoming_days = 14;
        save_config_to(&p, &cfg).unwrap();
        assert_eq!(load_config_from(&p).unwrap(), cfg);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "[sheet]\nendpoint_url = \"https://example.com/exec\"\n").unwrap();
        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.endpoint(), Some("https://example.com/exec"));
        assert_eq!(cfg.display.upcoming_days, 5);
    }

    #[test]
    fn test_out_of_range_upcoming_days_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");

        fs::write(&p, "[display]\nupcoming_days = 100000000\n").unwrap();
        assert_eq!(load_config_from(&p).unwrap().display.upcoming_days, MAX_UPCOMING_DAYS);

        fs::write(&p, "[display]\nupcoming_days = -4\n").unwrap();
        assert_eq!(load_config_from(&p).unwrap().display.upcoming_days, 0);
    }

    #[test]
    fn test_flag_overrides_file() {
        let mut cfg = Config::default();
        cfg.sheet.endpoint_url = Some("https://file.example/exec".into());
        assert_eq!(
            cfg.resolve_endpoint(Some("https://flag.example/exec")).as_deref(),
            Some("https://flag.example/exec")
        );
        assert_eq!(cfg.resolve_endpoint(Some("  ")).as_deref(), Some("https://file.example/exec"));

        cfg.sheet.endpoint_url = Some("   ".into());
        assert_eq!(cfg.resolve_endpoint(None), None);
    }
}
