// src/config.rs
// config.toml lives next to the executable, like every other file the tool keeps
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Used when `--profile` is not given.
    pub profile: Option<String>,
    /// Rows decoded from the first batch of a data file.
    pub batch_rows: usize,
    pub request_timeout_secs: u64,
    /// `tracing` filter, overridden by `RUST_LOG`.
    pub log_filter: String,
    pub colors: ColorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: None,
            batch_rows: 1000,
            request_timeout_secs: 60,
            log_filter: "rime=info".to_string(),
            colors: ColorConfig::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ColorConfig {
    pub default_bg: [u8; 3],
    pub border: [u8; 3],
    pub border_focus: [u8; 3],
    pub title: [u8; 3],
    pub header_row: [u8; 3],
    pub cell_fg: [u8; 3],
    pub selection_fg: [u8; 3],
    pub selection_bg: [u8; 3],
    pub caption_fg: [u8; 3],
    pub status_fg: [u8; 3],
    pub error_fg: [u8; 3],
    pub info_fg: [u8; 3],
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            default_bg: [22, 22, 22],
            border: [84, 84, 109],
            border_focus: [126, 156, 216],
            title: [127, 180, 202],
            header_row: [230, 195, 132],
            cell_fg: [200, 200, 200],
            selection_fg: [22, 22, 22],
            selection_bg: [149, 127, 184],
            caption_fg: [114, 113, 105],
            status_fg: [156, 171, 202],
            error_fg: [255, 93, 98],
            info_fg: [152, 187, 108],
        }
    }
}

impl Config {
    /// Directory holding the executable, canonicalized; `.` if unknown.
    pub fn home_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
            .and_then(|p| std::fs::canonicalize(p).ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn path() -> PathBuf {
        Self::home_dir().join(CONFIG_FILE)
    }

    /// Load `config.toml` from the executable directory. A missing file
    /// yields the defaults; a malformed one is an error.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        anyhow::ensure!(config.batch_rows > 0, "batch_rows must be positive");
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
