use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::constants;
use crate::utils::logger;

/// Settings read from `motion-extract.config` (`key = value` lines).
/// Detection thresholds are deliberately absent: they are fixed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub input_dir: Option<PathBuf>,
    pub detector_command: Option<String>,
    pub detector_args: Vec<String>,
}

impl Settings {
    /// Working-directory config first, then the per-user config directory.
    /// A missing or unreadable file yields defaults.
    pub fn load() -> Self {
        match Self::locate() {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        }
    }

    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            eprintln!("Warning: ignoring config ({:#})", e);
            logger::error(&format!("config: {:#}", e));
            Self::default()
        })
    }

    fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(constants::CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }

        let user = dirs::config_dir()?
            .join(constants::APP_NAME)
            .join(constants::CONFIG_FILE);
        user.is_file().then_some(user)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut settings = Self::default();

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "input-dir" if !value.is_empty() => settings.input_dir = Some(PathBuf::from(value)),
                "detector-command" if !value.is_empty() => {
                    settings.detector_command = Some(value.to_string())
                }
                "detector-args" => {
                    settings.detector_args = value.split_whitespace().map(str::to_string).collect()
                }
                _ => {}
            }
        }

        settings
    }
}
