//! Optional JSON configuration.
//!
//! Search order:
//! 1. Explicit path (`--config` flag)
//! 2. `division-risk.json` in the working directory
//!
//! All fields are optional. CLI flags take precedence over config values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::projection::ProjectionYear;

pub const DEFAULT_CONFIG_FILE: &str = "division-risk.json";

fn default_report_limit() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Projection year used when `--year` is not given
    #[serde(default)]
    pub default_year: Option<String>,

    /// CSV file replacing the built-in division fixtures
    #[serde(default)]
    pub divisions_csv: Option<PathBuf>,

    /// Number of divisions listed in reports
    #[serde(default = "default_report_limit")]
    pub report_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_year: None,
            divisions_csv: None,
            report_limit: default_report_limit(),
        }
    }
}

impl AppConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;

        // Relative fixture paths resolve against the config file's directory.
        if let (Some(csv), Some(dir)) = (config.divisions_csv.as_mut(), path.parent()) {
            if csv.is_relative() {
                *csv = dir.join(&*csv);
            }
        }

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Loads `division-risk.json` from `dir` when present, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load_from(&candidate)
        } else {
            tracing::debug!("no config file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let cwd = std::env::current_dir().context("failed to resolve working directory")?;
                Self::discover(&cwd)
            }
        }
    }

    pub fn projection_year(&self, flag: Option<&str>) -> ProjectionYear {
        flag.or(self.default_year.as_deref())
            .map(ProjectionYear::from_token)
            .unwrap_or_default()
    }
}
