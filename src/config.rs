//! TOML configuration: dataset URL, year domain, export directory.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::query::YearRange;

/// Default remote archive holding the occurrence dataset.
pub const DEFAULT_DATASET_URL: &str =
    "https://data.mycoportal.org/dwc/occurrences.csv.gz";

const CONFIG_FILE: &str = "config.toml";

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load the config file, falling back to defaults when it does not exist.
    pub fn load(&self) -> Result<AppConfig> {
        let path = self.config_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        let config: AppConfig =
            toml::from_str(&raw).map_err(|e| eyre!("Invalid config file {:?}: {}", path, e))?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Remote archive URL for the occurrence dataset.
    pub dataset_url: String,
    /// Full collection-year domain `[min, max]`; the year filter imposes no
    /// restriction while it spans this whole domain.
    pub year_domain: [i32; 2],
    /// Directory image exports are written to. Defaults to the working dir.
    pub export_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_url: DEFAULT_DATASET_URL.to_string(),
            year_domain: [
                YearRange::FULL_DOMAIN.min(),
                YearRange::FULL_DOMAIN.max(),
            ],
            export_dir: None,
        }
    }
}

impl AppConfig {
    pub fn year_domain(&self) -> Result<YearRange> {
        YearRange::new(self.year_domain[0], self.year_domain[1])
    }

    fn validate(&self) -> Result<()> {
        self.year_domain()?;
        if self.dataset_url.trim().is_empty() {
            return Err(eyre!("dataset_url must not be empty"));
        }
        Ok(())
    }
}
