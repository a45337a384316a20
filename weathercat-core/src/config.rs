use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::Location;

const CONFIG_FILE: &str = "weathercat.conf";

const TEMPLATE: &str = r#"# weathercat configuration
#
# Location used when none is given on the command line. Either any text the
# geocoder understands, or a place with known coordinates:
# default_location = "geo:61.000689,24.479063"
# default_location = { name = "Hölmölä, Suomi", latitude = 61.0, longitude = 24.4 }
#
# Locale for weekday names and place names (defaults to LC_ALL/LC_TIME/LANG):
# locale = "fi_FI.UTF-8"
#
# Time zone for the forecast (defaults to this computer's zone):
# timezone = "Europe/Helsinki"
"#;

/// Where to look when no location is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultLocation {
    /// Coordinates are used as-is, no geocoding round trip.
    Place {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        latitude: f64,
        longitude: f64,
    },
    /// Free text passed to the geocoder.
    Query(String),
}

impl From<&Location> for DefaultLocation {
    fn from(location: &Location) -> Self {
        DefaultLocation::Place {
            name: location.toponym.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// IANA zone name, e.g. "Europe/Helsinki".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Example TOML:
    /// [default_location]
    /// name = "Hölmölä, Suomi"
    /// latitude = 61.0
    /// longitude = 24.4
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_location: Option<DefaultLocation>,
}

impl Config {
    /// Load config from the platform location, writing a commented template on first run.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    /// Load config from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Err(e) = write_template(path) {
                tracing::error!(path = %path.display(), "could not write config template: {e:#}");
            }
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), ?cfg, "loaded configuration");
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join(CONFIG_FILE))
    }

    /// Directory for cached data such as the ephemeris kernel.
    pub fn data_dir() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "weathercat")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

fn write_template(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }
    fs::write(path, TEMPLATE)
        .with_context(|| format!("Failed to write config template: {}", path.display()))
}
