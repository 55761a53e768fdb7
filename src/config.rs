//! User configuration (`config.toml`).

use anyhow::{Context, Result};
use directories::ProjectDirs;
use minisheet_core::MinisheetError;
use minisheet_core::document::GridGeometry;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Row height and column width in terminal cells.
const TERMINAL_ROW_HEIGHT: f64 = 1.0;
const TERMINAL_COL_WIDTH: f64 = 12.0;

const DEFAULT_DEBOUNCE_MS: u64 = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub grid: GridConfig,
    pub persistence: PersistenceConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub row_height: Option<f64>,
    pub col_width: Option<f64>,
    pub buffer: Option<usize>,
    pub initial_rows: Option<usize>,
    pub initial_cols: Option<usize>,
}

impl GridConfig {
    /// Windower geometry in terminal units.
    pub fn geometry(&self) -> GridGeometry {
        let defaults = GridGeometry::default();
        GridGeometry {
            row_height: self.row_height.unwrap_or(TERMINAL_ROW_HEIGHT),
            col_width: self.col_width.unwrap_or(TERMINAL_COL_WIDTH),
            buffer: self.buffer.unwrap_or(defaults.buffer),
            initial_rows: self.initial_rows.unwrap_or(defaults.initial_rows),
            initial_cols: self.initial_cols.unwrap_or(defaults.initial_cols),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PersistenceConfig {
    pub debounce_ms: u64,
    pub store_dir: Option<PathBuf>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        PersistenceConfig {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            store_dir: None,
        }
    }
}

impl PersistenceConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    pub url: Option<String>,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "minisheet")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|proj| proj.config_dir().join("config.toml"))
}

pub fn default_data_dir() -> Option<PathBuf> {
    project_dirs().map(|proj| proj.data_dir().to_path_buf())
}

impl Config {
    pub fn parse(text: &str) -> Result<Config> {
        let config: Config =
            toml::from_str(text).map_err(|e| MinisheetError::Config(e.to_string()))?;
        for (name, value) in [
            ("grid.row_height", config.grid.row_height),
            ("grid.col_width", config.grid.col_width),
        ] {
            if let Some(value) = value
                && !(value.is_finite() && value > 0.0)
            {
                let message = format!("{} must be positive, got {}", name, value);
                return Err(MinisheetError::Config(message).into());
            }
        }
        Ok(config)
    }

    /// Load from an explicit path (must exist) or from the default location
    /// (missing file means defaults).
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Config::default()),
            },
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Config::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Directory the sheet is persisted in.
    pub fn store_dir(&self) -> Option<PathBuf> {
        self.persistence.store_dir.clone().or_else(default_data_dir)
    }
}
