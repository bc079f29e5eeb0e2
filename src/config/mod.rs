use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::workspace::{
    WorkspaceSettings, DEFAULT_BUTTON_ZOOM_STEP, DEFAULT_WHEEL_ZOOM_STEP, MIN_SELECTION_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigPathError {
    #[error("neither the XDG directory nor HOME is set")]
    MissingHomeDirectory,
}

const APP_DIR: &str = "leafcrop";
const APP_CONFIG_FILE: &str = "config.json";

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub wheel_zoom_step: f64,
    pub button_zoom_step: f64,
    pub min_selection_px: f64,
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            wheel_zoom_step: DEFAULT_WHEEL_ZOOM_STEP,
            button_zoom_step: DEFAULT_BUTTON_ZOOM_STEP,
            min_selection_px: MIN_SELECTION_SIZE,
            data_dir: None,
        }
    }
}

impl AppConfig {
    /// Workspace tuning. Non-positive or non-finite values fall back to defaults.
    pub fn workspace_settings(&self) -> WorkspaceSettings {
        let positive_or = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        WorkspaceSettings {
            wheel_zoom_step: positive_or(self.wheel_zoom_step, DEFAULT_WHEEL_ZOOM_STEP),
            button_zoom_step: positive_or(self.button_zoom_step, DEFAULT_BUTTON_ZOOM_STEP),
            min_selection_size: positive_or(self.min_selection_px, MIN_SELECTION_SIZE),
        }
    }

    /// Session data directory: the configured one, else the XDG data home.
    pub fn resolve_data_dir(&self) -> Result<PathBuf, ConfigPathError> {
        if let Some(dir) = self.data_dir.as_ref().filter(|dir| !dir.as_os_str().is_empty()) {
            return Ok(dir.clone());
        }
        let xdg_data_home = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from);
        let home = std::env::var_os("HOME").map(PathBuf::from);
        app_data_dir(APP_DIR, xdg_data_home.as_deref(), home.as_deref())
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = xdg_root(xdg_config_home, home, ".config")?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

pub fn app_data_dir(
    app_dir: &str,
    xdg_data_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    Ok(xdg_root(xdg_data_home, home, ".local/share")?.join(app_dir))
}

fn xdg_root(
    xdg_dir: Option<&Path>,
    home: Option<&Path>,
    home_fallback: &str,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_dir.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(home_fallback))
}
