use std::{
    env,
    path::{Path, PathBuf},
};

use config::{Config, File};
use log::debug;
use serde::Deserialize;

use crate::api::forum::DEFAULT_BASE_URL;
use crate::cli::Args;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    pub base_url: Option<String>,
}

const CONFIG_FILE_NAME: &str = env!("CARGO_PKG_NAME");

// Function to get the XDG_CONFIG_HOME path
fn get_xdg_config_path() -> Option<PathBuf> {
    // First check XDG_CONFIG_HOME environment variable
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config));
    }

    // If XDG_CONFIG_HOME is not set, fall back to $HOME/.config
    if let Ok(home) = env::var("HOME") {
        return Some(PathBuf::from(home).join(".config"));
    }

    None
}

/// Directory for state that must survive restarts, e.g. the login session.
pub fn get_xdg_data_path() -> Option<PathBuf> {
    if let Ok(xdg_data) = env::var("XDG_DATA_HOME") {
        return Some(PathBuf::from(xdg_data).join(CONFIG_FILE_NAME));
    }

    if let Ok(home) = env::var("HOME") {
        return Some(
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join(CONFIG_FILE_NAME),
        );
    }

    None
}

pub fn load_settings_from(config_path: &Path) -> anyhow::Result<Settings> {
    if !config_path.exists() {
        return Ok(Settings::default());
    }

    Config::builder()
        .add_source(File::from(config_path.to_path_buf()).required(false))
        .build()?
        .try_deserialize()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to deserialize config file {}: {}",
                config_path.display(),
                e
            )
        })
}

pub fn load_settings() -> anyhow::Result<Settings> {
    match get_xdg_config_path() {
        Some(xdg_config) => {
            load_settings_from(&xdg_config.join(CONFIG_FILE_NAME).join("config.toml"))
        }
        None => Ok(Settings::default()),
    }
}

/// CLI flag or env wins, then the config file, then the built-in default.
pub fn resolve_base_url(cli_url: Option<&str>, settings: &Settings) -> String {
    cli_url
        .filter(|url| !url.trim().is_empty())
        .or(settings.base_url.as_deref().filter(|url| !url.trim().is_empty()))
        .unwrap_or(DEFAULT_BASE_URL)
        .to_string()
}

pub fn merge_settings_with_args(args: &Args) -> anyhow::Result<Args> {
    let settings = load_settings()?;

    let mut new_args = args.clone();
    new_args.url = Some(resolve_base_url(args.url.as_deref(), &settings));

    debug!("merged config: {:?}", new_args);

    Ok(new_args)
}
