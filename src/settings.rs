//! Code for loading program settings.
use crate::get_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::{Context, Result};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# This file contains the program settings for battery-appraisal.
# Remove the leading '#' from a line to change a setting.
";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Where the settings file is read from
pub fn get_settings_file_path() -> PathBuf {
    get_config_dir().join(SETTINGS_FILE_NAME)
}

/// Program settings from config file
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether to overwrite output files by default
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
        }
    }
}

impl Settings {
    /// Read the settings file from the user's config directory, falling back to defaults if
    /// there isn't one
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if file_path.is_file() {
            read_toml(file_path)
        } else {
            Ok(Settings::default())
        }
    }

    /// A settings file holding the defaults, with every setting commented out and preceded by its
    /// description
    pub fn default_file_contents() -> Result<String> {
        let defaults = toml::Table::try_from(Settings::default())?;

        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for (field, value) in &defaults {
            let docs = Settings::get_field_docs(field)
                .ok()
                .with_context(|| format!("No description for setting {field}"))?;
            writeln!(out)?;
            for line in docs.lines() {
                writeln!(out, "# # {}", line.trim())?;
            }
            writeln!(out, "# {field} = {value}")?;
        }

        Ok(out)
    }
}
