//! Configuration for loading lineages and building muxers
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (lineage.toml)
//! - Environment variables (LINEAGE__*)
//!
//! ## Example config file (lineage.toml):
//! ```toml
//! [translation]
//! reverse = true
//!
//! [bind]
//! skip_buggy_checks = false
//! strict_compatibility = false
//!
//! [endec]
//! output_format = "compact"
//! ```
//!
//! Environment variables use `__` between sections, e.g.
//! `LINEAGE__BIND__SKIP_BUGGY_CHECKS=true`.

use std::path::Path;

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::endec::JsonEndec;
use crate::error::ConfigError;
use crate::lineage::LineageOptions;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineageConfig {
    #[serde(default)]
    pub translation: TranslationConfig,

    #[serde(default)]
    pub bind: BindConfig,

    #[serde(default)]
    pub endec: EndecConfig,
}

/// Translation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Allow translating values to older versions
    #[serde(default)]
    pub reverse: bool,
}

/// Checks applied when a lineage is loaded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindConfig {
    /// Skip the major-bump-must-break check
    #[serde(default)]
    pub skip_buggy_checks: bool,

    /// Treat any schema change as breaking
    #[serde(default)]
    pub strict_compatibility: bool,
}

/// Endec settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndecConfig {
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pretty,
    #[default]
    Compact,
}

impl LineageConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["lineage.toml", ".lineage.toml", "config/lineage.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(dirs) = directories::ProjectDirs::from("dev", "schema-lineage", "lineage") {
            let xdg_config = dirs.config_dir().join("lineage.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("LINEAGE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Options to load lineages with, rejecting contradictory settings
    pub fn lineage_options(&self) -> Result<LineageOptions, ConfigError> {
        let options = LineageOptions {
            reverse_translation: self.translation.reverse,
            skip_buggy_checks: self.bind.skip_buggy_checks,
            strict_compatibility: self.bind.strict_compatibility,
        };
        options.validate()?;
        Ok(options)
    }

    /// A JSON endec writing in the configured format
    pub fn json_endec(&self, name: impl Into<String>) -> JsonEndec {
        JsonEndec::new(name).with_format(self.endec.output_format)
    }
}
