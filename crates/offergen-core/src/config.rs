//! Template configuration
//!
//! The id namespaces differ per deployment of the system of record.
//! Loaded from TOML, falls back to defaults if no config file exists.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::vocab;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Id prefix of documents coming from the system of record. Rewritten to
    /// `temp_id_prefix` on load.
    pub id_prefix: String,
    /// Prefix of every node id while editing.
    pub temp_id_prefix: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            id_prefix: vocab::ID_PREFIX.into(),
            temp_id_prefix: vocab::TEMP_ID_PREFIX.into(),
        }
    }
}

impl TemplateConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {} (using defaults)", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {} (using defaults)", path.display());
                Self::default()
            }
        }
    }

    /// Render the config as TOML (for generating a config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
