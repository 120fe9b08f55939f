//! Catalog configuration loaded from TOML.
//!
//! ```toml
//! [catalog]
//! path = ".vinotheca/catalog.jsonl"
//!
//! [rules]
//! duplicate_grape_policy = "permissive"  # or reject_conflicting / reject_duplicates
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use vinotheca_kernel::DuplicateGrapePolicy;

pub const DEFAULT_CONFIG_PATH: &str = ".vinotheca/config.toml";
pub const DEFAULT_CATALOG_PATH: &str = ".vinotheca/catalog.jsonl";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VinothecaConfig {
    pub catalog: CatalogSection,
    pub rules: RulesSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSection {
    pub path: PathBuf,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CATALOG_PATH),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesSection {
    pub duplicate_grape_policy: DuplicateGrapePolicy,
}

impl VinothecaConfig {
    /// Load config from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config not found, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::ParseToml {
            path: path.display().to_string(),
            source,
        })
    }
}
