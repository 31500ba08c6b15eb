//! Runtime configuration, stored as TOML.
//!
//! ```toml
//! data_dir = "lexigraph-data"
//! batch_size = 1000
//!
//! [[relations]]
//! name = "broader"
//! inverse = "narrower"
//! rel_type = "taxonomic"
//! canonical = true
//! ```
//!
//! An empty (or missing) `relations` table selects the built-in WordNet taxonomy.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::augment::AugmentConfig;
use crate::error::ConfigError;
use crate::relation::{RelationSpec, RelationTaxonomy};

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiConfig {
    /// Directory holding the redb database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Items processed between batch flushes during augmentation.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Custom relation table; replaces the WordNet default when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<RelationSpec>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("lexigraph-data")
}

fn default_batch_size() -> usize {
    1000
}

impl Default for LexiConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            batch_size: default_batch_size(),
            relations: Vec::new(),
        }
    }
}

impl LexiConfig {
    /// Load from a TOML file and validate.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        // Surface inverse conflicts at load time rather than on first use.
        self.taxonomy().map(|_| ())
    }

    /// The relation taxonomy this configuration selects.
    pub fn taxonomy(&self) -> ConfigResult<RelationTaxonomy> {
        if self.relations.is_empty() {
            Ok(RelationTaxonomy::wordnet())
        } else {
            RelationTaxonomy::from_specs(&self.relations)
        }
    }

    pub fn augment_config(&self) -> AugmentConfig {
        AugmentConfig {
            batch_size: self.batch_size,
        }
    }
}
