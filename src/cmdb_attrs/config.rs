//! # Configuration
//!
//! Configuration is managed by [`confique`], layered in priority order:
//! 1. **Environment variables**: `CMDB_ATTRS_USE_ES`, `CMDB_ATTRS_DATA_DIR`.
//! 2. **Config file**: `config.toml` in the OS config directory, or the path
//!    passed with `--config`. A missing file is not an error.
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `search_index.enabled` | `false` | Push field mappings for new attributes |
//! | `search_index.text_analyzer` | `ik_max_word` | Index-time analyzer for text fields |
//! | `search_index.text_search_analyzer` | `ik_smart` | Query-time analyzer for text fields |
//! | `search_index.keyword_ignore_above` | `256` | Length cap of the `keyword` sub-field |
//! | `store.data_dir` | OS data dir | Where `attributes.json` lives |

use crate::error::{AttrError, Result};
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct AttrsConfig {
    #[config(nested)]
    pub search_index: SearchIndexConfig,

    #[config(nested)]
    pub store: StoreConfig,
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchIndexConfig {
    #[config(env = "CMDB_ATTRS_USE_ES", default = false)]
    pub enabled: bool,

    #[config(default = "ik_max_word")]
    pub text_analyzer: String,

    #[config(default = "ik_smart")]
    pub text_search_analyzer: String,

    #[config(default = 256)]
    pub keyword_ignore_above: u32,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            text_analyzer: "ik_max_word".to_string(),
            text_search_analyzer: "ik_smart".to_string(),
            keyword_ignore_above: 256,
        }
    }
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreConfig {
    #[config(env = "CMDB_ATTRS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl AttrsConfig {
    /// Load from environment and, when given and present, a TOML file.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = file.filter(|p| p.exists()) {
            builder = builder.file(path);
        }
        builder.load().map_err(|e| AttrError::Config(e.to_string()))
    }
}
