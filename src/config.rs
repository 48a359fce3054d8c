// src/config.rs
//
// Catalog configuration
//
// Layering (later wins):
// 1. Built-in defaults
// 2. moddb.toml in the working directory
// 3. MODDB__ prefixed environment variables, `__` separating sections
//    (e.g. MODDB__STORAGE__ORPHAN_BATCH_SIZE=512)

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

pub const CONFIG_FILE: &str = "moddb.toml";
pub const ENV_PREFIX: &str = "MODDB__";

/// Largest number of ids deleted by one orphan-reclamation statement.
pub const DEFAULT_ORPHAN_BATCH_SIZE: usize = 1024;

/// Rows per multi-row association insert. Two parameters per row keeps this
/// under SQLite's default host-parameter limit.
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 400;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file. Defaults to `{data_dir}/moddb/moddb.db`.
    pub path: Option<PathBuf>,
    pub pool_size: u32,
    pub busy_timeout_ms: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: 15,
            busy_timeout_ms: 5000,
        }
    }
}

impl DatabaseConfig {
    /// Configuration pointing at an explicit database file
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    pub orphan_batch_size: usize,
    pub insert_batch_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            orphan_batch_size: DEFAULT_ORPHAN_BATCH_SIZE,
            insert_batch_size: DEFAULT_INSERT_BATCH_SIZE,
        }
    }
}

impl CatalogConfig {
    /// Load configuration from defaults, `moddb.toml` and the environment.
    pub fn load() -> AppResult<Self> {
        Self::figment().extract().map_err(|e| Box::new(e).into())
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(CatalogConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
