use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PersonaError, Result};

/// Storage configuration for both stores.
///
/// Sourced from `personas.toml`, environment variables, or built explicitly;
/// no behavior depends on which source supplied the values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database holding the relational side.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Directory containing one `<agent>_personality.json` per agent.
    #[serde(default = "default_document_dir")]
    pub document_dir: String,

    /// How many distinct recent contexts a memory report includes.
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,
}

fn default_database_path() -> String {
    "personas.db".to_string()
}

fn default_document_dir() -> String {
    "personalities".to_string()
}

fn default_context_limit() -> usize {
    3
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            document_dir: default_document_dir(),
            context_limit: default_context_limit(),
        }
    }
}

impl StoreConfig {
    /// Load config from `personas.toml` in the current directory, falling
    /// back to environment variables and then defaults.
    pub fn load() -> Self {
        let path = Path::new("personas.toml");
        if let Ok(contents) = fs::read_to_string(path) {
            match toml::from_str::<StoreConfig>(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {:?}", path);
                    return config;
                }
                Err(e) => {
                    tracing::error!("Failed to parse {:?}: {}", path, e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults + env vars");
        Self::from_env()
    }

    /// Load from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = env::var("PERSONA_DB_PATH") {
            config.database_path = path;
        }

        if let Ok(dir) = env::var("PERSONA_DOC_DIR") {
            config.document_dir = dir;
        }

        if let Ok(limit) = env::var("PERSONA_CONTEXT_LIMIT") {
            if let Ok(limit) = limit.parse() {
                config.context_limit = limit;
            }
        }

        config
    }

    /// Parse a config from an explicit TOML file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        toml::from_str(&contents)
            .map_err(|e| PersonaError::Config(format!("{}: {}", path.as_ref().display(), e)))
    }

    pub fn database_path(&self) -> &Path {
        Path::new(&self.database_path)
    }

    pub fn document_dir(&self) -> PathBuf {
        PathBuf::from(&self.document_dir)
    }
}
