//! Layered configuration.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. A TOML file: `--config PATH`, else `config.toml` in the platform
//!    config directory (skipped when absent)
//! 3. Environment variables prefixed `SPDEDUP_` (e.g. `SPDEDUP_IO_THREADS=8`)
//! 4. Command-line flags, applied by [`crate::RunOptions::resolve`]
//!
//! ```toml
//! io_threads = 8
//! chunk_size = 131072
//! recurse = true
//! only_ext = [".docx", ".xlsx"]
//! trash = false
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::scanner::hasher::DEFAULT_CHUNK_SIZE;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SPDEDUP_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker threads for digesting and document scans.
    pub io_threads: usize,
    /// Read buffer size for file digests, in bytes.
    pub chunk_size: usize,
    /// Descend into subdirectories.
    pub recurse: bool,
    /// Extension filter; empty means every file.
    pub only_ext: Vec<String>,
    /// Move duplicates to the trash instead of deleting them.
    pub trash: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: 4,
            chunk_size: DEFAULT_CHUNK_SIZE,
            recurse: false,
            only_ext: Vec::new(),
            trash: false,
        }
    }
}

impl Config {
    /// Load from defaults, the config file and the environment.
    ///
    /// # Errors
    ///
    /// Fails if an explicitly given file does not exist, or if any source
    /// holds a value of the wrong type.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => {
                if !path.is_file() {
                    bail!("Config file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Self::default_path().filter(|p| p.is_file()),
        };

        if let Some(ref path) = file {
            log::debug!("Loading config from {}", path.display());
        }
        Self::figment(file.as_deref())
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .context("Invalid configuration")
    }

    /// Defaults merged with an optional TOML file.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        match file {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment,
        }
    }

    /// Platform-specific location of `config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "spdedup", "spdedup")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
