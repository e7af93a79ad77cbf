//! Configuration module for the faxt CLI.
//!
//! The heap demo has far fewer knobs than a build tool: a default capacity
//! for freshly created heaps, and whether the symbol table and GC should
//! log verbosely. This mirrors [`fgc::HeapOptions`] but at the CLI layer,
//! with its own default heap path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FaxtError, Result};

/// Default configuration file name, read from the current directory if
/// present.
pub const CONFIG_FILE_NAME: &str = "faxt.json";

/// Default heap capacity in bytes for `faxt new` when no `--capacity` flag
/// is given.
const DEFAULT_HEAP_CAPACITY: usize = 1 << 20;

/// Default heap file path for commands that don't specify one.
fn default_heap_path() -> String {
    "heap.fgc".to_string()
}

/// Application configuration for the faxt CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Global verbose setting, forwarded to [`fgc::HeapOptions::verbose`].
    #[serde(default)]
    pub verbose: bool,

    /// Default path to a heap file.
    #[serde(default = "default_heap_path")]
    pub heap_path: String,

    /// Default capacity, in bytes, for newly created heaps.
    #[serde(default = "default_heap_capacity")]
    pub heap_capacity: usize,
}

fn default_heap_capacity() -> usize {
    DEFAULT_HEAP_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self { verbose: false, heap_path: default_heap_path(), heap_capacity: DEFAULT_HEAP_CAPACITY }
    }
}

impl Config {
    /// Loads configuration from `./faxt.json` in the current directory,
    /// falling back to defaults if it doesn't exist.
    pub fn load() -> Result<Self> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FaxtError::Config(format!("configuration file not found: {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| FaxtError::Config(format!("failed to parse configuration: {e}")))?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
