//! File system paths for PartyHaus runtime files.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Directory name under the home directory.
const BASE_DIR_NAME: &str = ".partyhaus";

/// Manages file system paths.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.partyhaus)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.partyhaus`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// `config.json` under the base directory.
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// SQLite file holding events, guests, email logs and email events.
    pub fn database_file(&self) -> PathBuf {
        self.base_dir.join("partyhaus.sqlite")
    }

    /// Local storage file for the persisted session subset and auth tokens.
    pub fn local_storage_file(&self) -> PathBuf {
        self.base_dir.join("client-state.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Central JSONL log file shared by every service.
    pub fn dev_log_file(&self) -> PathBuf {
        self.logs_dir().join("dev.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
