//! Path management for Stockroom
//!
//! Provides XDG-compliant path resolution for configuration, data, and backups.
//!
//! ## Path Resolution Order
//!
//! 1. `STOCKROOM_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/stockroom` or `~/.config/stockroom`
//! 3. Windows: `%APPDATA%\stockroom`

use std::path::PathBuf;

use crate::backup::BackupKind;
use crate::error::StockroomError;

/// Manages all paths used by Stockroom
#[derive(Debug, Clone)]
pub struct StockroomPaths {
    /// Base directory for all Stockroom data
    base_dir: PathBuf,
}

impl StockroomPaths {
    /// Create a new StockroomPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, StockroomError> {
        let base_dir = if let Ok(custom) = std::env::var("STOCKROOM_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create StockroomPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (`<base>/data/`)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the backup root directory (`<base>/backups/`)
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Get the directory holding backups of one kind
    pub fn backup_kind_dir(&self, kind: BackupKind) -> PathBuf {
        self.backup_dir().join(kind.dir_name())
    }

    /// Get the path to the persisted scheduler state
    pub fn backup_state_file(&self) -> PathBuf {
        self.backup_dir().join("backup_state.json")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to the ledger document (items, employees, deliveries, alerts)
    pub fn ledger_file(&self) -> PathBuf {
        self.data_dir().join("ledger.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), StockroomError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| StockroomError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| StockroomError::Io(format!("Failed to create data directory: {}", e)))?;

        for kind in BackupKind::all() {
            std::fs::create_dir_all(self.backup_kind_dir(kind)).map_err(|e| {
                StockroomError::Io(format!("Failed to create backup directory: {}", e))
            })?;
        }

        Ok(())
    }

    /// Check if Stockroom has been initialized (ledger file exists)
    pub fn is_initialized(&self) -> bool {
        self.ledger_file().exists()
    }
}

/// Resolve the default data directory path based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, StockroomError> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("stockroom"));
    }
    let base = directories::BaseDirs::new()
        .ok_or_else(|| StockroomError::Config("Could not determine home directory".into()))?;
    Ok(base.home_dir().join(".config").join("stockroom"))
}

/// Resolve the default data directory path based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, StockroomError> {
    let base = directories::BaseDirs::new()
        .ok_or_else(|| StockroomError::Config("Could not determine APPDATA directory".into()))?;
    Ok(base.config_dir().join("stockroom"))
}
