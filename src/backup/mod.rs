//! Backup system for Stockroom
//!
//! Provides scheduled daily/weekly backups, manual backups, retention and
//! validated restore.
//!
//! # Architecture
//!
//! - `BackupManager`: writes, validates, lists and rotates backup archives
//! - `BackupScheduler`: background thread running backup cycles on a timer
//!   or on request, raising `BACKUP_FAILED` alerts when a cycle fails
//! - `RestoreCoordinator`: exclusive, validated, atomic restore with a
//!   pre-restore safety backup
//!
//! # Backup Format
//!
//! Each backup is a gzip-compressed JSON document (`.json.gz`) holding:
//! - `schema_version`: ledger layout version
//! - `kind`: daily, weekly, manual or pre-restore
//! - `created_at`: snapshot timestamp
//! - `checksum`: SHA-256 of the ledger's items, employees and deliveries
//! - `ledger`: the full ledger document
//!
//! Files are named `<kind>-YYYYMMDD-HHMMSS-mmm.json.gz` and stored under
//! `backups/<kind>/`.
//!
//! # Example
//!
//! ```rust,ignore
//! use stockroom::backup::{BackupKind, BackupManager, RestoreCoordinator};
//!
//! let manager = BackupManager::new(paths.clone(), settings.backup.clone());
//! let record = manager.create_backup(&store, BackupKind::Manual)?;
//!
//! let coordinator = RestoreCoordinator::new(&store, &manager, &settings.alert);
//! let result = coordinator.restore(&record)?;
//! println!("{}", result.summary());
//! ```

mod archive;
mod manager;
mod restore;
mod scheduler;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use archive::BackupArchive;
pub use manager::{BackupManager, BackupReport, BackupState};
pub use restore::{RestoreCoordinator, RestoreResult};
pub use scheduler::{BackupScheduler, CycleOutcome, CycleState, SchedulerHandle};

/// Which schedule or trigger produced a backup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupKind {
    Daily,
    Weekly,
    Manual,
    PreRestore,
}

impl BackupKind {
    pub fn all() -> [BackupKind; 4] {
        [Self::Daily, Self::Weekly, Self::Manual, Self::PreRestore]
    }

    /// Directory under `backups/` and filename prefix
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Manual => "manual",
            Self::PreRestore => "pre-restore",
        }
    }

    /// Only scheduled backups are rotated by retention
    pub fn is_rotated(&self) -> bool {
        matches!(self, Self::Daily | Self::Weekly)
    }
}

impl fmt::Display for BackupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

impl FromStr for BackupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::all()
            .into_iter()
            .find(|kind| kind.dir_name() == normalized)
            .ok_or_else(|| format!("Unknown backup kind: {}", s))
    }
}

/// Result of the last integrity check of a backup file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityStatus {
    Unverified,
    Valid,
    Invalid,
}

impl fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unverified => write!(f, "unverified"),
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// A backup file on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub filename: String,
    pub path: PathBuf,
    pub kind: BackupKind,
    pub created_at: DateTime<Utc>,
    pub integrity: IntegrityStatus,
    pub compressed: bool,
    pub size_bytes: u64,
}
