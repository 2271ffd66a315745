//! Backup restoration for Stockroom
//!
//! Restore holds the store's exclusive gate from start to finish. Nothing
//! touches the live ledger until a safety backup exists and the target
//! archive has passed verification. Alerts are swept on the restored ledger
//! before the swap, so the swap is the only write.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::audit::AuditEntry;
use crate::config::AlertSettings;
use crate::error::{StockroomError, StockroomResult};
use crate::models::AlertKind;
use crate::services::alert::raise_in;
use crate::services::{AlertChanges, AlertEngine};
use crate::storage::{DatasetCounts, ExclusiveAccess, Store};

use super::archive::BackupArchive;
use super::manager::BackupManager;
use super::{BackupKind, BackupRecord};

/// Result of a restore operation
#[derive(Debug, Clone)]
pub struct RestoreResult {
    /// Backup that was restored
    pub source: PathBuf,
    /// Safety backup of the state that was replaced
    pub pre_restore: PathBuf,
    pub kind: BackupKind,
    /// When the restored backup was taken
    pub backup_date: DateTime<Utc>,
    pub counts: DatasetCounts,
    /// Ledger checksum after restore
    pub checksum: String,
    /// Alert changes from the post-restore sweep
    pub alerts: AlertChanges,
}

impl RestoreResult {
    pub fn summary(&self) -> String {
        format!(
            "Restored {} backup from {}: {} items, {} employees, {} deliveries, {} active alerts",
            self.kind,
            self.backup_date.format("%Y-%m-%d %H:%M:%S"),
            self.counts.items,
            self.counts.employees,
            self.counts.deliveries,
            self.counts.active_alerts
        )
    }
}

pub struct RestoreCoordinator<'a> {
    store: &'a Store,
    manager: &'a BackupManager,
    alert_settings: &'a AlertSettings,
}

impl<'a> RestoreCoordinator<'a> {
    pub fn new(
        store: &'a Store,
        manager: &'a BackupManager,
        alert_settings: &'a AlertSettings,
    ) -> Self {
        Self {
            store,
            manager,
            alert_settings,
        }
    }

    /// Replace the live ledger with the contents of `record`
    pub fn restore(&self, record: &BackupRecord) -> StockroomResult<RestoreResult> {
        let exclusive = self.store.lock_exclusive()?;
        let now = Utc::now();

        let current = exclusive.snapshot()?;
        let safety = self
            .manager
            .create_backup_from(&current, BackupKind::PreRestore, now)?;
        info!(backup = %safety.filename, "pre-restore safety backup created");

        let archive = BackupArchive::read_verified(&record.path).map_err(|e| {
            warn!(backup = %record.filename, error = %e, "restore target rejected");
            StockroomError::RestoreValidation(e.to_string())
        })?;

        let mut ledger = archive.ledger;
        let alerts = AlertEngine::new(self.store, self.alert_settings).sweep_in(&mut ledger, now);
        let counts = ledger.counts();
        let checksum = ledger.checksum()?;

        if let Err(e) = exclusive.replace(ledger) {
            error!(
                backup = %record.filename,
                pre_restore = %safety.path.display(),
                error = %e,
                "restore failed while swapping the ledger"
            );
            self.raise_system_error(
                &exclusive,
                format!(
                    "Restore of {} failed: {}. Pre-restore backup: {}",
                    record.filename,
                    e,
                    safety.path.display()
                ),
                now,
            );
            return Err(StockroomError::RestoreFailed {
                reason: e.to_string(),
                pre_restore: safety.path,
            });
        }
        drop(exclusive);

        let result = RestoreResult {
            source: record.path.clone(),
            pre_restore: safety.path,
            kind: archive.kind,
            backup_date: archive.created_at,
            counts,
            checksum,
            alerts,
        };

        info!(backup = %record.filename, checksum = %result.checksum, "restore complete");
        self.store
            .record_audit(&[AuditEntry::restore(record.filename.clone(), result.summary())]);
        Ok(result)
    }

    /// Record a failed restore as SYSTEM_ERROR. The ledger may be the thing
    /// that cannot be written, so a failure here is only logged.
    fn raise_system_error(
        &self,
        exclusive: &ExclusiveAccess<'_>,
        message: String,
        now: DateTime<Utc>,
    ) {
        let raised = exclusive.transaction(|data| {
            let kind = AlertKind::SystemError;
            Ok(raise_in(data, kind, kind.default_severity(), None, message, now))
        });
        if let Err(e) = raised {
            error!(error = %e, "could not record SYSTEM_ERROR for the failed restore");
        }
    }
}
