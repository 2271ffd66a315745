//! Backup manager for Stockroom
//!
//! Writes gzip-compressed ledger archives into per-kind directories,
//! validates them after writing, lists them and enforces retention.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::paths::StockroomPaths;
use crate::config::BackupSettings;
use crate::error::{StockroomError, StockroomResult};
use crate::storage::{
    read_json, write_bytes_atomic, write_json_atomic, Dataset, DatasetCounts, Store,
};

use super::archive::BackupArchive;
use super::{BackupKind, BackupRecord, IntegrityStatus};

const BACKUP_SUFFIX: &str = ".json.gz";

/// Persisted scheduler bookkeeping (`backups/backup_state.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupState {
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_backup: Option<String>,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub failure_count: u64,
    pub last_error: Option<String>,
}

/// What a backup file contains, and whether it passed validation
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub record: BackupRecord,
    pub schema_version: Option<u32>,
    pub checksum: Option<String>,
    pub counts: Option<DatasetCounts>,
    /// Validation failure, if any
    pub problem: Option<String>,
}

impl BackupReport {
    pub fn is_valid(&self) -> bool {
        self.problem.is_none()
    }

    pub fn summary(&self) -> String {
        match (&self.counts, &self.problem) {
            (Some(counts), None) => format!(
                "Valid backup: {} items, {} employees, {} deliveries",
                counts.items, counts.employees, counts.deliveries
            ),
            (_, Some(problem)) => format!("Invalid backup: {}", problem),
            (None, None) => "Backup not inspected".to_string(),
        }
    }
}

/// Manages backup creation, validation and retention
#[derive(Debug, Clone)]
pub struct BackupManager {
    paths: StockroomPaths,
    settings: BackupSettings,
}

impl BackupManager {
    pub fn new(paths: StockroomPaths, settings: BackupSettings) -> Self {
        Self { paths, settings }
    }

    pub fn settings(&self) -> &BackupSettings {
        &self.settings
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.paths.backup_dir()
    }

    /// Snapshot the live store and write a validated backup
    pub fn create_backup(&self, store: &Store, kind: BackupKind) -> StockroomResult<BackupRecord> {
        self.create_backup_at(store, kind, Utc::now())
    }

    pub fn create_backup_at(
        &self,
        store: &Store,
        kind: BackupKind,
        now: DateTime<Utc>,
    ) -> StockroomResult<BackupRecord> {
        let snapshot = store.snapshot()?;
        self.create_backup_from(&snapshot, kind, now)
    }

    /// Write and validate a backup of an already-taken snapshot
    pub fn create_backup_from(
        &self,
        snapshot: &Dataset,
        kind: BackupKind,
        now: DateTime<Utc>,
    ) -> StockroomResult<BackupRecord> {
        let record = self.write_archive(snapshot, kind, now)?;
        self.validate_written(record)
    }

    /// Serialize, compress and atomically write the archive. The returned
    /// record is not yet verified.
    pub fn write_archive(
        &self,
        snapshot: &Dataset,
        kind: BackupKind,
        now: DateTime<Utc>,
    ) -> StockroomResult<BackupRecord> {
        let archive = BackupArchive::new(snapshot.clone(), kind, now)?;
        let bytes = archive.encode()?;

        let filename = backup_filename(kind, now);
        let path = self.paths.backup_kind_dir(kind).join(&filename);
        write_bytes_atomic(&path, &bytes).map_err(|e| StockroomError::BackupIo(e.to_string()))?;

        debug!(path = %path.display(), bytes = bytes.len(), "backup archive written");

        Ok(BackupRecord {
            filename,
            path,
            kind,
            created_at: now,
            integrity: IntegrityStatus::Unverified,
            compressed: true,
            size_bytes: bytes.len() as u64,
        })
    }

    /// Re-read a freshly written archive; an invalid file is deleted
    pub fn validate_written(&self, mut record: BackupRecord) -> StockroomResult<BackupRecord> {
        match BackupArchive::read_verified(&record.path) {
            Ok(_) => {
                record.integrity = IntegrityStatus::Valid;
                info!(backup = %record.filename, kind = %record.kind, "backup created");
                Ok(record)
            }
            Err(e) => {
                warn!(backup = %record.filename, error = %e, "backup failed validation, removing");
                if let Err(remove_err) = fs::remove_file(&record.path) {
                    warn!(error = %remove_err, "failed to remove invalid backup");
                }
                Err(e)
            }
        }
    }

    /// Read and fully verify a backup
    pub fn load_verified(&self, record: &BackupRecord) -> StockroomResult<BackupArchive> {
        BackupArchive::read_verified(&record.path)
    }

    /// Validate a backup without restoring it
    pub fn inspect(&self, record: &BackupRecord) -> BackupReport {
        let mut record = record.clone();
        match BackupArchive::read_verified(&record.path) {
            Ok(archive) => {
                record.integrity = IntegrityStatus::Valid;
                BackupReport {
                    record,
                    schema_version: Some(archive.schema_version),
                    checksum: Some(archive.checksum),
                    counts: Some(archive.ledger.counts()),
                    problem: None,
                }
            }
            Err(e) => {
                record.integrity = IntegrityStatus::Invalid;
                BackupReport {
                    record,
                    schema_version: None,
                    checksum: None,
                    counts: None,
                    problem: Some(e.to_string()),
                }
            }
        }
    }

    /// Backups of one kind, or of every kind, newest first
    pub fn list_backups(&self, kind: Option<BackupKind>) -> StockroomResult<Vec<BackupRecord>> {
        let kinds: Vec<BackupKind> = match kind {
            Some(kind) => vec![kind],
            None => BackupKind::all().to_vec(),
        };

        let mut backups = Vec::new();
        for kind in kinds {
            let dir = self.paths.backup_kind_dir(kind);
            if !dir.is_dir() {
                continue;
            }

            let entries = fs::read_dir(&dir).map_err(|e| {
                StockroomError::BackupIo(format!("Failed to read backup directory: {}", e))
            })?;
            for entry in entries {
                let entry = entry.map_err(|e| {
                    StockroomError::BackupIo(format!("Failed to read directory entry: {}", e))
                })?;
                if let Some(record) = parse_backup_record(&entry.path(), kind) {
                    backups.push(record);
                }
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    /// Find a backup by filename in any kind directory
    pub fn get_backup(&self, filename: &str) -> StockroomResult<Option<BackupRecord>> {
        let filename = filename.trim();
        Ok(self
            .list_backups(None)?
            .into_iter()
            .find(|b| b.filename == filename))
    }

    /// Like [`get_backup`](Self::get_backup) but missing is an error
    pub fn require_backup(&self, filename: &str) -> StockroomResult<BackupRecord> {
        self.get_backup(filename)?
            .ok_or_else(|| StockroomError::backup_not_found(filename))
    }

    pub fn latest(&self, kind: Option<BackupKind>) -> StockroomResult<Option<BackupRecord>> {
        Ok(self.list_backups(kind)?.into_iter().next())
    }

    /// Delete the oldest backups of a rotated kind beyond its retention count
    pub fn enforce_retention(&self, kind: BackupKind) -> StockroomResult<Vec<PathBuf>> {
        let keep = match kind {
            BackupKind::Daily => self.settings.retention_daily,
            BackupKind::Weekly => self.settings.retention_weekly,
            BackupKind::Manual | BackupKind::PreRestore => return Ok(Vec::new()),
        };

        let mut deleted = Vec::new();
        for backup in self.list_backups(Some(kind))?.into_iter().skip(keep as usize) {
            fs::remove_file(&backup.path).map_err(|e| {
                StockroomError::BackupIo(format!("Failed to delete old backup: {}", e))
            })?;
            info!(backup = %backup.filename, "old backup removed by retention");
            deleted.push(backup.path);
        }

        Ok(deleted)
    }

    /// Retention for every rotated kind
    pub fn prune(&self) -> StockroomResult<Vec<PathBuf>> {
        let mut deleted = self.enforce_retention(BackupKind::Daily)?;
        deleted.extend(self.enforce_retention(BackupKind::Weekly)?);
        Ok(deleted)
    }

    /// Weekly on the configured weekday unless today already has one
    pub fn next_scheduled_kind(&self, now: DateTime<Utc>) -> StockroomResult<BackupKind> {
        if now.weekday() != self.settings.weekly_day {
            return Ok(BackupKind::Daily);
        }
        let today = now.date_naive();
        let weekly_done = self
            .list_backups(Some(BackupKind::Weekly))?
            .iter()
            .any(|b| b.created_at.date_naive() == today);
        Ok(if weekly_done {
            BackupKind::Daily
        } else {
            BackupKind::Weekly
        })
    }

    pub fn state(&self) -> StockroomResult<BackupState> {
        read_json(self.paths.backup_state_file())
    }

    pub fn save_state(&self, state: &BackupState) -> StockroomResult<()> {
        write_json_atomic(self.paths.backup_state_file(), state)
    }
}

/// `<kind>-YYYYMMDD-HHMMSS-mmm.json.gz`
fn backup_filename(kind: BackupKind, at: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{:03}{}",
        kind.dir_name(),
        at.format("%Y%m%d-%H%M%S"),
        at.timestamp_subsec_millis(),
        BACKUP_SUFFIX
    )
}

fn parse_backup_record(path: &Path, kind: BackupKind) -> Option<BackupRecord> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    let stamp = filename
        .strip_prefix(kind.dir_name())?
        .strip_prefix('-')?
        .strip_suffix(BACKUP_SUFFIX)?;
    let created_at = parse_backup_timestamp(stamp)?;
    let size_bytes = fs::metadata(path).ok()?.len();

    Some(BackupRecord {
        filename,
        path: path.to_path_buf(),
        kind,
        created_at,
        integrity: IntegrityStatus::Unverified,
        compressed: true,
        size_bytes,
    })
}

/// Parse `YYYYMMDD-HHMMSS-mmm`
fn parse_backup_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    let mut parts = stamp.split('-');
    let date_part = parts.next()?;
    let time_part = parts.next()?;
    let millis: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || date_part.len() != 8 || time_part.len() != 6 {
        return None;
    }

    let year: i32 = date_part.get(0..4)?.parse().ok()?;
    let month: u32 = date_part.get(4..6)?.parse().ok()?;
    let day: u32 = date_part.get(6..8)?.parse().ok()?;
    let hour: u32 = time_part.get(0..2)?.parse().ok()?;
    let minute: u32 = time_part.get(2..4)?.parse().ok()?;
    let second: u32 = time_part.get(4..6)?.parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let datetime = date.and_hms_milli_opt(hour, minute, second, millis)?;
    Some(datetime.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use crate::storage::LockPolicy;
    use chrono::{Duration, TimeZone, Weekday};
    use tempfile::TempDir;

    fn setup(settings: BackupSettings) -> (TempDir, Store, BackupManager) {
        let temp_dir = TempDir::new().unwrap();
        let paths = StockroomPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = Store::open(paths.clone(), LockPolicy::default()).unwrap();
        let item = Item::new("Stapler", "Desk", 2, 10).with_quantity(4);
        store
            .transaction(|data| {
                data.items.insert(item.id, item);
                Ok(())
            })
            .unwrap();
        let manager = BackupManager::new(paths, settings);
        (temp_dir, store, manager)
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 2, 0, 0).unwrap()
    }

    #[test]
    fn test_create_backup_is_compressed_and_valid() {
        let (_temp, store, manager) = setup(BackupSettings::default());

        let record = manager.create_backup(&store, BackupKind::Manual).unwrap();

        assert!(record.path.exists());
        assert!(record.filename.starts_with("manual-"));
        assert!(record.filename.ends_with(".json.gz"));
        assert_eq!(record.integrity, IntegrityStatus::Valid);
        assert!(record.path.parent().unwrap().ends_with("manual"));

        let archive = manager.load_verified(&record).unwrap();
        assert_eq!(archive.checksum, store.ledger_checksum().unwrap());
    }

    #[test]
    fn test_list_backups_newest_first_and_by_kind() {
        let (_temp, store, manager) = setup(BackupSettings::default());
        manager.create_backup_at(&store, BackupKind::Daily, at(1)).unwrap();
        manager.create_backup_at(&store, BackupKind::Weekly, at(2)).unwrap();
        manager.create_backup_at(&store, BackupKind::Daily, at(3)).unwrap();

        let all = manager.list_backups(None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].created_at, at(3));
        assert_eq!(all[2].created_at, at(1));

        assert_eq!(manager.list_backups(Some(BackupKind::Daily)).unwrap().len(), 2);
        assert_eq!(manager.latest(Some(BackupKind::Weekly)).unwrap().unwrap().created_at, at(2));
    }

    #[test]
    fn test_retention_keeps_newest_seven_daily() {
        let (_temp, store, manager) = setup(BackupSettings::default());

        for day in 1..=8 {
            manager.create_backup_at(&store, BackupKind::Daily, at(day)).unwrap();
        }
        let deleted = manager.enforce_retention(BackupKind::Daily).unwrap();

        assert_eq!(deleted.len(), 1);
        let remaining = manager.list_backups(Some(BackupKind::Daily)).unwrap();
        assert_eq!(remaining.len(), 7);
        assert!(remaining.iter().all(|b| b.created_at > at(1)));
    }

    #[test]
    fn test_manual_backups_are_not_rotated() {
        let settings = BackupSettings {
            retention_daily: 1,
            ..BackupSettings::default()
        };
        let (_temp, store, manager) = setup(settings);
        for day in 1..=3 {
            manager.create_backup_at(&store, BackupKind::Manual, at(day)).unwrap();
        }

        assert!(manager.prune().unwrap().is_empty());
        assert_eq!(manager.list_backups(Some(BackupKind::Manual)).unwrap().len(), 3);
    }

    #[test]
    fn test_corrupted_backup_is_reported_invalid() {
        let (_temp, store, manager) = setup(BackupSettings::default());
        let record = manager.create_backup(&store, BackupKind::Manual).unwrap();

        let mut bytes = fs::read(&record.path).unwrap();
        let middle = bytes.len() / 2;
        bytes[middle] ^= 0xff;
        bytes.truncate(bytes.len() - 4);
        fs::write(&record.path, bytes).unwrap();

        let report = manager.inspect(&record);
        assert!(!report.is_valid());
        assert_eq!(report.record.integrity, IntegrityStatus::Invalid);
        assert!(report.summary().starts_with("Invalid backup"));
    }

    #[test]
    fn test_weekly_selected_once_on_weekly_day() {
        let (_temp, store, manager) = setup(BackupSettings {
            weekly_day: Weekday::Sun,
            ..BackupSettings::default()
        });
        // 2026-03-01 is a Sunday
        let sunday = at(1);
        assert_eq!(sunday.weekday(), Weekday::Sun);

        assert_eq!(manager.next_scheduled_kind(sunday).unwrap(), BackupKind::Weekly);
        manager.create_backup_at(&store, BackupKind::Weekly, sunday).unwrap();
        assert_eq!(
            manager
                .next_scheduled_kind(sunday + Duration::hours(3))
                .unwrap(),
            BackupKind::Daily
        );
        assert_eq!(manager.next_scheduled_kind(at(2)).unwrap(), BackupKind::Daily);
    }

    #[test]
    fn test_get_backup_by_filename() {
        let (_temp, store, manager) = setup(BackupSettings::default());
        let record = manager.create_backup_at(&store, BackupKind::Weekly, at(8)).unwrap();

        let found = manager.get_backup(&record.filename).unwrap().unwrap();
        assert_eq!(found.kind, BackupKind::Weekly);
        assert!(manager
            .require_backup("daily-20200101-000000-000.json.gz")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_parse_backup_timestamp() {
        let parsed = parse_backup_timestamp("20261127-143022-456").unwrap();
        assert_eq!(parsed.year(), 2026);
        assert_eq!(parsed.month(), 11);
        assert_eq!(parsed.timestamp_subsec_millis(), 456);

        assert!(parse_backup_timestamp("20261127-143022").is_none());
        assert!(parse_backup_timestamp("2026-11-27").is_none());
    }

    #[test]
    fn test_state_round_trip() {
        let (_temp, _store, manager) = setup(BackupSettings::default());
        assert_eq!(manager.state().unwrap(), BackupState::default());

        let state = BackupState {
            success_count: 2,
            last_backup: Some("daily-x.json.gz".into()),
            ..Default::default()
        };
        manager.save_state(&state).unwrap();
        assert_eq!(manager.state().unwrap(), state);
    }
}
