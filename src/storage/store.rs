//! Transactional ledger store
//!
//! The live [`Dataset`] is held in memory behind a `RwLock` and mirrored to
//! `data/ledger.json`. Every mutation runs as a transaction: the closure
//! edits a working copy, the copy is written atomically, and only then does
//! it replace the in-memory state. A closure that returns an error leaves
//! both disk and memory untouched.
//!
//! A second lock, the gate, separates normal traffic (transactions and
//! snapshots take it shared) from restore (takes it exclusive).
//!
//! Other processes may commit to the same ledger (a running backup daemon
//! next to one-shot commands). `data/ledger.lock` is an advisory lock that
//! also holds the ledger revision: writers take it exclusive and bump the
//! revision, readers take it shared, and a store whose revision is behind
//! reloads the ledger before using it.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::audit::{generate_diff, AuditEntry, AuditLogger, EntityType};
use crate::config::paths::StockroomPaths;
use crate::error::{StockroomError, StockroomResult};

use super::dataset::{Dataset, SCHEMA_VERSION};
use super::file_io::{read_json, write_json_atomic};
use super::lock::LockPolicy;

/// Held advisory lock on the revision file; released on drop
struct RevisionLock {
    file: File,
}

impl RevisionLock {
    fn acquire(path: &Path, exclusive: bool) -> StockroomResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                StockroomError::Storage(format!("Failed to open {}: {}", path.display(), e))
            })?;

        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.map_err(|e| {
            StockroomError::ConcurrencyConflict(format!("ledger lock {}: {}", path.display(), e))
        })?;

        Ok(Self { file })
    }

    /// Revision of the ledger on disk; 0 before the first write
    fn revision(&mut self) -> StockroomResult<u64> {
        let mut text = String::new();
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_to_string(&mut text)?;
        Ok(text.trim().parse().unwrap_or(0))
    }

    fn set_revision(&mut self, revision: u64) -> StockroomResult<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        write!(self.file, "{}", revision)?;
        self.file.sync_all()?;
        Ok(())
    }
}

pub struct Store {
    paths: StockroomPaths,
    ledger_path: PathBuf,
    revision_path: PathBuf,
    dataset: RwLock<Dataset>,
    /// Ledger revision the in-memory dataset matches
    revision: Mutex<u64>,
    gate: RwLock<()>,
    lock_policy: LockPolicy,
    audit: AuditLogger,
}

impl Store {
    /// Open the store, loading the ledger if one has been written
    pub fn open(paths: StockroomPaths, lock_policy: LockPolicy) -> StockroomResult<Self> {
        paths.ensure_directories()?;

        let ledger_path = paths.ledger_file();
        let revision_path = ledger_path.with_extension("lock");
        let mut lock = RevisionLock::acquire(&revision_path, false)?;
        let revision = lock.revision()?;
        let dataset = load_ledger(&ledger_path)?;
        drop(lock);

        debug!(
            path = %ledger_path.display(),
            revision,
            items = dataset.items.len(),
            deliveries = dataset.deliveries.len(),
            "ledger loaded"
        );

        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            ledger_path,
            revision_path,
            dataset: RwLock::new(dataset),
            revision: Mutex::new(revision),
            gate: RwLock::new(()),
            lock_policy,
            paths,
        })
    }

    pub fn paths(&self) -> &StockroomPaths {
        &self.paths
    }

    pub fn audit_logger(&self) -> &AuditLogger {
        &self.audit
    }

    /// Run a read-only closure against the live dataset
    pub fn read<R>(&self, f: impl FnOnce(&Dataset) -> R) -> StockroomResult<R> {
        let _gate = self.shared_gate()?;
        self.refresh()?;
        let data = self.read_dataset()?;
        Ok(f(&data))
    }

    /// Consistent copy of the whole ledger
    pub fn snapshot(&self) -> StockroomResult<Dataset> {
        self.read(Dataset::clone)
    }

    /// Run `f` against a working copy and commit it atomically.
    ///
    /// Transactions serialize on the ledger write lock; contention is retried
    /// with bounded backoff before surfacing `ConcurrencyConflict`.
    pub fn transaction<R>(
        &self,
        f: impl FnOnce(&mut Dataset) -> StockroomResult<R>,
    ) -> StockroomResult<R> {
        let _gate = self.shared_gate()?;
        self.commit(f)
    }

    /// Block all transactions and snapshots until the returned guard drops
    pub fn lock_exclusive(&self) -> StockroomResult<ExclusiveAccess<'_>> {
        let gate = self.gate.write().map_err(|e| {
            StockroomError::Storage(format!("Failed to acquire exclusive store gate: {}", e))
        })?;
        info!("store locked for exclusive access");
        Ok(ExclusiveAccess { store: self, _gate: gate })
    }

    /// SHA-256 of the live items, employees and deliveries
    pub fn ledger_checksum(&self) -> StockroomResult<String> {
        self.read(Dataset::checksum)?
    }

    /// Append audit entries for an already committed change.
    ///
    /// The change is durable at this point, so a failing audit write is
    /// logged and swallowed.
    pub fn record_audit(&self, entries: &[AuditEntry]) {
        if let Err(e) = self.audit.log_batch(entries) {
            warn!(error = %e, count = entries.len(), "failed to write audit entries");
        }
    }

    pub fn log_create<T: serde::Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) {
        self.record_audit(&[AuditEntry::create(
            entity_type,
            entity_id,
            entity_name,
            entity,
        )]);
    }

    pub fn log_update<T: serde::Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) {
        let diff = match (serde_json::to_value(before), serde_json::to_value(after)) {
            (Ok(b), Ok(a)) => generate_diff(&b, &a),
            _ => None,
        };
        self.record_audit(&[AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff,
        )]);
    }

    fn shared_gate(&self) -> StockroomResult<RwLockReadGuard<'_, ()>> {
        self.gate
            .read()
            .map_err(|e| StockroomError::Storage(format!("Failed to acquire store gate: {}", e)))
    }

    fn read_dataset(&self) -> StockroomResult<RwLockReadGuard<'_, Dataset>> {
        self.dataset
            .read()
            .map_err(|e| StockroomError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_dataset(&self) -> StockroomResult<RwLockWriteGuard<'_, Dataset>> {
        self.lock_policy.acquire_write(&self.dataset, "ledger")
    }

    fn seen_revision(&self) -> StockroomResult<MutexGuard<'_, u64>> {
        self.revision
            .lock()
            .map_err(|e| StockroomError::Storage(format!("Failed to read ledger revision: {}", e)))
    }

    /// Reload the dataset if another process has committed since our last
    /// load or write
    fn refresh(&self) -> StockroomResult<()> {
        {
            let mut lock = RevisionLock::acquire(&self.revision_path, false)?;
            if lock.revision()? == *self.seen_revision()? {
                return Ok(());
            }
        }

        // The in-process lock is always taken before the file lock
        let mut live = self.write_dataset()?;
        let mut lock = RevisionLock::acquire(&self.revision_path, false)?;
        let current = lock.revision()?;
        self.reload_if_behind(&mut live, current)
    }

    fn reload_if_behind(&self, live: &mut Dataset, current: u64) -> StockroomResult<()> {
        let mut seen = self.seen_revision()?;
        if *seen == current {
            return Ok(());
        }

        *live = load_ledger(&self.ledger_path)?;
        *seen = current;
        debug!(
            revision = current,
            items = live.items.len(),
            deliveries = live.deliveries.len(),
            "ledger changed on disk, reloaded"
        );
        Ok(())
    }

    /// Persist `dataset`, then adopt it and publish the next revision
    fn write_through(
        &self,
        lock: &mut RevisionLock,
        live: &mut Dataset,
        dataset: Dataset,
    ) -> StockroomResult<()> {
        let next = lock.revision()? + 1;
        write_json_atomic(&self.ledger_path, &dataset)?;
        *live = dataset;
        lock.set_revision(next)?;
        *self.seen_revision()? = next;
        Ok(())
    }

    fn commit<R>(
        &self,
        f: impl FnOnce(&mut Dataset) -> StockroomResult<R>,
    ) -> StockroomResult<R> {
        let mut live = self.write_dataset()?;
        let mut lock = RevisionLock::acquire(&self.revision_path, true)?;
        let current = lock.revision()?;
        self.reload_if_behind(&mut live, current)?;

        let mut working = live.clone();
        let result = f(&mut working)?;

        if working != *live {
            self.write_through(&mut lock, &mut live, working)?;
        }

        Ok(result)
    }
}

fn load_ledger(path: &Path) -> StockroomResult<Dataset> {
    let dataset: Dataset = read_json(path)?;
    if dataset.schema_version != SCHEMA_VERSION {
        return Err(StockroomError::Storage(format!(
            "{} has schema version {}, expected {}",
            path.display(),
            dataset.schema_version,
            SCHEMA_VERSION
        )));
    }
    Ok(dataset)
}

/// Exclusive hold on the store, used by restore
pub struct ExclusiveAccess<'a> {
    store: &'a Store,
    _gate: RwLockWriteGuard<'a, ()>,
}

impl ExclusiveAccess<'_> {
    pub fn snapshot(&self) -> StockroomResult<Dataset> {
        self.store.refresh()?;
        Ok(self.store.read_dataset()?.clone())
    }

    /// Durably replace the whole ledger, then swap it into memory
    pub fn replace(&self, dataset: Dataset) -> StockroomResult<()> {
        let mut live = self.store.write_dataset()?;
        let mut lock = RevisionLock::acquire(&self.store.revision_path, true)?;
        self.store.write_through(&mut lock, &mut live, dataset)
    }

    pub fn transaction<R>(
        &self,
        f: impl FnOnce(&mut Dataset) -> StockroomResult<R>,
    ) -> StockroomResult<R> {
        self.store.commit(f)
    }
}

impl Drop for ExclusiveAccess<'_> {
    fn drop(&mut self) {
        debug!("store exclusive access released");
    }
}
