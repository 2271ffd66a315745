//! Background backup scheduler
//!
//! Runs backup cycles on its own thread. The thread wakes on a timer or on
//! an explicit `RunNow` command; each wake-up sweeps the alerts, then runs a
//! cycle. A failed cycle raises a `BACKUP_FAILED` alert instead of stopping
//! the thread.

use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::audit::{AuditEntry, EntityType};
use crate::config::AlertSettings;
use crate::error::{StockroomError, StockroomResult};
use crate::models::{AlertKind, AlertSeverity};
use crate::services::AlertEngine;
use crate::storage::Store;

use super::manager::BackupManager;
use super::{BackupKind, BackupRecord};

/// Where the current (or last) cycle is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Snapshotting,
    Validating,
    Complete,
    Failed,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Snapshotting => "snapshotting",
            Self::Validating => "validating",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

enum SchedulerCommand {
    RunNow,
    Stop,
}

/// Result of one backup cycle
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub kind: BackupKind,
    pub attempts: u32,
    pub record: Option<BackupRecord>,
    /// Files removed by retention after a successful cycle
    pub deleted: Vec<PathBuf>,
    /// Error of the last failed attempt
    pub error: Option<String>,
}

impl CycleOutcome {
    pub fn succeeded(&self) -> bool {
        self.record.is_some()
    }
}

pub struct BackupScheduler {
    store: Arc<Store>,
    manager: BackupManager,
    alert_settings: AlertSettings,
    status: Arc<Mutex<CycleState>>,
    retry_delay: Duration,
}

impl BackupScheduler {
    pub fn new(store: Arc<Store>, manager: BackupManager, alert_settings: AlertSettings) -> Self {
        Self {
            store,
            manager,
            alert_settings,
            status: Arc::new(Mutex::new(CycleState::Idle)),
            retry_delay: Duration::from_secs(5),
        }
    }

    /// Pause between failed attempts of the same cycle
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn state(&self) -> CycleState {
        read_status(&self.status)
    }

    /// One wake-up of the scheduler thread: a full alert sweep, so alerts
    /// tied to a time window expire, then a backup cycle
    pub fn tick(&self, now: DateTime<Utc>) -> CycleOutcome {
        let alerts = AlertEngine::new(&self.store, &self.alert_settings);
        if let Err(e) = alerts.sweep_at(now) {
            warn!(error = %e, "periodic alert sweep failed");
        }
        self.run_cycle(now)
    }

    /// Run one cycle: pick the kind, attempt up to `max_retries` times,
    /// then rotate and clear any open `BACKUP_FAILED` alert on success
    pub fn run_cycle(&self, now: DateTime<Utc>) -> CycleOutcome {
        let kind = match self.manager.next_scheduled_kind(now) {
            Ok(kind) => kind,
            Err(e) => {
                warn!(error = %e, "could not inspect weekly backups, defaulting to daily");
                BackupKind::Daily
            }
        };
        let max_attempts = self.manager.settings().max_retries.max(1);
        let alerts = AlertEngine::new(&self.store, &self.alert_settings);

        let mut outcome = CycleOutcome {
            kind,
            attempts: 0,
            record: None,
            deleted: Vec::new(),
            error: None,
        };

        while outcome.attempts < max_attempts {
            outcome.attempts += 1;
            match self.attempt(kind, now) {
                Ok(record) => {
                    self.set_status(CycleState::Complete);
                    outcome.error = None;
                    outcome.record = Some(record);
                    break;
                }
                Err(e) => {
                    self.set_status(CycleState::Failed);
                    warn!(
                        kind = %kind,
                        attempt = outcome.attempts,
                        max_attempts,
                        error = %e,
                        "backup attempt failed"
                    );
                    let message = format!("{} backup failed: {}", kind, e);
                    if let Err(raise_err) =
                        alerts.raise(AlertKind::BackupFailed, AlertSeverity::High, None, message)
                    {
                        error!(error = %raise_err, "failed to raise BACKUP_FAILED alert");
                    }
                    outcome.error = Some(e.to_string());

                    if outcome.attempts < max_attempts && !self.retry_delay.is_zero() {
                        thread::sleep(self.retry_delay);
                    }
                }
            }
        }

        match &outcome.record {
            Some(record) => {
                match self.manager.enforce_retention(kind) {
                    Ok(deleted) => outcome.deleted = deleted,
                    Err(e) => warn!(kind = %kind, error = %e, "retention failed"),
                }
                if let Err(e) = alerts.clear(AlertKind::BackupFailed, None) {
                    warn!(error = %e, "failed to clear BACKUP_FAILED alert");
                }
                self.store.record_audit(&[AuditEntry::create(
                    EntityType::Backup,
                    record.filename.clone(),
                    Some(kind.to_string()),
                    record,
                )]);
            }
            None => error!(
                kind = %kind,
                attempts = outcome.attempts,
                "backup cycle aborted until next trigger"
            ),
        }

        self.update_state(&outcome, now);
        outcome
    }

    /// Start the scheduler thread; a cycle runs every `interval` and on
    /// every [`SchedulerHandle::run_now`]
    pub fn spawn(self, interval: Duration) -> StockroomResult<SchedulerHandle> {
        let (commands, command_rx) = mpsc::channel();
        let (outcome_tx, outcomes) = mpsc::channel();
        let status = Arc::clone(&self.status);

        let thread = thread::Builder::new()
            .name("backup-scheduler".into())
            .spawn(move || self.run_loop(interval, command_rx, outcome_tx))
            .map_err(|e| {
                StockroomError::Storage(format!("Failed to start backup scheduler: {}", e))
            })?;

        info!(interval_secs = interval.as_secs(), "backup scheduler started");
        Ok(SchedulerHandle {
            commands,
            outcomes,
            status,
            thread: Some(thread),
        })
    }

    fn run_loop(
        self,
        interval: Duration,
        commands: Receiver<SchedulerCommand>,
        outcomes: Sender<CycleOutcome>,
    ) {
        loop {
            match commands.recv_timeout(interval) {
                Ok(SchedulerCommand::RunNow) | Err(RecvTimeoutError::Timeout) => {
                    let outcome = self.tick(Utc::now());
                    // Nobody listening is fine
                    let _ = outcomes.send(outcome);
                    self.set_status(CycleState::Idle);
                }
                Ok(SchedulerCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        info!("backup scheduler stopped");
    }

    fn attempt(&self, kind: BackupKind, now: DateTime<Utc>) -> StockroomResult<BackupRecord> {
        self.set_status(CycleState::Snapshotting);
        let snapshot = self.store.snapshot()?;
        let record = self.manager.write_archive(&snapshot, kind, now)?;

        self.set_status(CycleState::Validating);
        self.manager.validate_written(record)
    }

    fn update_state(&self, outcome: &CycleOutcome, now: DateTime<Utc>) {
        let mut state = match self.manager.state() {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "backup state unreadable, starting fresh");
                Default::default()
            }
        };

        state.last_attempt = Some(now);
        match &outcome.record {
            Some(record) => {
                state.last_success = Some(now);
                state.last_backup = Some(record.filename.clone());
                state.success_count += 1;
                state.last_error = None;
            }
            None => {
                state.failure_count += 1;
                state.last_error = outcome.error.clone();
            }
        }

        if let Err(e) = self.manager.save_state(&state) {
            warn!(error = %e, "failed to save backup state");
        }
    }

    fn set_status(&self, state: CycleState) {
        match self.status.lock() {
            Ok(mut status) => *status = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
    }
}

fn read_status(status: &Mutex<CycleState>) -> CycleState {
    match status.lock() {
        Ok(status) => *status,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

/// Control handle for a running scheduler thread
pub struct SchedulerHandle {
    commands: Sender<SchedulerCommand>,
    outcomes: Receiver<CycleOutcome>,
    status: Arc<Mutex<CycleState>>,
    thread: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Trigger a cycle without waiting for the timer
    pub fn run_now(&self) -> StockroomResult<()> {
        self.commands
            .send(SchedulerCommand::RunNow)
            .map_err(|_| StockroomError::Storage("backup scheduler is not running".into()))
    }

    /// Wait for the next finished cycle
    pub fn wait_for_cycle(&self, timeout: Duration) -> Option<CycleOutcome> {
        self.outcomes.recv_timeout(timeout).ok()
    }

    pub fn state(&self) -> CycleState {
        read_status(&self.status)
    }

    /// Stop the thread, letting an in-flight cycle finish first
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.commands.send(SchedulerCommand::Stop);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("backup scheduler thread panicked");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::StockroomPaths;
    use crate::config::BackupSettings;
    use crate::backup::BackupArchive;
    use crate::models::{Delivery, Employee, Item};
    use crate::services::DeliveryService;
    use crate::storage::LockPolicy;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn setup(settings: BackupSettings) -> (TempDir, Arc<Store>, BackupScheduler) {
        let temp_dir = TempDir::new().unwrap();
        let paths = StockroomPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = Arc::new(Store::open(paths.clone(), LockPolicy::default()).unwrap());
        let item = Item::new("Toner", "Printing", 1, 5).with_quantity(3);
        store
            .transaction(|data| {
                data.items.insert(item.id, item);
                Ok(())
            })
            .unwrap();

        let manager = BackupManager::new(paths, settings);
        let scheduler = BackupScheduler::new(Arc::clone(&store), manager, AlertSettings::default())
            .with_retry_delay(Duration::ZERO);
        (temp_dir, store, scheduler)
    }

    // 2026-03-02 is a Monday
    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 1, 0, 0).unwrap()
    }

    fn active_backup_alerts(store: &Store) -> usize {
        store
            .read(|data| {
                data.alerts
                    .iter()
                    .filter(|a| a.is_active() && a.kind == AlertKind::BackupFailed)
                    .count()
            })
            .unwrap()
    }

    #[test]
    fn test_successful_cycle() {
        let (_temp, store, scheduler) = setup(BackupSettings::default());

        let outcome = scheduler.run_cycle(monday());

        assert!(outcome.succeeded());
        assert_eq!(outcome.kind, BackupKind::Daily);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(scheduler.state(), CycleState::Complete);

        let state = scheduler.manager.state().unwrap();
        assert_eq!(state.success_count, 1);
        assert_eq!(state.last_success, Some(monday()));
        assert_eq!(active_backup_alerts(&store), 0);
    }

    #[test]
    fn test_failed_cycle_is_bounded_and_raises_one_alert() {
        let (temp, store, scheduler) = setup(BackupSettings::default());
        let daily_dir = temp.path().join("backups").join("daily");
        fs::remove_dir_all(&daily_dir).unwrap();
        fs::write(&daily_dir, b"not a directory").unwrap();

        let outcome = scheduler.run_cycle(monday());

        assert!(!outcome.succeeded());
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.error.is_some());
        assert_eq!(scheduler.state(), CycleState::Failed);
        assert_eq!(active_backup_alerts(&store), 1);

        let state = scheduler.manager.state().unwrap();
        assert_eq!(state.failure_count, 1);
        assert!(state.last_error.is_some());

        // Storage recovers; the next cycle clears the alert
        fs::remove_file(&daily_dir).unwrap();
        let outcome = scheduler.run_cycle(monday() + chrono::Duration::hours(1));
        assert!(outcome.succeeded());
        assert_eq!(active_backup_alerts(&store), 0);
    }

    #[test]
    fn test_cycle_applies_retention() {
        let (_temp, _store, scheduler) = setup(BackupSettings {
            retention_daily: 2,
            ..BackupSettings::default()
        });

        for hour in 0..4 {
            scheduler.run_cycle(monday() + chrono::Duration::hours(hour));
        }

        let daily = scheduler.manager.list_backups(Some(BackupKind::Daily)).unwrap();
        assert_eq!(daily.len(), 2);
    }

    #[test]
    fn test_cycle_keeps_commits_made_by_another_store() {
        let (temp, store, scheduler) = setup(BackupSettings::default());
        let paths = StockroomPaths::with_base_dir(temp.path().to_path_buf());

        // A separate command-line invocation records a delivery
        let other = Store::open(paths, LockPolicy::default()).unwrap();
        let employee = Employee::new("Ana Torres", "1002003");
        let item_id = *other.snapshot().unwrap().items.keys().next().unwrap();
        other
            .transaction(|data| {
                data.employees.insert(employee.id, employee.clone());
                Ok(())
            })
            .unwrap();
        let alerts = AlertEngine::new(&other, &AlertSettings::default());
        DeliveryService::new(&other, &alerts)
            .record_delivery(employee.id, item_id, 2, "front desk", "")
            .unwrap();

        let outcome = scheduler.run_cycle(monday());
        let archive = BackupArchive::read_verified(&outcome.record.unwrap().path).unwrap();
        assert_eq!(archive.ledger.deliveries.len(), 1);
        assert_eq!(archive.ledger.items[&item_id].quantity_current, 1);

        // A failing cycle commits its alert on top of the delivery
        let daily_dir = temp.path().join("backups").join("daily");
        fs::remove_dir_all(&daily_dir).unwrap();
        fs::write(&daily_dir, b"not a directory").unwrap();
        assert!(!scheduler.run_cycle(monday() + chrono::Duration::hours(1)).succeeded());

        let reopened = Store::open(
            StockroomPaths::with_base_dir(temp.path().to_path_buf()),
            LockPolicy::default(),
        )
        .unwrap()
        .snapshot()
        .unwrap();
        assert_eq!(reopened.deliveries.len(), 1);
        assert_eq!(reopened.items[&item_id].quantity_current, 1);
        assert_eq!(active_backup_alerts(&store), 1);
    }

    #[test]
    fn test_tick_expires_frequent_delivery_alert() {
        let (_temp, store, scheduler) = setup(BackupSettings::default());
        let employee = Employee::new("Ana Torres", "1002003");
        let delivered_at = monday() - chrono::Duration::hours(1);
        store
            .transaction(|data| {
                let item_id = *data.items.keys().next().unwrap();
                for _ in 0..6 {
                    data.deliveries
                        .push(Delivery::new(employee.id, item_id, 1, delivered_at, "", ""));
                }
                data.employees.insert(employee.id, employee.clone());
                Ok(())
            })
            .unwrap();
        let frequent = |store: &Store| {
            store
                .read(|data| {
                    data.alerts
                        .iter()
                        .filter(|a| a.is_active() && a.kind == AlertKind::FrequentDelivery)
                        .count()
                })
                .unwrap()
        };

        scheduler.tick(monday());
        assert_eq!(frequent(&store), 1);

        scheduler.tick(monday() + chrono::Duration::days(2));
        assert_eq!(frequent(&store), 0);
    }

    #[test]
    fn test_spawned_scheduler_runs_on_request() {
        let (_temp, _store, scheduler) = setup(BackupSettings::default());
        let manager = scheduler.manager.clone();

        let handle = scheduler.spawn(Duration::from_secs(3600)).unwrap();
        handle.run_now().unwrap();
        let outcome = handle.wait_for_cycle(Duration::from_secs(30)).unwrap();
        handle.shutdown();

        assert!(outcome.succeeded());
        assert_eq!(manager.list_backups(None).unwrap().len(), 1);
    }
}
