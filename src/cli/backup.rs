//! Backup CLI commands
//!
//! Implements CLI commands for backup management.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Subcommand;
use tracing::info;

use crate::backup::{BackupKind, BackupManager, BackupRecord, BackupScheduler, RestoreCoordinator};
use crate::config::Settings;
use crate::display::backup::{
    format_backup_list, format_backup_report, format_backup_state, format_cycle_outcome,
};
use crate::error::{StockroomError, StockroomResult};
use crate::storage::Store;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a manual backup
    Create,

    /// List available backups
    List {
        /// Only this kind (daily, weekly, manual, pre-restore)
        #[arg(short, long)]
        kind: Option<BackupKind>,

        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a backup and show what it contains
    Info {
        /// Backup filename (use 'latest' for most recent)
        backup: String,
    },

    /// Restore from a backup
    Restore {
        /// Backup filename (use 'latest' for most recent)
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete old daily/weekly backups according to retention policy
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Run one scheduled cycle now (daily, or weekly on the weekly day)
    Run,

    /// Show the scheduler's last results
    Status,

    /// Run the backup scheduler in the foreground
    Daemon {
        /// Minutes between cycles (defaults to backup.interval_hours)
        #[arg(long)]
        interval_minutes: Option<u64>,

        /// Exit after this many cycles
        #[arg(long)]
        cycles: Option<usize>,
    },
}

/// Handle a backup command
pub fn handle_backup_command(
    store: &Arc<Store>,
    settings: &Settings,
    cmd: BackupCommands,
) -> StockroomResult<()> {
    let manager = BackupManager::new(store.paths().clone(), settings.backup.clone());

    match cmd {
        BackupCommands::Create => {
            println!("Creating backup...");
            let record = manager.create_backup(store, BackupKind::Manual)?;
            println!("Backup created: {}", record.filename);
            println!("Location: {}", record.path.display());
        }

        BackupCommands::List { kind, verbose } => {
            let backups = manager.list_backups(kind)?;
            print!("{}", format_backup_list(&backups, Utc::now(), verbose));
        }

        BackupCommands::Info { backup } => {
            let record = resolve_backup(&manager, &backup)?;
            print!("{}", format_backup_report(&manager.inspect(&record)));
        }

        BackupCommands::Restore { backup, force } => {
            let record = resolve_backup(&manager, &backup)?;
            let report = manager.inspect(&record);
            print!("{}", format_backup_report(&report));
            println!();

            if !force {
                println!("WARNING: This will replace ALL current data!");
                println!("A pre-restore backup of the current data is taken first.");
                println!("To proceed, run again with --force flag:");
                println!("  stockroom backup restore {} --force", backup);
                return Ok(());
            }

            println!("Restoring from backup...");
            let result =
                RestoreCoordinator::new(store, &manager, &settings.alert).restore(&record)?;
            println!("Restore complete!");
            println!("{}", result.summary());
            println!("Pre-restore backup saved: {}", result.pre_restore.display());
            println!("Ledger checksum: {}", result.checksum);
        }

        BackupCommands::Prune { force } => {
            let daily = manager.list_backups(Some(BackupKind::Daily))?.len();
            let weekly = manager.list_backups(Some(BackupKind::Weekly))?.len();
            let retention = manager.settings();
            let daily_to_delete = daily.saturating_sub(retention.retention_daily as usize);
            let weekly_to_delete = weekly.saturating_sub(retention.retention_weekly as usize);

            println!(
                "Retention policy: {} daily, {} weekly",
                retention.retention_daily, retention.retention_weekly
            );
            println!("Current backups: {} daily, {} weekly", daily, weekly);

            if daily_to_delete + weekly_to_delete == 0 {
                println!("No backups to prune.");
                return Ok(());
            }

            println!(
                "To be deleted: {} daily, {} weekly",
                daily_to_delete, weekly_to_delete
            );
            if !force {
                println!("To delete old backups, run again with --force flag:");
                println!("  stockroom backup prune --force");
                return Ok(());
            }

            let deleted = manager.prune()?;
            println!("Deleted {} backup(s).", deleted.len());
        }

        BackupCommands::Run => {
            let scheduler =
                BackupScheduler::new(Arc::clone(store), manager, settings.alert.clone());
            let outcome = scheduler.run_cycle(Utc::now());
            println!("{}", format_cycle_outcome(&outcome));
            if !outcome.succeeded() {
                return Err(StockroomError::BackupIo(outcome.error.unwrap_or_default()));
            }
        }

        BackupCommands::Status => {
            println!("Backup Status");
            println!("=============");
            println!(
                "  Automatic:    {} (every {}h, weekly on {})",
                if settings.backup.automatic { "on" } else { "off" },
                settings.backup.interval_hours,
                settings.backup.weekly_day
            );
            print!("{}", format_backup_state(&manager.state()?));
        }

        BackupCommands::Daemon {
            interval_minutes,
            cycles,
        } => {
            let interval = match interval_minutes {
                Some(minutes) => Duration::from_secs(minutes.max(1) * 60),
                None => Duration::from_secs(u64::from(settings.backup.interval_hours) * 3600),
            };

            let handle = BackupScheduler::new(Arc::clone(store), manager, settings.alert.clone())
                .spawn(interval)?;
            handle.run_now()?;
            info!(cycles = ?cycles, "backup daemon running");

            let mut completed = 0;
            while cycles.map_or(true, |limit| completed < limit) {
                if let Some(outcome) = handle.wait_for_cycle(Duration::from_secs(60)) {
                    println!(
                        "[{}] {}",
                        Utc::now().format("%Y-%m-%d %H:%M:%S"),
                        format_cycle_outcome(&outcome)
                    );
                    completed += 1;
                }
            }
            handle.shutdown();
        }
    }

    Ok(())
}

/// Resolve a filename, or `latest`, to a backup on disk
fn resolve_backup(manager: &BackupManager, backup: &str) -> StockroomResult<BackupRecord> {
    if backup.eq_ignore_ascii_case("latest") {
        return manager
            .list_backups(None)?
            .into_iter()
            .find(|b| b.kind != BackupKind::PreRestore)
            .ok_or_else(|| StockroomError::backup_not_found("latest"));
    }

    manager.require_backup(backup)
}
