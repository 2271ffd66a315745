//! Alert CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::alert::{format_alert_list, format_alert_summary};
use crate::error::{StockroomError, StockroomResult};
use crate::models::{AlertKind, AlertSeverity};
use crate::services::AlertEngine;
use crate::storage::Store;

/// Alert subcommands
#[derive(Subcommand)]
pub enum AlertCommands {
    /// List alerts
    List {
        /// Only this severity (low, medium, high, critical)
        #[arg(short, long)]
        severity: Option<AlertSeverity>,
        /// Only this kind (e.g. LOW_STOCK)
        #[arg(short, long)]
        kind: Option<AlertKind>,
        /// Show the N most recently resolved alerts instead
        #[arg(short, long)]
        resolved: Option<usize>,
    },
    /// Resolve one alert
    Resolve {
        /// Alert ID
        alert: String,
        /// Who is resolving it
        #[arg(short, long, env = "USER")]
        operator: String,
    },
    /// Resolve every active alert of one kind
    ResolveKind {
        kind: AlertKind,
        #[arg(short, long, env = "USER")]
        operator: String,
    },
    /// Re-evaluate every item
    Sweep,
    /// Active alert counts
    Summary,
    /// Delete resolved alerts older than N days
    Purge {
        #[arg(short, long, default_value = "30")]
        days: u32,
    },
}

/// Handle an alert command
pub fn handle_alert_command(
    store: &Store,
    settings: &Settings,
    cmd: AlertCommands,
) -> StockroomResult<()> {
    let engine = AlertEngine::new(store, &settings.alert);

    match cmd {
        AlertCommands::List {
            severity,
            kind,
            resolved,
        } => {
            let alerts = match resolved {
                Some(limit) => engine.list_resolved(limit)?,
                None => engine.list_active_filtered(severity, kind)?,
            };
            print!("{}", format_alert_list(&alerts));
        }

        AlertCommands::Resolve { alert, operator } => {
            let id = store
                .read(|data| data.find_alert(&alert).map(|a| a.id))?
                .ok_or_else(|| StockroomError::alert_not_found(&alert))?;
            let resolved = engine.resolve(id, &operator)?;
            println!("Resolved: {}", resolved);
        }

        AlertCommands::ResolveKind { kind, operator } => {
            let resolved = engine.resolve_kind(kind, &operator)?;
            println!("Resolved {} {} alert(s)", resolved.len(), kind);
        }

        AlertCommands::Sweep => {
            let changes = engine.sweep()?;
            println!(
                "Sweep complete: {} raised, {} upgraded, {} resolved",
                changes.raised.len(),
                changes.upgraded.len(),
                changes.resolved.len()
            );
        }

        AlertCommands::Summary => {
            let summary = engine.summary()?;
            print!("{}", format_alert_summary(&summary));
        }

        AlertCommands::Purge { days } => {
            let removed = engine.purge_resolved(days)?;
            println!("Purged {} resolved alert(s)", removed);
        }
    }

    Ok(())
}
