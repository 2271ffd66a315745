//! Configuration CLI commands

use clap::Subcommand;

use crate::config::{Settings, StockroomPaths};
use crate::error::{StockroomError, StockroomResult};

/// Keys accepted by `config get` / `config set`, in display order
const SETTING_KEYS: &[&str] = &[
    "alert.low_stock_threshold_percent",
    "alert.excess_stock_factor",
    "alert.frequent_delivery_count",
    "alert.frequent_delivery_window_hours",
    "backup.automatic",
    "backup.interval_hours",
    "backup.weekly_day",
    "backup.retention_daily",
    "backup.retention_weekly",
    "backup.max_retries",
    "lock.max_attempts",
    "lock.base_delay_ms",
    "lock.max_delay_ms",
];

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show paths and every setting
    Show,
    /// Print one setting
    Get { key: String },
    /// Change one setting
    Set { key: String, value: String },
}

pub fn handle_config_command(
    paths: &StockroomPaths,
    settings: &mut Settings,
    cmd: ConfigCommands,
) -> StockroomResult<()> {
    match cmd {
        ConfigCommands::Show => {
            println!("Stockroom Configuration");
            println!("=======================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Ledger:           {}", paths.ledger_file().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            for key in SETTING_KEYS {
                if let Some(value) = settings.get_value(key) {
                    println!("  {:<38} {}", key, value);
                }
            }
        }

        ConfigCommands::Get { key } => {
            let value = settings
                .get_value(&key)
                .ok_or_else(|| StockroomError::Config(format!("Unknown setting: {}", key)))?;
            println!("{}", value);
        }

        ConfigCommands::Set { key, value } => {
            settings.set_value(&key, &value)?;
            settings.save(paths)?;
            println!("{} = {}", key, settings.get_value(&key).unwrap_or(value));
        }
    }

    Ok(())
}
