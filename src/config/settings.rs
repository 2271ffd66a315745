//! User settings for Stockroom
//!
//! Manages alert thresholds, backup scheduling and retention, and the
//! lock-contention retry budget.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::paths::StockroomPaths;
use crate::error::StockroomError;
use crate::models::{Item, StockStatus};

/// Thresholds used by the alert engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSettings {
    /// LOW_STOCK fires below this percentage of an item's minimum quantity
    #[serde(default = "default_low_stock_threshold_percent")]
    pub low_stock_threshold_percent: u32,

    /// EXCESS_STOCK fires above `quantity_maximum * excess_stock_factor`
    #[serde(default = "default_excess_stock_factor")]
    pub excess_stock_factor: f64,

    /// FREQUENT_DELIVERY fires when deliveries in the window exceed this count
    #[serde(default = "default_frequent_delivery_count")]
    pub frequent_delivery_count: u32,

    /// Width of the trailing delivery-frequency window
    #[serde(default = "default_frequent_delivery_window_hours")]
    pub frequent_delivery_window_hours: u32,
}

fn default_low_stock_threshold_percent() -> u32 {
    100
}

fn default_excess_stock_factor() -> f64 {
    1.0
}

fn default_frequent_delivery_count() -> u32 {
    5
}

fn default_frequent_delivery_window_hours() -> u32 {
    24
}

impl AlertSettings {
    /// Stock band of `item` under these thresholds
    pub fn stock_status(&self, item: &Item) -> StockStatus {
        item.stock_status_with(self.low_stock_threshold_percent, self.excess_stock_factor)
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            low_stock_threshold_percent: default_low_stock_threshold_percent(),
            excess_stock_factor: default_excess_stock_factor(),
            frequent_delivery_count: default_frequent_delivery_count(),
            frequent_delivery_window_hours: default_frequent_delivery_window_hours(),
        }
    }
}

/// Backup scheduling and retention settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSettings {
    /// Whether the background scheduler runs
    #[serde(default = "default_true")]
    pub automatic: bool,

    /// Hours between scheduled backup cycles
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u32,

    /// Day on which the scheduled cycle produces a weekly backup
    #[serde(default = "default_weekly_day")]
    pub weekly_day: Weekday,

    /// Number of daily backups to keep
    #[serde(default = "default_retention_daily")]
    pub retention_daily: u32,

    /// Number of weekly backups to keep
    #[serde(default = "default_retention_weekly")]
    pub retention_weekly: u32,

    /// Attempts per cycle before giving up until the next trigger
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_true() -> bool {
    true
}

fn default_interval_hours() -> u32 {
    24
}

fn default_weekly_day() -> Weekday {
    Weekday::Sun
}

fn default_retention_daily() -> u32 {
    7
}

fn default_retention_weekly() -> u32 {
    4
}

fn default_max_retries() -> u32 {
    3
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            automatic: default_true(),
            interval_hours: default_interval_hours(),
            weekly_day: default_weekly_day(),
            retention_daily: default_retention_daily(),
            retention_weekly: default_retention_weekly(),
            max_retries: default_max_retries(),
        }
    }
}

/// Bounded backoff used when the ledger write lock is contended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    8
}

fn default_base_delay_ms() -> u64 {
    5
}

fn default_max_delay_ms() -> u64 {
    250
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// User settings for Stockroom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub alert: AlertSettings,

    #[serde(default)]
    pub backup: BackupSettings,

    #[serde(default)]
    pub lock: LockSettings,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            alert: AlertSettings::default(),
            backup: BackupSettings::default(),
            lock: LockSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &StockroomPaths) -> Result<Self, StockroomError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                StockroomError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                StockroomError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &StockroomPaths) -> Result<(), StockroomError> {
        self.validate()?;
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            StockroomError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents).map_err(|e| {
            StockroomError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), StockroomError> {
        let alert = &self.alert;
        if !(1..=100).contains(&alert.low_stock_threshold_percent) {
            return Err(StockroomError::Config(format!(
                "alert.low_stock_threshold_percent must be between 1 and 100, got {}",
                alert.low_stock_threshold_percent
            )));
        }
        if !alert.excess_stock_factor.is_finite() || alert.excess_stock_factor < 1.0 {
            return Err(StockroomError::Config(format!(
                "alert.excess_stock_factor must be >= 1.0, got {}",
                alert.excess_stock_factor
            )));
        }
        if alert.frequent_delivery_count == 0 || alert.frequent_delivery_window_hours == 0 {
            return Err(StockroomError::Config(
                "alert.frequent_delivery_count and window must be at least 1".into(),
            ));
        }

        let backup = &self.backup;
        if backup.interval_hours == 0 {
            return Err(StockroomError::Config(
                "backup.interval_hours must be at least 1".into(),
            ));
        }
        if backup.retention_daily == 0 || backup.retention_weekly == 0 {
            return Err(StockroomError::Config(
                "backup retention counts must be at least 1".into(),
            ));
        }
        if backup.max_retries == 0 {
            return Err(StockroomError::Config(
                "backup.max_retries must be at least 1".into(),
            ));
        }

        if self.lock.max_attempts == 0 {
            return Err(StockroomError::Config(
                "lock.max_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Look up a setting by its dotted name (e.g. `alert.excess_stock_factor`)
    pub fn get_value(&self, key: &str) -> Option<String> {
        let value = match key {
            "alert.low_stock_threshold_percent" => {
                self.alert.low_stock_threshold_percent.to_string()
            }
            "alert.excess_stock_factor" => self.alert.excess_stock_factor.to_string(),
            "alert.frequent_delivery_count" => self.alert.frequent_delivery_count.to_string(),
            "alert.frequent_delivery_window_hours" => {
                self.alert.frequent_delivery_window_hours.to_string()
            }
            "backup.automatic" => self.backup.automatic.to_string(),
            "backup.interval_hours" => self.backup.interval_hours.to_string(),
            "backup.weekly_day" => self.backup.weekly_day.to_string(),
            "backup.retention_daily" => self.backup.retention_daily.to_string(),
            "backup.retention_weekly" => self.backup.retention_weekly.to_string(),
            "backup.max_retries" => self.backup.max_retries.to_string(),
            "lock.max_attempts" => self.lock.max_attempts.to_string(),
            "lock.base_delay_ms" => self.lock.base_delay_ms.to_string(),
            "lock.max_delay_ms" => self.lock.max_delay_ms.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Update a setting by its dotted name, validating the result
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), StockroomError> {
        let mut updated = self.clone();
        match key {
            "alert.low_stock_threshold_percent" => {
                updated.alert.low_stock_threshold_percent = parse_setting(key, value)?
            }
            "alert.excess_stock_factor" => {
                updated.alert.excess_stock_factor = parse_setting(key, value)?
            }
            "alert.frequent_delivery_count" => {
                updated.alert.frequent_delivery_count = parse_setting(key, value)?
            }
            "alert.frequent_delivery_window_hours" => {
                updated.alert.frequent_delivery_window_hours = parse_setting(key, value)?
            }
            "backup.automatic" => updated.backup.automatic = parse_setting(key, value)?,
            "backup.interval_hours" => updated.backup.interval_hours = parse_setting(key, value)?,
            "backup.weekly_day" => updated.backup.weekly_day = parse_setting(key, value)?,
            "backup.retention_daily" => {
                updated.backup.retention_daily = parse_setting(key, value)?
            }
            "backup.retention_weekly" => {
                updated.backup.retention_weekly = parse_setting(key, value)?
            }
            "backup.max_retries" => updated.backup.max_retries = parse_setting(key, value)?,
            "lock.max_attempts" => updated.lock.max_attempts = parse_setting(key, value)?,
            "lock.base_delay_ms" => updated.lock.base_delay_ms = parse_setting(key, value)?,
            "lock.max_delay_ms" => updated.lock.max_delay_ms = parse_setting(key, value)?,
            _ => return Err(StockroomError::Config(format!("Unknown setting: {}", key))),
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn parse_setting<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, StockroomError> {
    value
        .trim()
        .parse()
        .map_err(|_| StockroomError::Config(format!("Invalid value for {}: '{}'", key, value)))
}
