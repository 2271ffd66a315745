//! Configuration module for Stockroom
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Settings persistence (alert thresholds, backup policy, lock budget)

pub mod paths;
pub mod settings;

pub use paths::StockroomPaths;
pub use settings::{AlertSettings, BackupSettings, LockSettings, Settings};
