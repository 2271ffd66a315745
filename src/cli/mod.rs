//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod alert;
pub mod backup;
pub mod config;
pub mod delivery;
pub mod employee;
pub mod item;

pub use alert::{handle_alert_command, AlertCommands};
pub use backup::{handle_backup_command, BackupCommands};
pub use config::{handle_config_command, ConfigCommands};
pub use delivery::{handle_deliver, handle_delivery_command, DeliverArgs, DeliveryCommands};
pub use employee::{handle_employee_command, EmployeeCommands};
pub use item::{handle_item_command, ItemCommands};
