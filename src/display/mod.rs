//! Display formatting for terminal output
//!
//! Provides utilities for formatting data models for terminal display:
//! tables, detail views and status labels.

pub mod alert;
pub mod backup;
pub mod delivery;
pub mod item;
pub mod summary;

pub use alert::{format_alert_list, format_alert_summary};
pub use backup::{
    format_backup_list, format_backup_report, format_backup_state, format_cycle_outcome,
};
pub use delivery::{
    format_delivery_list, format_delivery_statistics, format_employee_list, DeliveryLine,
};
pub use item::{format_item_details, format_item_list};
pub use summary::format_dashboard;
