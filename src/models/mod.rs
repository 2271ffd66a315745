//! Core data models for Stockroom
//!
//! This module contains the data structures of the inventory domain: items,
//! employees, deliveries and the alerts derived from them.

pub mod alert;
pub mod delivery;
pub mod employee;
pub mod ids;
pub mod item;

pub use alert::{Alert, AlertKey, AlertKind, AlertSeverity, Resolution};
pub use delivery::{Delivery, MAX_DELIVERER_LEN, MAX_NOTE_LEN};
pub use employee::{Employee, EmployeeValidationError};
pub use ids::{AlertId, DeliveryId, EmployeeId, IdParseError, ItemId};
pub use item::{Item, ItemValidationError, StockStatus};
