//! Service layer for Stockroom
//!
//! Business logic on top of the store: stock mutation, deliveries, alert
//! derivation and item/employee maintenance.

pub mod alert;
pub mod delivery;
pub mod employee;
pub mod item;
pub mod ledger;

pub use alert::{AlertChanges, AlertEngine, AlertSummary};
pub use delivery::{DeliveryFilter, DeliveryService, DeliveryStatistics};
pub use employee::{EmployeeService, EmployeeUpdate};
pub use item::{ItemService, ItemUpdate, NewItem};
pub use ledger::{CategoryTotals, LedgerSummary, StockChange, StockLedger};
