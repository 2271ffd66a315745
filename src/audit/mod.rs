//! Audit logging for Stockroom
//!
//! Business events (item and employee changes, deliveries, restocks, alert
//! resolutions, backups and restores) are appended to `audit.log` as
//! line-delimited JSON. This trail is separate from the diagnostic
//! `tracing` output.
//!
//! # Example
//!
//! ```rust,ignore
//! use stockroom::audit::{AuditEntry, AuditLogger, EntityType};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! logger.log(&AuditEntry::create(
//!     EntityType::Item,
//!     item.id.to_string(),
//!     Some(item.name.clone()),
//!     &item,
//! ))?;
//! ```

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
