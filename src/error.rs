//! Custom error types for Stockroom
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for Stockroom operations
#[derive(Error, Debug)]
pub enum StockroomError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Malformed input, rejected before any side effect
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// A stock mutation would drive the quantity below zero
    #[error("Insufficient stock for '{item}': requested {requested}, available {available}")]
    InsufficientStock {
        item: String,
        requested: u64,
        available: u32,
    },

    /// The item or employee exists but has been deactivated
    #[error("{entity_type} is inactive: {identifier}")]
    InactiveEntity {
        entity_type: &'static str,
        identifier: String,
    },

    /// Storage-level failure while writing or reading a backup
    #[error("Backup I/O error: {0}")]
    BackupIo(String),

    /// Checksum or structural validation of a backup failed
    #[error("Backup integrity error: {0}")]
    BackupIntegrity(String),

    /// The restore target failed validation; the live store was not touched
    #[error("Restore aborted, backup failed validation: {0}")]
    RestoreValidation(String),

    /// Applying a validated restore failed; recover from the safety backup
    #[error("Restore failed: {reason} (pre-restore backup: {})", pre_restore.display())]
    RestoreFailed { reason: String, pre_restore: PathBuf },

    /// Lock contention did not clear within the retry budget
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl StockroomError {
    /// Create a "not found" error for items
    pub fn item_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Item",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for employees
    pub fn employee_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Employee",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for deliveries
    pub fn delivery_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Delivery",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for alerts
    pub fn alert_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Alert",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for backups
    pub fn backup_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an insufficient stock error
    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, Self::InsufficientStock { .. })
    }

    /// Errors raised by the backup pipeline that the scheduler retries
    pub fn is_backup_failure(&self) -> bool {
        matches!(
            self,
            Self::BackupIo(_) | Self::BackupIntegrity(_) | Self::Io(_) | Self::Json(_)
        )
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for StockroomError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StockroomError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Stockroom operations
pub type StockroomResult<T> = Result<T, StockroomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StockroomError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = StockroomError::item_not_found("Stapler");
        assert_eq!(err.to_string(), "Item not found: Stapler");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_insufficient_stock_error() {
        let err = StockroomError::InsufficientStock {
            item: "Toner".into(),
            requested: 5,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 'Toner': requested 5, available 3"
        );
        assert!(err.is_insufficient_stock());
    }

    #[test]
    fn test_restore_failed_names_safety_backup() {
        let err = StockroomError::RestoreFailed {
            reason: "rename failed".into(),
            pre_restore: PathBuf::from("/backups/pre-restore/x.json.gz"),
        };
        assert!(err.to_string().contains("/backups/pre-restore/x.json.gz"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StockroomError = io_err.into();
        assert!(matches!(err, StockroomError::Io(_)));
        assert!(err.is_backup_failure());
    }
}
