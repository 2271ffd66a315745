//! Audit entry data structures
//!
//! Defines the operations, audited entity types and the JSONL entry format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    /// Soft delete; nothing in the ledger is physically removed
    Deactivate,
    /// Live ledger replaced from a backup
    Restore,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Deactivate => write!(f, "DEACTIVATE"),
            Operation::Restore => write!(f, "RESTORE"),
        }
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Item,
    Employee,
    Delivery,
    Alert,
    Backup,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Item => write!(f, "Item"),
            EntityType::Employee => write!(f, "Employee"),
            EntityType::Delivery => write!(f, "Delivery"),
            EntityType::Alert => write!(f, "Alert"),
            EntityType::Backup => write!(f, "Backup"),
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "item" | "items" => Ok(EntityType::Item),
            "employee" | "employees" => Ok(EntityType::Employee),
            "delivery" | "deliveries" => Ok(EntityType::Delivery),
            "alert" | "alerts" => Ok(EntityType::Alert),
            "backup" | "backups" => Ok(EntityType::Backup),
            other => Err(format!("Unknown entity type: {}", other)),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    pub entity_type: EntityType,

    /// Display ID of the affected entity, or the backup filename
    pub entity_id: String,

    /// Human-readable description of the entity (e.g., item name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,

    /// Human-readable diff summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

impl AuditEntry {
    fn new(
        operation: Operation,
        entity_type: EntityType,
        entity_id: String,
        entity_name: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id,
            entity_name,
            before: None,
            after: None,
            diff_summary: None,
        }
    }

    /// Entry for a newly created entity
    pub fn create<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        let mut entry = Self::new(Operation::Create, entity_type, entity_id.into(), entity_name);
        entry.after = serde_json::to_value(entity).ok();
        entry
    }

    /// Entry for a changed entity, with both states recorded
    pub fn update<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        diff_summary: Option<String>,
    ) -> Self {
        let mut entry = Self::new(Operation::Update, entity_type, entity_id.into(), entity_name);
        entry.before = serde_json::to_value(before).ok();
        entry.after = serde_json::to_value(after).ok();
        entry.diff_summary = diff_summary;
        entry
    }

    /// Entry for a deactivated item or employee
    pub fn deactivate(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
    ) -> Self {
        let mut entry = Self::new(
            Operation::Deactivate,
            entity_type,
            entity_id.into(),
            entity_name,
        );
        entry.diff_summary = Some("active: true -> false".to_string());
        entry
    }

    /// Entry for a ledger restored from the named backup
    pub fn restore(backup_filename: impl Into<String>, summary: impl Into<String>) -> Self {
        let mut entry = Self::new(
            Operation::Restore,
            EntityType::Backup,
            backup_filename.into(),
            None,
        );
        entry.diff_summary = Some(summary.into());
        entry
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        if let Some(diff) = &self.diff_summary {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}
