//! Alert model
//!
//! Alerts are derived from ledger state by the alert engine. At most one
//! unresolved alert exists per `(kind, subject)` pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{AlertId, ItemId};

/// Condition an alert reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    CriticalStock,
    LowStock,
    ExcessStock,
    FrequentDelivery,
    SystemError,
    BackupFailed,
}

impl AlertKind {
    /// All alert kinds, in display order
    pub fn all() -> &'static [AlertKind] {
        &[
            Self::CriticalStock,
            Self::LowStock,
            Self::ExcessStock,
            Self::FrequentDelivery,
            Self::SystemError,
            Self::BackupFailed,
        ]
    }

    /// Severity used when the engine raises this kind on its own
    pub fn default_severity(&self) -> AlertSeverity {
        match self {
            Self::CriticalStock => AlertSeverity::Critical,
            Self::LowStock => AlertSeverity::High,
            Self::FrequentDelivery => AlertSeverity::Medium,
            Self::ExcessStock => AlertSeverity::Low,
            Self::SystemError => AlertSeverity::High,
            Self::BackupFailed => AlertSeverity::High,
        }
    }

    /// Kinds derived from an item's stock level
    pub fn is_stock_kind(&self) -> bool {
        matches!(
            self,
            Self::CriticalStock | Self::LowStock | Self::ExcessStock
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CriticalStock => "CRITICAL_STOCK",
            Self::LowStock => "LOW_STOCK",
            Self::ExcessStock => "EXCESS_STOCK",
            Self::FrequentDelivery => "FREQUENT_DELIVERY",
            Self::SystemError => "SYSTEM_ERROR",
            Self::BackupFailed => "BACKUP_FAILED",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Unknown alert kind: {}", s))
    }
}

/// Alert severity; variants are declared lowest first so `Ord` ranks
/// `Critical` highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// Highest first
    pub fn all() -> &'static [AlertSeverity] {
        &[Self::Critical, Self::High, Self::Medium, Self::Low]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Severities that need an operator to act
    pub fn requires_action(&self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        Self::all()
            .iter()
            .copied()
            .find(|severity| severity.as_str() == normalized)
            .ok_or_else(|| format!("Unknown alert severity: {}", s))
    }
}

/// Deduplication key of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlertKey {
    pub kind: AlertKind,
    pub subject: Option<ItemId>,
}

impl AlertKey {
    pub fn new(kind: AlertKind, subject: Option<ItemId>) -> Self {
        Self { kind, subject }
    }

    pub fn for_item(kind: AlertKind, item_id: ItemId) -> Self {
        Self::new(kind, Some(item_id))
    }
}

/// How an alert left the active set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Resolution {
    /// The engine observed the condition clear
    Automatic,
    /// An operator acknowledged the alert
    Manual { operator: String },
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::Manual { operator } => write!(f, "manual ({})", operator),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub subject: Option<ItemId>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolution: Option<Resolution>,
}

impl Alert {
    pub fn new(
        kind: AlertKind,
        severity: AlertSeverity,
        subject: Option<ItemId>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AlertId::new(),
            kind,
            severity,
            subject,
            message: message.into(),
            created_at,
            resolved_at: None,
            resolution: None,
        }
    }

    pub fn key(&self) -> AlertKey {
        AlertKey::new(self.kind, self.subject)
    }

    pub fn is_active(&self) -> bool {
        self.resolved_at.is_none()
    }

    /// Close the alert. Resolving twice keeps the first resolution.
    pub fn resolve(&mut self, resolution: Resolution, at: DateTime<Utc>) {
        if self.is_active() {
            self.resolved_at = Some(at);
            self.resolution = Some(resolution);
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Critical > AlertSeverity::High);
        assert!(AlertSeverity::High > AlertSeverity::Medium);
        assert!(AlertSeverity::Medium > AlertSeverity::Low);
    }

    #[test]
    fn test_default_severities() {
        assert_eq!(AlertKind::CriticalStock.default_severity(), AlertSeverity::Critical);
        assert_eq!(AlertKind::LowStock.default_severity(), AlertSeverity::High);
        assert_eq!(AlertKind::FrequentDelivery.default_severity(), AlertSeverity::Medium);
        assert_eq!(AlertKind::ExcessStock.default_severity(), AlertSeverity::Low);
        assert_eq!(AlertKind::BackupFailed.default_severity(), AlertSeverity::High);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("low_stock".parse::<AlertKind>().unwrap(), AlertKind::LowStock);
        assert_eq!("BACKUP-FAILED".parse::<AlertKind>().unwrap(), AlertKind::BackupFailed);
        assert!("nope".parse::<AlertKind>().is_err());
        assert_eq!("high".parse::<AlertSeverity>().unwrap(), AlertSeverity::High);
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_string(&AlertKind::FrequentDelivery).unwrap();
        assert_eq!(json, "\"FREQUENT_DELIVERY\"");
        let json = serde_json::to_string(&AlertSeverity::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }

    #[test]
    fn test_resolve_is_terminal() {
        let now = Utc::now();
        let mut alert = Alert::new(
            AlertKind::SystemError,
            AlertSeverity::High,
            None,
            "disk full",
            now,
        );
        assert!(alert.is_active());

        alert.resolve(Resolution::Manual { operator: "ana".into() }, now);
        alert.resolve(Resolution::Automatic, now);

        assert!(!alert.is_active());
        assert_eq!(
            alert.resolution,
            Some(Resolution::Manual { operator: "ana".into() })
        );
    }
}
