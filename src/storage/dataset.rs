//! The persisted ledger document
//!
//! All entities live in one JSON document so a transaction commits with a
//! single atomic rename. Maps are ordered so the same ledger always
//! serializes to the same bytes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::StockroomError;
use crate::models::{Alert, AlertKey, Delivery, Employee, EmployeeId, Item, ItemId};

/// Current on-disk layout version
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub schema_version: u32,

    #[serde(default)]
    pub items: BTreeMap<ItemId, Item>,

    #[serde(default)]
    pub employees: BTreeMap<EmployeeId, Employee>,

    /// Append-only
    #[serde(default)]
    pub deliveries: Vec<Delivery>,

    #[serde(default)]
    pub alerts: Vec<Alert>,

    /// Alert keys an operator resolved while the condition still held
    #[serde(default)]
    pub suppressed_alerts: BTreeSet<AlertKey>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            items: BTreeMap::new(),
            employees: BTreeMap::new(),
            deliveries: Vec::new(),
            alerts: Vec::new(),
            suppressed_alerts: BTreeSet::new(),
        }
    }
}

/// Borrowed view hashed by [`Dataset::checksum`]
#[derive(Serialize)]
struct ChecksumView<'a> {
    items: &'a BTreeMap<ItemId, Item>,
    employees: &'a BTreeMap<EmployeeId, Employee>,
    deliveries: &'a [Delivery],
}

impl Dataset {
    /// Hex SHA-256 over items, employees and deliveries.
    ///
    /// Alerts are derived state and are excluded, so a ledger restored from
    /// a backup hashes the same as the ledger the backup was taken from.
    pub fn checksum(&self) -> Result<String, StockroomError> {
        let view = ChecksumView {
            items: &self.items,
            employees: &self.employees,
            deliveries: &self.deliveries,
        };
        let bytes = serde_json::to_vec(&view)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    /// Find an item by exact id, display id (`itm-xxxxxxxx`) or name
    /// (case-insensitive)
    pub fn find_item(&self, query: &str) -> Option<&Item> {
        if let Ok(id) = query.parse::<ItemId>() {
            if let Some(item) = self.items.get(&id) {
                return Some(item);
            }
        }
        let lower = query.trim().to_lowercase();
        self.items
            .values()
            .find(|item| item.id.matches(query) || item.name.to_lowercase() == lower)
    }

    /// Find an employee by exact id, display id, external id or name
    pub fn find_employee(&self, query: &str) -> Option<&Employee> {
        if let Ok(id) = query.parse::<EmployeeId>() {
            if let Some(employee) = self.employees.get(&id) {
                return Some(employee);
            }
        }
        let lower = query.trim().to_lowercase();
        self.employees.values().find(|employee| {
            employee.id.matches(query)
                || employee.external_id.to_lowercase() == lower
                || employee.full_name.to_lowercase() == lower
        })
    }

    /// Find an alert by exact or display id
    pub fn find_alert(&self, query: &str) -> Option<&Alert> {
        self.alerts.iter().find(|alert| alert.id.matches(query))
    }

    /// Structural checks a ledger must pass before it may become live.
    ///
    /// Returns a list of human-readable problems; empty means valid.
    pub fn structural_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.schema_version != SCHEMA_VERSION {
            problems.push(format!(
                "unsupported schema version {} (expected {})",
                self.schema_version, SCHEMA_VERSION
            ));
        }

        for (id, item) in &self.items {
            if *id != item.id {
                problems.push(format!("item keyed {} carries id {}", id, item.id));
            }
            if item.quantity_minimum > item.quantity_maximum {
                problems.push(format!(
                    "item '{}' has minimum {} above maximum {}",
                    item.name, item.quantity_minimum, item.quantity_maximum
                ));
            }
        }

        for (id, employee) in &self.employees {
            if *id != employee.id {
                problems.push(format!("employee keyed {} carries id {}", id, employee.id));
            }
        }

        for delivery in &self.deliveries {
            if delivery.quantity == 0 {
                problems.push(format!("delivery {} has zero quantity", delivery.id));
            }
            if !self.items.contains_key(&delivery.item_id) {
                problems.push(format!(
                    "delivery {} references unknown item {}",
                    delivery.id, delivery.item_id
                ));
            }
            if !self.employees.contains_key(&delivery.employee_id) {
                problems.push(format!(
                    "delivery {} references unknown employee {}",
                    delivery.id, delivery.employee_id
                ));
            }
        }

        let mut open_keys = BTreeSet::new();
        for alert in self.alerts.iter().filter(|a| a.is_active()) {
            if !open_keys.insert(alert.key()) {
                problems.push(format!(
                    "more than one open {} alert for the same subject",
                    alert.kind
                ));
            }
        }

        problems
    }

    /// Counts used in backup and restore reports
    pub fn counts(&self) -> DatasetCounts {
        DatasetCounts {
            items: self.items.len(),
            employees: self.employees.len(),
            deliveries: self.deliveries.len(),
            active_alerts: self.alerts.iter().filter(|a| a.is_active()).count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatasetCounts {
    pub items: usize,
    pub employees: usize,
    pub deliveries: usize,
    pub active_alerts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertKind, AlertSeverity};
    use chrono::Utc;

    fn sample() -> Dataset {
        let mut dataset = Dataset::default();
        let item = Item::new("Stapler", "Desk", 2, 10).with_quantity(4);
        let employee = Employee::new("Ana Torres", "1002003");
        dataset.deliveries.push(Delivery::new(
            employee.id,
            item.id,
            1,
            Utc::now(),
            "front desk",
            "",
        ));
        dataset.items.insert(item.id, item);
        dataset.employees.insert(employee.id, employee);
        dataset
    }

    #[test]
    fn test_checksum_is_stable_and_ignores_alerts() {
        let mut dataset = sample();
        let before = dataset.checksum().unwrap();
        assert_eq!(before.len(), 64);
        assert_eq!(before, dataset.clone().checksum().unwrap());

        dataset.alerts.push(Alert::new(
            AlertKind::SystemError,
            AlertSeverity::High,
            None,
            "x",
            Utc::now(),
        ));
        assert_eq!(before, dataset.checksum().unwrap());

        let id = *dataset.items.keys().next().unwrap();
        dataset.items.get_mut(&id).unwrap().quantity_current += 1;
        assert_ne!(before, dataset.checksum().unwrap());
    }

    #[test]
    fn test_structural_problems() {
        let mut dataset = sample();
        assert!(dataset.structural_problems().is_empty());

        dataset.employees.clear();
        let problems = dataset.structural_problems();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("unknown employee"));
    }

    #[test]
    fn test_duplicate_open_alerts_are_a_problem() {
        let mut dataset = Dataset::default();
        for _ in 0..2 {
            dataset.alerts.push(Alert::new(
                AlertKind::BackupFailed,
                AlertSeverity::High,
                None,
                "failed",
                Utc::now(),
            ));
        }
        assert_eq!(dataset.structural_problems().len(), 1);
    }

    #[test]
    fn test_find_item_by_name_and_display_id() {
        let dataset = sample();
        let item = dataset.items.values().next().unwrap();
        assert_eq!(dataset.find_item("stapler").unwrap().id, item.id);
        assert_eq!(dataset.find_item(&item.id.to_string()).unwrap().id, item.id);
        assert!(dataset.find_item("scissors").is_none());
        assert!(dataset.find_employee("1002003").is_some());
    }

    #[test]
    fn test_find_alert_by_display_id() {
        let mut dataset = Dataset::default();
        let alert = Alert::new(AlertKind::SystemError, AlertSeverity::High, None, "x", Utc::now());
        let id = alert.id;
        dataset.alerts.push(alert);

        assert_eq!(dataset.find_alert(&id.to_string()).unwrap().id, id);
        assert_eq!(dataset.find_alert(&id.as_uuid().to_string()).unwrap().id, id);
        assert!(dataset.find_alert("alr-00000000").is_none());
    }
}
