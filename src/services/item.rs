//! Item service
//!
//! Create, edit and deactivate items. An opening quantity may be given when
//! the item is created; every later quantity change goes through the stock
//! ledger.

use chrono::Utc;
use tracing::info;

use crate::audit::{AuditEntry, EntityType};
use crate::error::{StockroomError, StockroomResult};
use crate::models::{Item, ItemId};
use crate::storage::{Dataset, Store};

use super::alert::AlertEngine;

/// Fields for a new item
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub minimum: u32,
    pub maximum: u32,
    pub unit: String,
    pub supplier: String,
}

/// Editable item fields; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub minimum: Option<u32>,
    pub maximum: Option<u32>,
    pub unit: Option<String>,
    pub supplier: Option<String>,
}

pub struct ItemService<'a> {
    store: &'a Store,
    alerts: &'a AlertEngine<'a>,
}

impl<'a> ItemService<'a> {
    pub fn new(store: &'a Store, alerts: &'a AlertEngine<'a>) -> Self {
        Self { store, alerts }
    }

    pub fn create(&self, new: NewItem) -> StockroomResult<Item> {
        let mut item = Item::new(new.name.trim(), new.category.trim(), new.minimum, new.maximum)
            .with_quantity(new.quantity)
            .with_unit(new.unit.trim());
        item.supplier = new.supplier.trim().to_string();
        item.validate()
            .map_err(|e| StockroomError::Validation(e.to_string()))?;

        let now = Utc::now();
        let created = item.clone();
        self.store.transaction(|data| {
            ensure_unique_name(data, &item.name, None)?;
            let id = item.id;
            data.items.insert(id, item);
            self.alerts.evaluate_item_in(data, id, now);
            Ok(())
        })?;

        info!(item = %created.name, quantity = created.quantity_current, "item created");
        self.store.log_create(
            EntityType::Item,
            created.id.to_string(),
            Some(created.name.clone()),
            &created,
        );
        Ok(created)
    }

    pub fn update(&self, id: ItemId, update: ItemUpdate) -> StockroomResult<Item> {
        let now = Utc::now();
        let (before, after) = self.store.transaction(|data| {
            let before = data
                .items
                .get(&id)
                .cloned()
                .ok_or_else(|| StockroomError::item_not_found(id.to_string()))?;

            let mut after = before.clone();
            if let Some(name) = update.name {
                after.name = name.trim().to_string();
            }
            if let Some(category) = update.category {
                after.category = category.trim().to_string();
            }
            if let Some(minimum) = update.minimum {
                after.quantity_minimum = minimum;
            }
            if let Some(maximum) = update.maximum {
                after.quantity_maximum = maximum;
            }
            if let Some(unit) = update.unit {
                after.unit = unit.trim().to_string();
            }
            if let Some(supplier) = update.supplier {
                after.supplier = supplier.trim().to_string();
            }
            after
                .validate()
                .map_err(|e| StockroomError::Validation(e.to_string()))?;
            ensure_unique_name(data, &after.name, Some(id))?;

            after.updated_at = now;
            data.items.insert(id, after.clone());
            self.alerts.evaluate_item_in(data, id, now);
            Ok((before, after))
        })?;

        info!(item = %after.name, "item updated");
        self.store.log_update(
            EntityType::Item,
            id.to_string(),
            Some(after.name.clone()),
            &before,
            &after,
        );
        Ok(after)
    }

    /// Soft delete; the item's open alerts are resolved
    pub fn deactivate(&self, id: ItemId) -> StockroomResult<Item> {
        self.set_active(id, false)
    }

    pub fn activate(&self, id: ItemId) -> StockroomResult<Item> {
        self.set_active(id, true)
    }

    fn set_active(&self, id: ItemId, active: bool) -> StockroomResult<Item> {
        let now = Utc::now();
        let item = self.store.transaction(|data| {
            let item = data
                .items
                .get_mut(&id)
                .ok_or_else(|| StockroomError::item_not_found(id.to_string()))?;
            if active {
                item.activate();
            } else {
                item.deactivate();
            }
            let item = item.clone();
            self.alerts.evaluate_item_in(data, id, now);
            Ok(item)
        })?;

        info!(item = %item.name, active, "item active flag changed");
        let entry = if active {
            AuditEntry::update(
                EntityType::Item,
                id.to_string(),
                Some(item.name.clone()),
                &serde_json::json!({"active": false}),
                &serde_json::json!({"active": true}),
                Some("active: false -> true".into()),
            )
        } else {
            AuditEntry::deactivate(EntityType::Item, id.to_string(), Some(item.name.clone()))
        };
        self.store.record_audit(&[entry]);
        Ok(item)
    }

    pub fn get(&self, id: ItemId) -> StockroomResult<Option<Item>> {
        self.store.read(|data| data.items.get(&id).cloned())
    }

    /// Find an item by name or ID string
    pub fn find(&self, identifier: &str) -> StockroomResult<Option<Item>> {
        self.store.read(|data| data.find_item(identifier).cloned())
    }

    /// Like [`find`](Self::find) but a missing item is an error
    pub fn require(&self, identifier: &str) -> StockroomResult<Item> {
        self.find(identifier)?
            .ok_or_else(|| StockroomError::item_not_found(identifier))
    }

    /// Items sorted by category then name
    pub fn list(&self, include_inactive: bool) -> StockroomResult<Vec<Item>> {
        let mut items: Vec<Item> = self.store.read(|data| {
            data.items
                .values()
                .filter(|i| include_inactive || i.active)
                .cloned()
                .collect()
        })?;
        items.sort_by(|a, b| {
            a.category
                .to_lowercase()
                .cmp(&b.category.to_lowercase())
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(items)
    }
}

fn ensure_unique_name(data: &Dataset, name: &str, exclude: Option<ItemId>) -> StockroomResult<()> {
    let lower = name.to_lowercase();
    let taken = data
        .items
        .values()
        .any(|i| Some(i.id) != exclude && i.name.to_lowercase() == lower);
    if taken {
        return Err(StockroomError::Duplicate {
            entity_type: "Item",
            identifier: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{paths::StockroomPaths, AlertSettings};
    use crate::models::AlertKind;
    use crate::storage::LockPolicy;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let paths = StockroomPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = Store::open(paths, LockPolicy::default()).unwrap();
        (temp_dir, store)
    }

    fn new_item(name: &str, quantity: u32) -> NewItem {
        NewItem {
            name: name.to_string(),
            category: "Printing".to_string(),
            quantity,
            minimum: 5,
            maximum: 20,
            unit: "ream".to_string(),
            supplier: String::new(),
        }
    }

    #[test]
    fn test_create_and_find() {
        let (_temp, store) = setup();
        let alerts = AlertEngine::new(&store, &AlertSettings::default());
        let service = ItemService::new(&store, &alerts);

        let item = service.create(new_item("A4 paper", 12)).unwrap();

        assert_eq!(service.find("a4 PAPER").unwrap().unwrap().id, item.id);
        assert_eq!(service.require(&item.id.to_string()).unwrap().id, item.id);
        assert!(service.require("A3 paper").unwrap_err().is_not_found());
        assert_eq!(store.audit_logger().read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_create_rejects_duplicates_and_bad_bounds() {
        let (_temp, store) = setup();
        let alerts = AlertEngine::new(&store, &AlertSettings::default());
        let service = ItemService::new(&store, &alerts);
        service.create(new_item("Stapler", 3)).unwrap();

        assert!(matches!(
            service.create(new_item("stapler", 3)),
            Err(StockroomError::Duplicate { .. })
        ));

        let mut inverted = new_item("Tape", 3);
        inverted.minimum = 30;
        assert!(service.create(inverted).unwrap_err().is_validation());
        assert!(service.create(new_item("  ", 3)).unwrap_err().is_validation());
    }

    #[test]
    fn test_create_with_low_opening_balance_raises_alert() {
        let (_temp, store) = setup();
        let alerts = AlertEngine::new(&store, &AlertSettings::default());
        let service = ItemService::new(&store, &alerts);

        service.create(new_item("Toner", 2)).unwrap();

        let active = alerts.list_active_alerts().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].kind, AlertKind::LowStock);
    }

    #[test]
    fn test_update_bounds_reevaluates_alerts() {
        let (_temp, store) = setup();
        let alerts = AlertEngine::new(&store, &AlertSettings::default());
        let service = ItemService::new(&store, &alerts);
        let item = service.create(new_item("Toner", 4)).unwrap();
        assert_eq!(alerts.list_active_alerts().unwrap().len(), 1);

        let updated = service
            .update(
                item.id,
                ItemUpdate {
                    minimum: Some(2),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.quantity_minimum, 2);
        assert_eq!(updated.quantity_current, 4);
        assert!(alerts.list_active_alerts().unwrap().is_empty());
    }

    #[test]
    fn test_deactivate_resolves_alerts_and_hides_item() {
        let (_temp, store) = setup();
        let alerts = AlertEngine::new(&store, &AlertSettings::default());
        let service = ItemService::new(&store, &alerts);
        let item = service.create(new_item("Toner", 0)).unwrap();

        service.deactivate(item.id).unwrap();

        assert!(alerts.list_active_alerts().unwrap().is_empty());
        assert!(service.list(false).unwrap().is_empty());
        assert_eq!(service.list(true).unwrap().len(), 1);

        service.activate(item.id).unwrap();
        assert_eq!(alerts.list_active_alerts().unwrap().len(), 1);
    }
}
