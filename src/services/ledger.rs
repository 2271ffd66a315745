//! Stock ledger
//!
//! The only code path that changes `quantity_current`. Deliveries decrement
//! through [`StockLedger::apply_delta_in`] inside their own transaction;
//! restocks and manual adjustments go through [`StockLedger::apply_delta`]
//! or [`StockLedger::restock`].

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::info;

use crate::audit::{AuditEntry, EntityType};
use crate::config::AlertSettings;
use crate::error::{StockroomError, StockroomResult};
use crate::models::{Item, ItemId, StockStatus};
use crate::storage::{Dataset, Store};

use super::alert::AlertEngine;

/// Outcome of a committed quantity change
#[derive(Debug, Clone, PartialEq)]
pub struct StockChange {
    pub item: Item,
    pub previous_quantity: u32,
    pub delta: i64,
    pub reason: String,
}

impl StockChange {
    pub fn new_quantity(&self) -> u32 {
        self.item.quantity_current
    }

    fn audit_entry(&self) -> AuditEntry {
        let mut before = self.item.clone();
        before.quantity_current = self.previous_quantity;
        AuditEntry::update(
            EntityType::Item,
            self.item.id.to_string(),
            Some(self.item.name.clone()),
            &before,
            &self.item,
            Some(format!(
                "quantity_current: {} -> {} ({})",
                self.previous_quantity, self.item.quantity_current, self.reason
            )),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTotals {
    pub items: usize,
    pub units: u64,
}

/// Dashboard view of the whole ledger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    pub total_items: usize,
    pub active_items: usize,
    pub total_units: u64,
    pub critical_items: usize,
    pub low_items: usize,
    pub excess_items: usize,
    pub employees: usize,
    pub deliveries: usize,
    pub by_category: BTreeMap<String, CategoryTotals>,
}

pub struct StockLedger<'a> {
    store: &'a Store,
}

impl<'a> StockLedger<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Add `delta` to an item inside an open transaction.
    ///
    /// Returns the new quantity. Nothing is changed on error.
    pub fn apply_delta_in(
        data: &mut Dataset,
        item_id: ItemId,
        delta: i64,
        reason: &str,
    ) -> StockroomResult<StockChange> {
        if delta == 0 {
            return Err(StockroomError::Validation(
                "Stock adjustment must be non-zero".into(),
            ));
        }

        let item = data
            .items
            .get_mut(&item_id)
            .ok_or_else(|| StockroomError::item_not_found(item_id.to_string()))?;

        if !item.active {
            return Err(StockroomError::InactiveEntity {
                entity_type: "Item",
                identifier: item.name.clone(),
            });
        }

        let previous = item.quantity_current;
        let next = i64::from(previous) + delta;
        if next < 0 {
            return Err(StockroomError::InsufficientStock {
                item: item.name.clone(),
                requested: delta.unsigned_abs(),
                available: previous,
            });
        }
        let next = u32::try_from(next).map_err(|_| {
            StockroomError::Validation(format!(
                "Quantity for '{}' would exceed {}",
                item.name,
                u32::MAX
            ))
        })?;

        item.quantity_current = next;
        item.updated_at = Utc::now();

        Ok(StockChange {
            item: item.clone(),
            previous_quantity: previous,
            delta,
            reason: reason.to_string(),
        })
    }

    /// Adjust an item's quantity as its own durable transaction
    pub fn apply_delta(&self, item_id: ItemId, delta: i64, reason: &str) -> StockroomResult<u32> {
        let change = self
            .store
            .transaction(|data| Self::apply_delta_in(data, item_id, delta, reason))?;

        info!(
            item = %change.item.name,
            delta,
            quantity = change.new_quantity(),
            reason,
            "stock adjusted"
        );
        self.store.record_audit(&[change.audit_entry()]);
        Ok(change.new_quantity())
    }

    /// Receive stock and re-evaluate the item's alerts in one transaction
    pub fn restock(
        &self,
        item_id: ItemId,
        quantity: u32,
        reason: &str,
        alerts: &AlertEngine<'_>,
    ) -> StockroomResult<StockChange> {
        if quantity == 0 {
            return Err(StockroomError::Validation(
                "Restock quantity must be at least 1".into(),
            ));
        }

        let now = Utc::now();
        let change = self.store.transaction(|data| {
            let change = Self::apply_delta_in(data, item_id, i64::from(quantity), reason)?;
            alerts.evaluate_item_in(data, item_id, now);
            Ok(change)
        })?;

        info!(
            item = %change.item.name,
            quantity,
            on_hand = change.new_quantity(),
            "item restocked"
        );
        self.store.record_audit(&[change.audit_entry()]);
        Ok(change)
    }

    /// Active items at or below their reorder point, emptiest first
    pub fn items_needing_reorder(&self, thresholds: &AlertSettings) -> StockroomResult<Vec<Item>> {
        let mut items: Vec<Item> = self.store.read(|data| {
            data.items
                .values()
                .filter(|i| i.active)
                .filter(|i| {
                    matches!(
                        thresholds.stock_status(i),
                        StockStatus::Critical | StockStatus::Low
                    )
                })
                .cloned()
                .collect()
        })?;
        items.sort_by(|a, b| {
            a.quantity_current
                .cmp(&b.quantity_current)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(items)
    }

    /// Totals for the dashboard, with stock bands under `thresholds`
    pub fn summary(&self, thresholds: &AlertSettings) -> StockroomResult<LedgerSummary> {
        self.store.read(|data| {
            let mut summary = LedgerSummary {
                total_items: data.items.len(),
                employees: data.employees.values().filter(|e| e.active).count(),
                deliveries: data.deliveries.len(),
                ..Default::default()
            };

            for item in data.items.values().filter(|i| i.active) {
                summary.active_items += 1;
                summary.total_units += u64::from(item.quantity_current);
                match thresholds.stock_status(item) {
                    StockStatus::Critical => summary.critical_items += 1,
                    StockStatus::Low => summary.low_items += 1,
                    StockStatus::Excess => summary.excess_items += 1,
                    StockStatus::Normal => {}
                }
                let totals = summary.by_category.entry(item.category.clone()).or_default();
                totals.items += 1;
                totals.units += u64::from(item.quantity_current);
            }

            summary
        })
    }

    pub fn ledger_checksum(&self) -> StockroomResult<String> {
        self.store.ledger_checksum()
    }
}
