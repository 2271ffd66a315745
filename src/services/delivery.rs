//! Delivery service
//!
//! Records stock issued to employees. Validation, the ledger decrement, the
//! delivery insert and alert re-evaluation run in one store transaction, so
//! a failure at any step leaves no trace.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::audit::EntityType;
use crate::error::{StockroomError, StockroomResult};
use crate::models::{
    Delivery, DeliveryId, EmployeeId, ItemId, MAX_DELIVERER_LEN, MAX_NOTE_LEN,
};
use crate::storage::Store;

use super::alert::AlertEngine;
use super::ledger::StockLedger;

/// Filter for delivery history queries
#[derive(Debug, Clone, Default)]
pub struct DeliveryFilter {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub employee_id: Option<EmployeeId>,
    pub item_id: Option<ItemId>,
    pub limit: Option<usize>,
}

impl DeliveryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn employee(mut self, employee_id: EmployeeId) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    pub fn item(mut self, item_id: ItemId) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, delivery: &Delivery) -> bool {
        self.since.map_or(true, |s| delivery.delivered_at >= s)
            && self.until.map_or(true, |u| delivery.delivered_at < u)
            && self.employee_id.map_or(true, |e| delivery.employee_id == e)
            && self.item_id.map_or(true, |i| delivery.item_id == i)
    }
}

/// Delivery counts for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryStatistics {
    pub total: usize,
    pub total_units: u64,
    pub today: usize,
    pub last_7_days: usize,
    /// Item with the most units delivered, and that unit count
    pub most_delivered: Option<(String, u64)>,
}

pub struct DeliveryService<'a> {
    store: &'a Store,
    alerts: &'a AlertEngine<'a>,
}

impl<'a> DeliveryService<'a> {
    pub fn new(store: &'a Store, alerts: &'a AlertEngine<'a>) -> Self {
        Self { store, alerts }
    }

    /// Issue `quantity` units of an item to an employee
    pub fn record_delivery(
        &self,
        employee_id: EmployeeId,
        item_id: ItemId,
        quantity: u32,
        deliverer: &str,
        note: &str,
    ) -> StockroomResult<Delivery> {
        let deliverer = deliverer.trim();
        let note = note.trim();
        validate_input(quantity, deliverer, note)?;

        let now = Utc::now();
        let (delivery, change) = self.store.transaction(|data| {
            let employee = data
                .employees
                .get(&employee_id)
                .ok_or_else(|| StockroomError::employee_not_found(employee_id.to_string()))?;
            if !employee.active {
                return Err(StockroomError::InactiveEntity {
                    entity_type: "Employee",
                    identifier: employee.full_name.clone(),
                });
            }

            let change = StockLedger::apply_delta_in(
                data,
                item_id,
                -i64::from(quantity),
                "delivery",
            )?;

            let delivery = Delivery::new(employee_id, item_id, quantity, now, deliverer, note);
            data.deliveries.push(delivery.clone());

            self.alerts.evaluate_item_in(data, item_id, now);

            Ok((delivery, change))
        })?;

        info!(
            delivery = %delivery.id,
            item = %change.item.name,
            quantity,
            remaining = change.new_quantity(),
            "delivery recorded"
        );
        self.store.log_create(
            EntityType::Delivery,
            delivery.id.to_string(),
            Some(change.item.name.clone()),
            &delivery,
        );

        Ok(delivery)
    }

    pub fn get(&self, id: DeliveryId) -> StockroomResult<Delivery> {
        self.store
            .read(|data| data.deliveries.iter().find(|d| d.id == id).cloned())?
            .ok_or_else(|| StockroomError::delivery_not_found(id.to_string()))
    }

    /// Deliveries matching the filter, newest first
    pub fn history(&self, filter: &DeliveryFilter) -> StockroomResult<Vec<Delivery>> {
        let mut deliveries: Vec<Delivery> = self.store.read(|data| {
            data.deliveries
                .iter()
                .filter(|d| filter.matches(d))
                .cloned()
                .collect()
        })?;

        deliveries.sort_by(|a, b| b.delivered_at.cmp(&a.delivered_at));
        if let Some(limit) = filter.limit {
            deliveries.truncate(limit);
        }
        Ok(deliveries)
    }

    pub fn deliveries_today(&self) -> StockroomResult<Vec<Delivery>> {
        self.history(&DeliveryFilter::new().since(start_of_today()))
    }

    pub fn statistics(&self) -> StockroomResult<DeliveryStatistics> {
        let today = start_of_today();
        let week_ago = Utc::now() - Duration::days(7);

        self.store.read(|data| {
            let mut stats = DeliveryStatistics {
                total: data.deliveries.len(),
                ..Default::default()
            };
            let mut units_by_item: HashMap<ItemId, u64> = HashMap::new();

            for delivery in &data.deliveries {
                stats.total_units += u64::from(delivery.quantity);
                if delivery.delivered_at >= today {
                    stats.today += 1;
                }
                if delivery.delivered_at >= week_ago {
                    stats.last_7_days += 1;
                }
                *units_by_item.entry(delivery.item_id).or_default() += u64::from(delivery.quantity);
            }

            stats.most_delivered = units_by_item
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
                .map(|(item_id, units)| {
                    let name = match data.items.get(&item_id) {
                        Some(item) => item.name.clone(),
                        None => {
                            warn!(item = %item_id, "delivery references unknown item");
                            item_id.to_string()
                        }
                    };
                    (name, units)
                });

            stats
        })
    }
}

fn validate_input(quantity: u32, deliverer: &str, note: &str) -> StockroomResult<()> {
    if quantity == 0 {
        return Err(StockroomError::Validation(
            "Delivery quantity must be at least 1".into(),
        ));
    }
    if deliverer.chars().count() > MAX_DELIVERER_LEN {
        return Err(StockroomError::Validation(format!(
            "Deliverer name too long (max {} chars)",
            MAX_DELIVERER_LEN
        )));
    }
    if note.chars().count() > MAX_NOTE_LEN {
        return Err(StockroomError::Validation(format!(
            "Delivery note too long (max {} chars)",
            MAX_NOTE_LEN
        )));
    }
    Ok(())
}

fn start_of_today() -> DateTime<Utc> {
    Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or_else(Utc::now)
}
