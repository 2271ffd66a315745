//! Delivery model
//!
//! An immutable record of stock issued to an employee. Corrections are made
//! with new deliveries or restocks, never by editing an existing record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{DeliveryId, EmployeeId, ItemId};

pub const MAX_DELIVERER_LEN: usize = 100;
pub const MAX_NOTE_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub employee_id: EmployeeId,
    pub item_id: ItemId,
    pub quantity: u32,
    pub delivered_at: DateTime<Utc>,
    /// Who handed the stock over
    #[serde(default)]
    pub deliverer: String,
    #[serde(default)]
    pub note: String,
}

impl Delivery {
    pub fn new(
        employee_id: EmployeeId,
        item_id: ItemId,
        quantity: u32,
        delivered_at: DateTime<Utc>,
        deliverer: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            id: DeliveryId::new(),
            employee_id,
            item_id,
            quantity,
            delivered_at,
            deliverer: deliverer.into(),
            note: note.into(),
        }
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x{} on {}",
            self.id,
            self.quantity,
            self.delivered_at.format("%Y-%m-%d %H:%M")
        )
    }
}
