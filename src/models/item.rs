//! Item model
//!
//! Represents a tracked office-supply unit with current/min/max quantity
//! bounds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ItemId;

/// Stock band an item currently falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    /// Nothing on hand
    Critical,
    /// Below the minimum
    Low,
    /// Between minimum and maximum
    Normal,
    /// Above the maximum
    Excess,
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "Critical"),
            Self::Low => write!(f, "Low"),
            Self::Normal => write!(f, "Normal"),
            Self::Excess => write!(f, "Excess"),
        }
    }
}

/// A tracked inventory item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier
    pub id: ItemId,

    /// Item name (e.g., "A4 paper ream")
    pub name: String,

    /// Grouping used by the ledger summary
    pub category: String,

    /// Units on hand; only mutated through the stock ledger
    pub quantity_current: u32,

    /// Reorder point
    pub quantity_minimum: u32,

    /// Recommended upper bound
    pub quantity_maximum: u32,

    /// Unit of measure (e.g., "box")
    pub unit: String,

    #[serde(default)]
    pub supplier: String,

    /// Inactive items cannot be delivered or restocked
    pub active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Create a new active item with no stock
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        quantity_minimum: u32,
        quantity_maximum: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ItemId::new(),
            name: name.into(),
            category: category.into(),
            quantity_current: 0,
            quantity_minimum,
            quantity_maximum,
            unit: "unit".to_string(),
            supplier: String::new(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style opening balance, used when the item is first created
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity_current = quantity;
        self
    }

    /// Builder-style unit of measure
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Mark this item as inactive
    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }

    /// Reactivate this item
    pub fn activate(&mut self) {
        self.active = true;
        self.updated_at = Utc::now();
    }

    /// Stock band using the plain minimum and maximum
    pub fn stock_status(&self) -> StockStatus {
        self.stock_status_with(100, 1.0)
    }

    /// Stock band with LOW below `low_percent` of the minimum and EXCESS
    /// above `excess_factor` times the maximum
    pub fn stock_status_with(&self, low_percent: u32, excess_factor: f64) -> StockStatus {
        let quantity = self.quantity_current;
        let low_threshold = u64::from(self.quantity_minimum) * u64::from(low_percent) / 100;

        if quantity == 0 {
            StockStatus::Critical
        } else if u64::from(quantity) < low_threshold {
            StockStatus::Low
        } else if f64::from(quantity) > f64::from(self.quantity_maximum) * excess_factor {
            StockStatus::Excess
        } else {
            StockStatus::Normal
        }
    }

    /// Quantity needed to bring the item back up to its maximum
    pub fn suggested_order_quantity(&self) -> u32 {
        if self.quantity_current >= self.quantity_minimum {
            return 0;
        }
        self.quantity_maximum.saturating_sub(self.quantity_current)
    }

    /// Validate the item
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(ItemValidationError::NameTooLong(self.name.len()));
        }

        if self.category.trim().is_empty() {
            return Err(ItemValidationError::EmptyCategory);
        }

        if self.unit.trim().is_empty() {
            return Err(ItemValidationError::EmptyUnit);
        }

        if self.quantity_minimum > self.quantity_maximum {
            return Err(ItemValidationError::MinimumAboveMaximum {
                minimum: self.quantity_minimum,
                maximum: self.quantity_maximum,
            });
        }

        Ok(())
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.name, self.quantity_current, self.unit)
    }
}

/// Validation errors for items
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    EmptyName,
    NameTooLong(usize),
    EmptyCategory,
    EmptyUnit,
    MinimumAboveMaximum { minimum: u32, maximum: u32 },
}

impl fmt::Display for ItemValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Item name cannot be empty"),
            Self::NameTooLong(len) => write!(f, "Item name too long ({} chars, max 100)", len),
            Self::EmptyCategory => write!(f, "Item category cannot be empty"),
            Self::EmptyUnit => write!(f, "Item unit cannot be empty"),
            Self::MinimumAboveMaximum { minimum, maximum } => write!(
                f,
                "Minimum quantity ({}) cannot exceed maximum quantity ({})",
                minimum, maximum
            ),
        }
    }
}

impl std::error::Error for ItemValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item() {
        let item = Item::new("Stapler", "Desk", 2, 10);
        assert_eq!(item.quantity_current, 0);
        assert!(item.active);
        assert_eq!(item.stock_status(), StockStatus::Critical);
    }

    #[test]
    fn test_stock_status_bands() {
        let item = Item::new("Pens", "Writing", 5, 20);
        assert_eq!(item.clone().with_quantity(3).stock_status(), StockStatus::Low);
        assert_eq!(item.clone().with_quantity(5).stock_status(), StockStatus::Normal);
        assert_eq!(item.clone().with_quantity(20).stock_status(), StockStatus::Normal);
        assert_eq!(item.with_quantity(21).stock_status(), StockStatus::Excess);
    }

    #[test]
    fn test_stock_status_with_configured_thresholds() {
        let item = Item::new("Pens", "Writing", 10, 20);
        let low = item.clone().with_quantity(4);
        let over = item.with_quantity(23);

        assert_eq!(low.stock_status_with(50, 1.0), StockStatus::Low);
        assert_eq!(low.with_quantity(6).stock_status_with(50, 1.0), StockStatus::Normal);
        assert_eq!(over.stock_status_with(100, 1.0), StockStatus::Excess);
        assert_eq!(over.stock_status_with(100, 1.2), StockStatus::Normal);
    }

    #[test]
    fn test_suggested_order_quantity() {
        let item = Item::new("Toner", "Printing", 4, 10).with_quantity(1);
        assert_eq!(item.suggested_order_quantity(), 9);
        assert_eq!(item.with_quantity(6).suggested_order_quantity(), 0);
    }

    #[test]
    fn test_validation() {
        let item = Item::new("Paper", "Printing", 5, 50);
        assert!(item.validate().is_ok());

        let bad = Item::new("", "Printing", 5, 50);
        assert_eq!(bad.validate(), Err(ItemValidationError::EmptyName));

        let inverted = Item::new("Paper", "Printing", 50, 5);
        assert!(matches!(
            inverted.validate(),
            Err(ItemValidationError::MinimumAboveMaximum { .. })
        ));

        let long = Item::new("x".repeat(101), "Printing", 1, 2);
        assert_eq!(long.validate(), Err(ItemValidationError::NameTooLong(101)));
    }
}
