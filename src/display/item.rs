//! Item display formatting
//!
//! Formats items for terminal output in table and detail views.

use crate::config::AlertSettings;
use crate::models::{Item, StockStatus};

/// Format a list of items with stock levels as a table
pub fn format_item_list(items: &[Item], thresholds: &AlertSettings) -> String {
    if items.is_empty() {
        return "No items found.".to_string();
    }

    let name_width = items
        .iter()
        .map(|i| i.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let category_width = items
        .iter()
        .map(|i| i.category.len())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<category_width$}  {:>8}  {:>6}  {:>6}  {}\n",
        "Name",
        "Category",
        "On Hand",
        "Min",
        "Max",
        "Status",
        name_width = name_width,
        category_width = category_width,
    ));

    output.push_str(&format!(
        "{:-<name_width$}  {:-<category_width$}  {:->8}  {:->6}  {:->6}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
        category_width = category_width,
    ));

    for item in items {
        let status = if item.active {
            status_label(thresholds.stock_status(item)).to_string()
        } else {
            "Inactive".to_string()
        };

        output.push_str(&format!(
            "{:<name_width$}  {:<category_width$}  {:>8}  {:>6}  {:>6}  {}\n",
            item.name,
            item.category,
            item.quantity_current,
            item.quantity_minimum,
            item.quantity_maximum,
            status,
            name_width = name_width,
            category_width = category_width,
        ));
    }

    let total_units: u64 = items.iter().map(|i| u64::from(i.quantity_current)).sum();
    output.push_str(&format!(
        "\n{} item(s), {} unit(s) on hand\n",
        items.len(),
        total_units
    ));

    output
}

/// Format a single item's details
pub fn format_item_details(item: &Item, thresholds: &AlertSettings) -> String {
    let mut output = String::new();

    output.push_str(&format!("Item: {}\n", item.name));
    output.push_str(&format!("  ID:             {}\n", item.id));
    output.push_str(&format!("  Category:       {}\n", item.category));
    output.push_str(&format!(
        "  On hand:        {} {}\n",
        item.quantity_current, item.unit
    ));
    output.push_str(&format!(
        "  Range:          {} - {}\n",
        item.quantity_minimum, item.quantity_maximum
    ));
    output.push_str(&format!("  Status:         {}\n", thresholds.stock_status(item)));
    if !item.supplier.is_empty() {
        output.push_str(&format!("  Supplier:       {}\n", item.supplier));
    }
    output.push_str(&format!(
        "  Active:         {}\n",
        if item.active { "Yes" } else { "No" }
    ));

    let reorder = item.suggested_order_quantity();
    if reorder > 0 {
        output.push_str(&format!("  Suggested order: {} {}\n", reorder, item.unit));
    }

    output
}

fn status_label(status: StockStatus) -> &'static str {
    match status {
        StockStatus::Critical => "CRITICAL",
        StockStatus::Low => "Low",
        StockStatus::Normal => "",
        StockStatus::Excess => "Excess",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_list_shows_status() {
        let items = vec![
            Item::new("Stapler", "Desk", 2, 10).with_quantity(0),
            Item::new("Pens", "Writing", 10, 100).with_quantity(40),
        ];

        let output = format_item_list(&items, &AlertSettings::default());
        assert!(output.contains("CRITICAL"));
        assert!(output.contains("Pens"));
        assert!(output.contains("2 item(s), 40 unit(s)"));
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_item_list(&[], &AlertSettings::default()), "No items found.");
    }

    #[test]
    fn test_details_suggest_reorder() {
        let item = Item::new("Toner", "Printing", 4, 12).with_quantity(1);
        let output = format_item_details(&item, &AlertSettings::default());
        assert!(output.contains("Suggested order: 11"));
    }

    #[test]
    fn test_status_follows_configured_excess_factor() {
        let items = vec![Item::new("Folders", "Filing", 2, 10).with_quantity(11)];
        let lenient = AlertSettings {
            excess_stock_factor: 1.2,
            ..AlertSettings::default()
        };

        assert!(format_item_list(&items, &AlertSettings::default()).contains("Excess"));
        assert!(!format_item_list(&items, &lenient).contains("Excess"));
    }
}
