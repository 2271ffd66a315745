//! Dashboard formatting

use crate::config::AlertSettings;
use crate::display::item::format_item_list;
use crate::models::Item;
use crate::services::{AlertSummary, LedgerSummary};

pub fn format_dashboard(
    ledger: &LedgerSummary,
    alerts: &AlertSummary,
    reorder: &[Item],
    thresholds: &AlertSettings,
) -> String {
    let mut output = String::new();

    output.push_str("Stockroom Summary\n");
    output.push_str("=================\n");
    output.push_str(&format!(
        "  Items:      {} ({} active)\n",
        ledger.total_items, ledger.active_items
    ));
    output.push_str(&format!("  Units:      {}\n", ledger.total_units));
    output.push_str(&format!("  Employees:  {}\n", ledger.employees));
    output.push_str(&format!("  Deliveries: {}\n", ledger.deliveries));
    output.push_str(&format!(
        "  Stock:      {} critical, {} low, {} excess\n",
        ledger.critical_items, ledger.low_items, ledger.excess_items
    ));
    output.push_str(&format!(
        "  Alerts:     {} active, {} need action\n",
        alerts.total_active, alerts.action_required
    ));

    if !ledger.by_category.is_empty() {
        output.push_str("\nBy category:\n");
        for (category, totals) in &ledger.by_category {
            output.push_str(&format!(
                "  {:<20} {:>4} item(s) {:>8} unit(s)\n",
                category, totals.items, totals.units
            ));
        }
    }

    if !reorder.is_empty() {
        output.push_str("\nNeeds reorder:\n");
        output.push_str(&format_item_list(reorder, thresholds));
    }

    output
}
