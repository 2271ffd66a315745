//! Delivery and employee display formatting

use crate::models::{Delivery, Employee};
use crate::services::DeliveryStatistics;

/// A delivery with its item and employee names resolved
pub struct DeliveryLine<'a> {
    pub delivery: &'a Delivery,
    pub item: &'a str,
    pub employee: &'a str,
}

pub fn format_delivery_list(lines: &[DeliveryLine<'_>]) -> String {
    if lines.is_empty() {
        return "No deliveries found.".to_string();
    }

    let item_width = lines.iter().map(|l| l.item.len()).max().unwrap_or(4).max(4);
    let employee_width = lines
        .iter()
        .map(|l| l.employee.len())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<16}  {:<item_width$}  {:>5}  {:<employee_width$}  {}\n",
        "Date",
        "Item",
        "Qty",
        "Employee",
        "Note",
        item_width = item_width,
        employee_width = employee_width,
    ));
    output.push_str(&format!(
        "{:-<16}  {:-<item_width$}  {:->5}  {:-<employee_width$}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        item_width = item_width,
        employee_width = employee_width,
    ));

    for line in lines {
        output.push_str(&format!(
            "{:<16}  {:<item_width$}  {:>5}  {:<employee_width$}  {}\n",
            line.delivery.delivered_at.format("%Y-%m-%d %H:%M"),
            line.item,
            line.delivery.quantity,
            line.employee,
            line.delivery.note,
            item_width = item_width,
            employee_width = employee_width,
        ));
    }

    output
}

pub fn format_delivery_statistics(stats: &DeliveryStatistics) -> String {
    let mut output = String::new();
    output.push_str("Delivery Statistics\n");
    output.push_str("===================\n");
    output.push_str(&format!("  Total deliveries: {}\n", stats.total));
    output.push_str(&format!("  Units delivered:  {}\n", stats.total_units));
    output.push_str(&format!("  Today:            {}\n", stats.today));
    output.push_str(&format!("  Last 7 days:      {}\n", stats.last_7_days));
    if let Some((item, units)) = &stats.most_delivered {
        output.push_str(&format!("  Most delivered:   {} ({} units)\n", item, units));
    }
    output
}

pub fn format_employee_list(employees: &[Employee]) -> String {
    if employees.is_empty() {
        return "No employees found.".to_string();
    }

    let name_width = employees
        .iter()
        .map(|e| e.full_name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<20}  {:<16}  {}\n",
        "Name",
        "External ID",
        "Department",
        "Status",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<20}  {:-<16}  {:-<8}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));
    for employee in employees {
        output.push_str(&format!(
            "{:<name_width$}  {:<20}  {:<16}  {}\n",
            employee.full_name,
            employee.external_id,
            employee.department,
            if employee.active { "" } else { "Inactive" },
            name_width = name_width,
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmployeeId, ItemId};
    use chrono::Utc;

    #[test]
    fn test_delivery_list_resolves_names() {
        let delivery = Delivery::new(
            EmployeeId::new(),
            ItemId::new(),
            3,
            Utc::now(),
            "front desk",
            "monthly kit",
        );
        let lines = [DeliveryLine {
            delivery: &delivery,
            item: "Stapler",
            employee: "Ana Torres",
        }];

        let output = format_delivery_list(&lines);
        assert!(output.contains("Stapler"));
        assert!(output.contains("Ana Torres"));
        assert!(output.contains("monthly kit"));
    }

    #[test]
    fn test_statistics_omit_missing_top_item() {
        let output = format_delivery_statistics(&DeliveryStatistics::default());
        assert!(output.contains("Total deliveries: 0"));
        assert!(!output.contains("Most delivered"));
    }
}
