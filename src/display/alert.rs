//! Alert display formatting

use crate::models::{Alert, AlertSeverity};
use crate::services::AlertSummary;

/// Format alerts, most severe first
pub fn format_alert_list(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "No active alerts.".to_string();
    }

    let mut sorted: Vec<&Alert> = alerts.iter().collect();
    sorted.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<8}  {:<17}  {:<16}  {}\n",
        "ID", "Severity", "Kind", "Raised", "Message"
    ));
    output.push_str(&format!(
        "{:-<12}  {:-<8}  {:-<17}  {:-<16}  {:-<20}\n",
        "", "", "", "", ""
    ));

    for alert in sorted {
        let status = match &alert.resolution {
            Some(resolution) => format!(" [resolved: {}]", resolution),
            None => String::new(),
        };
        output.push_str(&format!(
            "{:<12}  {:<8}  {:<17}  {:<16}  {}{}\n",
            alert.id.to_string(),
            alert.severity.as_str(),
            alert.kind.as_str(),
            alert.created_at.format("%Y-%m-%d %H:%M"),
            alert.message,
            status,
        ));
    }

    output
}

pub fn format_alert_summary(summary: &AlertSummary) -> String {
    let mut output = String::new();
    output.push_str("Alert Summary\n");
    output.push_str("=============\n");
    output.push_str(&format!("  Active:          {}\n", summary.total_active));
    output.push_str(&format!("  Action required: {}\n", summary.action_required));

    if summary.total_active > 0 {
        output.push_str("\n  By severity:\n");
        for severity in AlertSeverity::all() {
            if let Some(count) = summary.by_severity.get(severity) {
                output.push_str(&format!("    {:<10} {}\n", severity.as_str(), count));
            }
        }

        output.push_str("\n  By kind:\n");
        for (kind, count) in &summary.by_kind {
            output.push_str(&format!("    {:<18} {}\n", kind.as_str(), count));
        }
    }

    output
}
