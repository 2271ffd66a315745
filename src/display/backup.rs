//! Backup display formatting

use chrono::{DateTime, Utc};

use crate::backup::{BackupRecord, BackupReport, BackupState, CycleOutcome};

pub fn format_backup_list(backups: &[BackupRecord], now: DateTime<Utc>, verbose: bool) -> String {
    if backups.is_empty() {
        return "No backups found.\nCreate one with: stockroom backup create\n".to_string();
    }

    let mut output = String::new();
    output.push_str("Available Backups\n");
    output.push_str("=================\n\n");

    for (i, backup) in backups.iter().enumerate() {
        let age = format_duration(now.signed_duration_since(backup.created_at));
        if verbose {
            output.push_str(&format!(
                "{}. {} [{}]\n   Created: {}\n   Size: {}\n   Age: {}\n   Path: {}\n\n",
                i + 1,
                backup.filename,
                backup.kind,
                backup.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                format_size(backup.size_bytes),
                age,
                backup.path.display(),
            ));
        } else {
            output.push_str(&format!(
                "  {}. {} ({} ago, {}) [{}]\n",
                i + 1,
                backup.filename,
                age,
                format_size(backup.size_bytes),
                backup.kind,
            ));
        }
    }

    output.push_str(&format!("\nTotal: {} backup(s)\n", backups.len()));
    output
}

pub fn format_backup_report(report: &BackupReport) -> String {
    let record = &report.record;
    let mut output = String::new();
    output.push_str("Backup Details\n");
    output.push_str("==============\n");
    output.push_str(&format!("File: {}\n", record.path.display()));
    output.push_str(&format!("Kind: {}\n", record.kind));
    output.push_str(&format!("Size: {}\n", format_size(record.size_bytes)));
    output.push_str(&format!(
        "Created: {}\n",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("Integrity: {}\n", record.integrity));

    if let Some(version) = report.schema_version {
        output.push_str(&format!("Schema version: {}\n", version));
    }
    if let Some(checksum) = &report.checksum {
        output.push_str(&format!("Checksum: {}\n", checksum));
    }
    if let Some(counts) = &report.counts {
        output.push_str("\nContents:\n");
        output.push_str(&format!("  Items:         {}\n", counts.items));
        output.push_str(&format!("  Employees:     {}\n", counts.employees));
        output.push_str(&format!("  Deliveries:    {}\n", counts.deliveries));
        output.push_str(&format!("  Active alerts: {}\n", counts.active_alerts));
    }

    output.push_str(&format!("\nStatus: {}\n", report.summary()));
    output
}

pub fn format_backup_state(state: &BackupState) -> String {
    let stamp = |at: Option<DateTime<Utc>>| {
        at.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string())
    };

    let mut output = String::new();
    output.push_str(&format!("  Last attempt: {}\n", stamp(state.last_attempt)));
    output.push_str(&format!("  Last success: {}\n", stamp(state.last_success)));
    if let Some(backup) = &state.last_backup {
        output.push_str(&format!("  Last backup:  {}\n", backup));
    }
    output.push_str(&format!(
        "  Cycles:       {} succeeded, {} failed\n",
        state.success_count, state.failure_count
    ));
    if let Some(error) = &state.last_error {
        output.push_str(&format!("  Last error:   {}\n", error));
    }
    output
}

pub fn format_cycle_outcome(outcome: &CycleOutcome) -> String {
    match (&outcome.record, &outcome.error) {
        (Some(record), _) => {
            let mut line = format!(
                "{} backup written: {} ({})",
                outcome.kind,
                record.filename,
                format_size(record.size_bytes)
            );
            if !outcome.deleted.is_empty() {
                line.push_str(&format!(", {} old backup(s) removed", outcome.deleted.len()));
            }
            line
        }
        (None, error) => format!(
            "{} backup failed after {} attempt(s): {}",
            outcome.kind,
            outcome.attempts,
            error.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// Format a duration in human-readable form
pub fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    format!("{}d", hours / 24)
}

/// Format a size in bytes as a human-readable string
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_duration(chrono::Duration::minutes(90)), "1h");
        assert_eq!(format_duration(chrono::Duration::days(3)), "3d");
    }

    #[test]
    fn test_state_shows_never() {
        let output = format_backup_state(&BackupState::default());
        assert!(output.contains("Last success: never"));
    }
}
