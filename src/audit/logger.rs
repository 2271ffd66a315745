//! Append-only audit logger
//!
//! Each entry is one JSON line, flushed as soon as it is written.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{StockroomError, StockroomResult};

use super::entry::{AuditEntry, EntityType};

/// Writes audit entries to the JSONL audit log
#[derive(Debug, Clone)]
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append an entry to the log
    pub fn log(&self, entry: &AuditEntry) -> StockroomResult<()> {
        self.log_batch(std::slice::from_ref(entry))
    }

    /// Append several entries with a single open and flush
    pub fn log_batch(&self, entries: &[AuditEntry]) -> StockroomResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut buffer = String::new();
        for entry in entries {
            let json = serde_json::to_string(entry).map_err(|e| {
                StockroomError::Json(format!("Failed to serialize audit entry: {}", e))
            })?;
            buffer.push_str(&json);
            buffer.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| StockroomError::Io(format!("Failed to open audit log: {}", e)))?;

        file.write_all(buffer.as_bytes())
            .map_err(|e| StockroomError::Io(format!("Failed to write audit entry: {}", e)))?;

        file.flush()
            .map_err(|e| StockroomError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Read all entries, oldest first
    pub fn read_all(&self) -> StockroomResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| StockroomError::Io(format!("Failed to open audit log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                StockroomError::Io(format!(
                    "Failed to read audit log line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| {
                StockroomError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            entries.push(entry);
        }

        Ok(entries)
    }

    /// The most recent `count` entries, optionally limited to one entity type
    pub fn read_recent(
        &self,
        count: usize,
        entity_type: Option<EntityType>,
    ) -> StockroomResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        if let Some(entity_type) = entity_type {
            entries.retain(|e| e.entity_type == entity_type);
        }
        let start = entries.len().saturating_sub(count);
        Ok(entries.split_off(start))
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::Operation;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_logger() -> (AuditLogger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("audit.log"));
        (logger, temp_dir)
    }

    fn item_entry(i: usize) -> AuditEntry {
        AuditEntry::create(
            EntityType::Item,
            format!("itm-{}", i),
            None,
            &json!({"index": i}),
        )
    }

    #[test]
    fn test_log_and_read() {
        let (logger, _temp) = create_test_logger();
        logger.log(&item_entry(1)).unwrap();

        let entries = logger.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Create);
        assert_eq!(entries[0].entity_id, "itm-1");
    }

    #[test]
    fn test_log_batch_appends_in_order() {
        let (logger, _temp) = create_test_logger();
        let entries: Vec<_> = (0..3).map(item_entry).collect();
        logger.log_batch(&entries).unwrap();
        logger.log(&item_entry(3)).unwrap();

        let ids: Vec<_> = logger
            .read_all()
            .unwrap()
            .into_iter()
            .map(|e| e.entity_id)
            .collect();
        assert_eq!(ids, vec!["itm-0", "itm-1", "itm-2", "itm-3"]);
    }

    #[test]
    fn test_read_recent_filters_by_entity() {
        let (logger, _temp) = create_test_logger();
        for i in 0..5 {
            logger.log(&item_entry(i)).unwrap();
        }
        logger
            .log(&AuditEntry::restore("manual-x.json.gz", "restored"))
            .unwrap();

        let recent = logger.read_recent(2, Some(EntityType::Item)).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].entity_id, "itm-3");
        assert_eq!(recent[1].entity_id, "itm-4");

        let backups = logger.read_recent(10, Some(EntityType::Backup)).unwrap();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn test_empty_log() {
        let (logger, _temp) = create_test_logger();
        assert!(logger.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_survives_restart() {
        let (logger, temp) = create_test_logger();
        logger.log(&item_entry(7)).unwrap();

        let reopened = AuditLogger::new(temp.path().join("audit.log"));
        assert_eq!(reopened.read_all().unwrap().len(), 1);
    }
}
