//! Backup archive codec
//!
//! Archives are JSON, gzip-compressed. Decoding and verification report
//! every failure as `BackupIntegrity`; only filesystem errors are
//! `BackupIo`.

use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::{StockroomError, StockroomResult};
use crate::storage::{Dataset, SCHEMA_VERSION};

use super::BackupKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupArchive {
    pub schema_version: u32,
    pub kind: BackupKind,
    pub created_at: DateTime<Utc>,
    /// Ledger checksum at snapshot time
    pub checksum: String,
    pub ledger: Dataset,
}

impl BackupArchive {
    pub fn new(
        ledger: Dataset,
        kind: BackupKind,
        created_at: DateTime<Utc>,
    ) -> StockroomResult<Self> {
        Ok(Self {
            schema_version: SCHEMA_VERSION,
            kind,
            created_at,
            checksum: ledger.checksum()?,
            ledger,
        })
    }

    /// Serialize and gzip
    pub fn encode(&self) -> StockroomResult<Vec<u8>> {
        let json = serde_json::to_vec(self)
            .map_err(|e| StockroomError::BackupIo(format!("Failed to serialize backup: {}", e)))?;

        let buffer = Vec::with_capacity(json.len() / 4 + 64);
        let mut encoder = GzEncoder::new(buffer, Compression::default());
        encoder
            .write_all(&json)
            .map_err(|e| StockroomError::BackupIo(format!("gzip encoding failed: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| StockroomError::BackupIo(format!("gzip finalize failed: {}", e)))
    }

    /// Gunzip and parse, without verifying contents
    pub fn decode(bytes: &[u8]) -> StockroomResult<Self> {
        let mut decoder = GzDecoder::new(bytes);
        let mut json = Vec::new();
        decoder.read_to_end(&mut json).map_err(|e| {
            StockroomError::BackupIntegrity(format!("not a valid gzip stream: {}", e))
        })?;

        serde_json::from_slice(&json)
            .map_err(|e| StockroomError::BackupIntegrity(format!("malformed archive: {}", e)))
    }

    /// Schema, checksum and structural checks
    pub fn verify(&self) -> StockroomResult<()> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(StockroomError::BackupIntegrity(format!(
                "unsupported archive schema version {} (expected {})",
                self.schema_version, SCHEMA_VERSION
            )));
        }

        let actual = self.ledger.checksum()?;
        if actual != self.checksum {
            return Err(StockroomError::BackupIntegrity(format!(
                "checksum mismatch: archive records {}, contents hash to {}",
                self.checksum, actual
            )));
        }

        let problems = self.ledger.structural_problems();
        if !problems.is_empty() {
            return Err(StockroomError::BackupIntegrity(problems.join("; ")));
        }

        Ok(())
    }

    /// Read, decode and verify an archive file
    pub fn read_verified(path: &Path) -> StockroomResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            StockroomError::BackupIo(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let archive = Self::decode(&bytes)?;
        archive.verify()?;
        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, Item};

    fn sample_archive() -> BackupArchive {
        let mut ledger = Dataset::default();
        let item = Item::new("Stapler", "Desk", 2, 10).with_quantity(4);
        let employee = Employee::new("Ana Torres", "1002003");
        ledger.items.insert(item.id, item);
        ledger.employees.insert(employee.id, employee);
        BackupArchive::new(ledger, BackupKind::Manual, Utc::now()).unwrap()
    }

    #[test]
    fn test_encode_decode_verify() {
        let archive = sample_archive();
        let bytes = archive.encode().unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

        let decoded = BackupArchive::decode(&bytes).unwrap();
        decoded.verify().unwrap();
        assert_eq!(decoded, archive);
    }

    #[test]
    fn test_tampered_ledger_fails_checksum() {
        let mut archive = sample_archive();
        let id = *archive.ledger.items.keys().next().unwrap();
        archive.ledger.items.get_mut(&id).unwrap().quantity_current = 999;

        let err = archive.verify().unwrap_err();
        assert!(matches!(err, StockroomError::BackupIntegrity(ref m) if m.contains("checksum")));
    }

    #[test]
    fn test_garbage_is_an_integrity_error() {
        assert!(matches!(
            BackupArchive::decode(b"definitely not gzip"),
            Err(StockroomError::BackupIntegrity(_))
        ));

        let mut bytes = sample_archive().encode().unwrap();
        bytes.truncate(bytes.len() / 2);
        assert!(matches!(
            BackupArchive::decode(&bytes),
            Err(StockroomError::BackupIntegrity(_))
        ));
    }

    #[test]
    fn test_structural_problem_is_rejected() {
        let mut archive = sample_archive();
        let id = *archive.ledger.items.keys().next().unwrap();
        let item = archive.ledger.items.get_mut(&id).unwrap();
        item.quantity_minimum = 50;
        archive.checksum = archive.ledger.checksum().unwrap();

        let err = archive.verify().unwrap_err();
        assert!(err.to_string().contains("minimum"));
    }
}
