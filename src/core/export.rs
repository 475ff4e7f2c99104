//! CSV export of selection records
//!
//! Both export files accumulate records across sheets: they are removed once
//! before a run and then appended to, without a header row, after each sheet.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::selector::SelectionRecord;

/// Column titles matching the field order of [`SelectionRecord`]
pub const EXPORT_COLUMNS: [&str; 7] = [
    "Part Family",
    "LCSC Code",
    "Stock Status",
    "Stock Quantity",
    "Unit Price",
    "Purchase Quantity",
    "Rounded Purchase Quantity",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to remove previous export {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open {path} for appending: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write records to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to flush {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Delete previous export files so a run starts from empty outputs
pub fn reset_outputs(paths: &[&Path]) -> Result<(), ExportError> {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed previous export"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ExportError::Remove {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
    Ok(())
}

/// Append records to a CSV file without a header row, creating it if needed.
///
/// Returns the number of records written.
pub fn append_records(path: &Path, records: &[SelectionRecord]) -> Result<usize, ExportError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ExportError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    for record in records {
        writer.serialize(record).map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    writer.flush().map_err(|source| ExportError::Flush {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selector::StockStatus;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn record(family: &str, code: &str, price: &str) -> SelectionRecord {
        SelectionRecord {
            family: family.to_string(),
            lookup_code: code.to_string(),
            stock_status: StockStatus::InStock,
            stock_quantity: 50,
            unit_price: Decimal::from_str(price).unwrap(),
            desired_quantity: 20,
            rounded_purchase_quantity: 20,
        }
    }

    #[test]
    fn test_append_without_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("selected.csv");

        append_records(&path, &[record("A", "LC100", "0.12")]).unwrap();
        append_records(&path, &[record("B, large", "C2", "1.5")]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "A,LC100,In-Stock,50,0.12,20,20\n\"B, large\",C2,In-Stock,50,1.5,20,20\n"
        );
    }

    #[test]
    fn test_unavailable_record_format() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("unavailable.csv");

        append_records(&path, &[SelectionRecord::unavailable("B")]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "B,N/A,Out of Stock,0,9999,0,0\n");
    }

    #[test]
    fn test_empty_append_creates_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.csv");

        assert_eq!(append_records(&path, &[]).unwrap(), 0);
        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_reset_outputs() {
        let tmp = TempDir::new().unwrap();
        let existing = tmp.path().join("old.csv");
        let missing = tmp.path().join("never.csv");
        fs::write(&existing, "stale\n").unwrap();

        reset_outputs(&[existing.as_path(), missing.as_path()]).unwrap();
        assert!(!existing.exists());
        assert!(!missing.exists());
    }
}
