//! External dosage export
//!
//! A third-party tracker exports CSV files with a header row. Only the
//! `category_name`, `timestamp` (milliseconds) and `value` columns are read.

use crate::error::CogError;
use crate::types::DosageRecord;
use chrono::{TimeZone, Utc};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

const CATEGORY_COLUMN: &str = "category_name";
const TIMESTAMP_COLUMN: &str = "timestamp";
const VALUE_COLUMN: &str = "value";

/// Most recently modified `*.csv` file in `dir`
pub fn latest_export(dir: &Path) -> Result<PathBuf, CogError> {
    if !dir.is_dir() {
        return Err(CogError::DosageDirMissing(dir.to_path_buf()));
    }

    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !is_csv || !path.is_file() {
            continue;
        }

        let modified = fs::metadata(&path)?.modified()?;
        let newer = match &latest {
            Some((best, best_path)) => (modified, &path) > (*best, best_path),
            None => true,
        };
        if newer {
            latest = Some((modified, path));
        }
    }

    let (_, path) = latest.ok_or_else(|| CogError::NoDosageExport(dir.to_path_buf()))?;
    debug!(path = %path.display(), "selected dosage export");
    Ok(path)
}

/// Parsed export plus the number of rows that could not be read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DosageExport {
    pub records: Vec<DosageRecord>,
    pub skipped: usize,
}

/// Read a dosage export. A missing required column is an error; a bad row is skipped.
pub fn read_export<R: Read>(reader: R) -> Result<DosageExport, CogError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| CogError::DosageColumnMissing(name.to_string()))
    };
    let category_idx = column(CATEGORY_COLUMN)?;
    let timestamp_idx = column(TIMESTAMP_COLUMN)?;
    let value_idx = column(VALUE_COLUMN)?;

    let mut export = DosageExport::default();
    for (line, row) in csv.records().enumerate() {
        let parsed = row.ok().and_then(|row| {
            let millis = row.get(timestamp_idx)?.trim().parse::<i64>().ok()?;
            Some(DosageRecord {
                timestamp: Utc.timestamp_millis_opt(millis).single()?,
                category: row.get(category_idx)?.trim().to_string(),
                value: row.get(value_idx)?.trim().parse::<f64>().ok()?,
            })
        });

        match parsed {
            Some(record) => export.records.push(record),
            None => {
                warn!(row = line + 2, "skipping unreadable dosage row");
                export.skipped += 1;
            }
        }
    }

    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn test_read_export() {
        let data = "\
_id,category_name,value,timestamp,comment
1,caffeine,100,1705311000000,
2,caffeine,50.5,1705314600000,tea
3,nicotine,oops,1705311000000,
";
        let export = read_export(data.as_bytes()).unwrap();
        assert_eq!(export.records.len(), 2);
        assert_eq!(export.skipped, 1);
        assert_eq!(export.records[1].category, "caffeine");
        assert_eq!(export.records[1].value, 50.5);
        assert_eq!(export.records[0].timestamp.timestamp(), 1705311000);
    }

    #[test]
    fn test_missing_column() {
        let data = "category_name,value\ncaffeine,1\n";
        match read_export(data.as_bytes()) {
            Err(CogError::DosageColumnMissing(column)) => assert_eq!(column, "timestamp"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_latest_export_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            latest_export(&missing),
            Err(CogError::DosageDirMissing(_))
        ));
        assert!(matches!(
            latest_export(dir.path()),
            Err(CogError::NoDosageExport(_))
        ));
    }

    #[test]
    fn test_latest_export_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("notes.txt"))
            .unwrap()
            .write_all(b"x")
            .unwrap();
        File::create(dir.path().join("export.csv"))
            .unwrap()
            .write_all(b"category_name,timestamp,value\n")
            .unwrap();

        let path = latest_export(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "export.csv");
    }
}
