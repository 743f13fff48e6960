//! Table export
//!
//! Turns a [`DayMap`] into a rectangular table: one row per day, a `day`
//! column followed by every metric name in sorted order. Missing cells are
//! written as empty strings.

use crate::buckets::DayMap;
use crate::error::CogError;
use crate::types::Dose;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// A value that can be written to a table cell
pub trait CellValue {
    fn render(&self) -> String;
}

impl CellValue for f64 {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl CellValue for i64 {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl CellValue for String {
    fn render(&self) -> String {
        self.clone()
    }
}

impl CellValue for Dose {
    fn render(&self) -> String {
        self.as_str().to_string()
    }
}

/// Rectangular string table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_day_map<V: CellValue>(map: &DayMap<V>) -> Self {
        let metrics: Vec<&str> = map.metrics().into_iter().collect();

        let mut columns = Vec::with_capacity(metrics.len() + 1);
        columns.push("day".to_string());
        columns.extend(metrics.iter().map(|m| m.to_string()));

        let rows = map
            .iter()
            .map(|(day, cells)| {
                let mut row = Vec::with_capacity(columns.len());
                row.push(day.format("%Y-%m-%d").to_string());
                row.extend(
                    metrics
                        .iter()
                        .map(|m| cells.get(*m).map(CellValue::render).unwrap_or_default()),
                );
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), CogError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.columns)?;
        for row in &self.rows {
            csv.write_record(row)?;
        }
        csv.flush()?;
        Ok(())
    }
}

/// Writes named tables into an output directory
#[derive(Debug, Clone)]
pub struct TableExporter {
    output_dir: PathBuf,
}

impl TableExporter {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Write `<name>.csv`, returning the number of data rows
    pub fn export<V: CellValue>(&self, name: &str, map: &DayMap<V>) -> Result<usize, CogError> {
        fs::create_dir_all(&self.output_dir)?;
        let table = Table::from_day_map(map);
        let file = File::create(self.output_dir.join(format!("{}.csv", name)))?;
        table.write_csv(file)?;
        Ok(table.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_missing_cells_are_empty() {
        let mut map: DayMap<f64> = DayMap::new();
        map.insert(day(1), "acc", 0.5);
        map.insert(day(2), "time", 1.2);

        let table = Table::from_day_map(&map);
        assert_eq!(
            table,
            Table {
                columns: vec!["day".to_string(), "acc".to_string(), "time".to_string()],
                rows: vec![
                    vec!["2024-01-01".to_string(), "0.5".to_string(), String::new()],
                    vec!["2024-01-02".to_string(), String::new(), "1.2".to_string()],
                ],
            }
        );
    }

    #[test]
    fn test_write_csv() {
        let mut map: DayMap<Dose> = DayMap::new();
        map.insert(day(1), "caffeine", Dose::Amount("pre".to_string()));
        map.insert(day(1), "DXM", Dose::None);

        let mut out = Vec::new();
        Table::from_day_map(&map).write_csv(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "day,DXM,caffeine\n2024-01-01,none,pre\n"
        );
    }

    #[test]
    fn test_exporter_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("analysis");
        let mut map: DayMap<i64> = DayMap::new();
        map.insert(day(3), "mood", 4);

        let rows = TableExporter::new(&out).export("vars", &map).unwrap();
        assert_eq!(rows, 1);
        assert_eq!(
            fs::read_to_string(out.join("vars.csv")).unwrap(),
            "day,mood\n2024-01-03,4\n"
        );
    }
}
