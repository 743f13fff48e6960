//! Per-day keyed storage
//!
//! Days keep the order in which they were first seen. Metric names within a
//! day are kept sorted so table columns come out in a stable order.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Day → metric name → value
#[derive(Debug, Clone, PartialEq)]
pub struct DayMap<T> {
    days: Vec<(NaiveDate, BTreeMap<String, T>)>,
    index: HashMap<NaiveDate, usize>,
}

/// Day → metric name → raw samples in arrival order
pub type DayBuckets<T> = DayMap<Vec<T>>;

impl<T> Default for DayMap<T> {
    fn default() -> Self {
        Self {
            days: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> DayMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of days
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Cells of `day`, creating an empty row on first use
    pub fn day_mut(&mut self, day: NaiveDate) -> &mut BTreeMap<String, T> {
        let days = &mut self.days;
        let idx = *self.index.entry(day).or_insert_with(|| {
            days.push((day, BTreeMap::new()));
            days.len() - 1
        });
        &mut self.days[idx].1
    }

    /// Set a cell, replacing any previous value
    pub fn insert(&mut self, day: NaiveDate, metric: &str, value: T) {
        self.day_mut(day).insert(metric.to_string(), value);
    }

    pub fn get(&self, day: NaiveDate, metric: &str) -> Option<&T> {
        let idx = *self.index.get(&day)?;
        self.days[idx].1.get(metric)
    }

    /// Rows in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &BTreeMap<String, T>)> {
        self.days.iter().map(|(day, cells)| (*day, cells))
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.iter().map(|(day, _)| *day)
    }

    /// Sorted union of metric names over all days
    pub fn metrics(&self) -> BTreeSet<&str> {
        self.days
            .iter()
            .flat_map(|(_, cells)| cells.keys().map(String::as_str))
            .collect()
    }

    /// Map every cell; `None` leaves the cell missing but keeps the row
    pub fn map_cells<U, F>(&self, mut f: F) -> DayMap<U>
    where
        F: FnMut(NaiveDate, &str, &T) -> Option<U>,
    {
        let mut out = DayMap::new();
        for (day, cells) in self.iter() {
            let row = out.day_mut(day);
            for (metric, value) in cells {
                if let Some(mapped) = f(day, metric, value) {
                    row.insert(metric.clone(), mapped);
                }
            }
        }
        out
    }
}

impl<T> DayMap<Vec<T>> {
    /// Append a sample to a day's bucket for `metric`
    pub fn push(&mut self, day: NaiveDate, metric: &str, value: T) {
        let row = self.day_mut(day);
        match row.get_mut(metric) {
            Some(bucket) => bucket.push(value),
            None => {
                row.insert(metric.to_string(), vec![value]);
            }
        }
    }

    /// Total number of samples
    pub fn sample_count(&self) -> usize {
        self.days
            .iter()
            .flat_map(|(_, cells)| cells.values())
            .map(Vec::len)
            .sum()
    }
}
