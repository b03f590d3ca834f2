//! Concatenation of annotated sessions into the tidy output table.

use chrono::{NaiveDate, NaiveDateTime};
use log::warn;

use crate::core::transforms::{build_timestamp, parse_channel};

use super::fill_forward::AnnotatedRow;

/// One output row.
#[derive(Debug, Clone, PartialEq)]
pub struct TidyRecord {
    pub plot: String,
    pub plant: String,
    pub leaf: String,
    pub observation: i64,
    pub timestamp: Option<NaiveDateTime>,
    /// One value per channel, `None` where the text did not coerce
    pub values: Vec<Option<f64>>,
}

/// Identifier columns of the tidy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierColumn {
    Plot,
    Plant,
    Leaf,
}

/// The combined, labelled table.
#[derive(Debug, Clone, Default)]
pub struct TidyTable {
    pub channels: Vec<String>,
    pub records: Vec<TidyRecord>,
}

impl TidyTable {
    pub fn new(channels: Vec<String>) -> Self {
        Self {
            channels,
            records: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct labels of an identifier column, in order of first appearance.
    pub fn levels(&self, column: IdentifierColumn) -> Vec<&str> {
        let mut levels: Vec<&str> = Vec::new();
        for record in &self.records {
            let value = match column {
                IdentifierColumn::Plot => record.plot.as_str(),
                IdentifierColumn::Plant => record.plant.as_str(),
                IdentifierColumn::Leaf => record.leaf.as_str(),
            };
            if !levels.contains(&value) {
                levels.push(value);
            }
        }
        levels
    }

    /// Values of one channel by name, or `None` if no such channel.
    pub fn column(&self, channel: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.channels.iter().position(|c| c == channel)?;
        Some(self.records.iter().map(|r| r.values[idx]).collect())
    }
}

/// Builds a [`TidyTable`] one session at a time.
#[derive(Debug)]
pub struct Assembler {
    date: Option<NaiveDate>,
    table: TidyTable,
    coercion_failures: usize,
}

impl Assembler {
    pub fn new(channels: Vec<String>, date: Option<NaiveDate>) -> Self {
        Self {
            date,
            table: TidyTable::new(channels),
            coercion_failures: 0,
        }
    }

    /// Append one session's rows, coercing them as they go.
    ///
    /// Returns the number of rows appended. Values that fail coercion are
    /// kept as missing and counted; blank cells are missing but not counted.
    pub fn push_session(&mut self, label: &str, rows: Vec<AnnotatedRow>) -> usize {
        let appended = rows.len();
        let mut failures = 0;

        for row in rows {
            let values: Vec<Option<f64>> = row
                .record
                .channels
                .iter()
                .map(|text| {
                    let value = parse_channel(text);
                    if value.is_none() && !text.trim().is_empty() {
                        failures += 1;
                    }
                    value
                })
                .collect();

            let timestamp = build_timestamp(self.date, &row.record.time);
            if timestamp.is_none() && self.date.is_some() {
                failures += 1;
            }

            self.table.records.push(TidyRecord {
                plot: row.identifier.plot,
                plant: row.identifier.plant,
                leaf: row.identifier.leaf,
                observation: row.observation,
                timestamp,
                values,
            });
        }

        if failures > 0 {
            warn!("{}: {} values failed coercion and were left missing", label, failures);
        }
        self.coercion_failures += failures;
        appended
    }

    pub fn coercion_failures(&self) -> usize {
        self.coercion_failures
    }

    pub fn finish(self) -> TidyTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::RawRecord;
    use crate::processors::identifier::SampleIdentifier;

    fn row(id: (&str, &str, &str), obs: i64, time: &str, values: &[&str]) -> AnnotatedRow {
        AnnotatedRow {
            identifier: SampleIdentifier::new(id.0, id.1, id.2),
            observation: obs,
            record: RawRecord {
                observation: obs.to_string(),
                time: time.to_string(),
                channels: values.iter().map(|v| v.to_string()).collect(),
                fields: Vec::new(),
            },
        }
    }

    fn channels() -> Vec<String> {
        vec!["Photo".to_string(), "Cond".to_string()]
    }

    #[test]
    fn test_concatenation_preserves_order_and_count() {
        let mut assembler = Assembler::new(channels(), None);
        let first = vec![
            row(("a", "1", "x"), 1, "09:00:00", &["1.0", "0.1"]),
            row(("a", "1", "x"), 2, "09:01:00", &["2.0", "0.2"]),
        ];
        let second = vec![row(("b", "2", "y"), 1, "10:00:00", &["3.0", "0.3"])];

        assert_eq!(assembler.push_session("s1", first), 2);
        assert_eq!(assembler.push_session("s2", second), 1);
        let table = assembler.finish();

        assert_eq!(table.len(), 3);
        let order: Vec<(&str, i64)> = table
            .records
            .iter()
            .map(|r| (r.plot.as_str(), r.observation))
            .collect();
        assert_eq!(order, vec![("a", 1), ("a", 2), ("b", 1)]);
        assert_eq!(
            table.column("Photo"),
            Some(vec![Some(1.0), Some(2.0), Some(3.0)])
        );
    }

    #[test]
    fn test_coercion_failures_become_missing() {
        let mut assembler = Assembler::new(channels(), NaiveDate::from_ymd_opt(2021, 8, 12));
        assembler.push_session(
            "s1",
            vec![
                row(("a", "1", "x"), 1, "09:00:00", &["bad", ""]),
                row(("a", "1", "x"), 2, "noon", &["2.0", "0.2"]),
            ],
        );

        // "bad" and the unparseable time; the blank cell is just missing
        assert_eq!(assembler.coercion_failures(), 2);
        let table = assembler.finish();
        assert_eq!(table.records[0].values, vec![None, None]);
        assert!(table.records[0].timestamp.is_some());
        assert_eq!(table.records[1].timestamp, None);
    }

    #[test]
    fn test_timestamp_uses_configured_date() {
        let mut assembler = Assembler::new(channels(), NaiveDate::from_ymd_opt(2021, 8, 12));
        assembler.push_session("s1", vec![row(("a", "1", "x"), 1, "13:45:32", &["1", "2"])]);
        let table = assembler.finish();

        let ts = table.records[0].timestamp.unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2021-08-12 13:45:32");
    }

    #[test]
    fn test_no_date_means_no_timestamp_and_no_failure() {
        let mut assembler = Assembler::new(channels(), None);
        assembler.push_session("s1", vec![row(("a", "1", "x"), 1, "13:45:32", &["1", "2"])]);
        assert_eq!(assembler.coercion_failures(), 0);
        assert_eq!(assembler.finish().records[0].timestamp, None);
    }

    #[test]
    fn test_levels_in_first_appearance_order() {
        let mut assembler = Assembler::new(channels(), None);
        assembler.push_session(
            "s1",
            vec![
                row(("b", "2", "x"), 1, "", &["1", "1"]),
                row(("a", "1", "y"), 2, "", &["1", "1"]),
                row(("b", "1", "x"), 3, "", &["1", "1"]),
            ],
        );
        let table = assembler.finish();

        assert_eq!(table.levels(IdentifierColumn::Plot), vec!["b", "a"]);
        assert_eq!(table.levels(IdentifierColumn::Plant), vec!["2", "1"]);
        assert_eq!(table.levels(IdentifierColumn::Leaf), vec!["x", "y"]);
        assert_eq!(table.column("Missing"), None);
    }
}
