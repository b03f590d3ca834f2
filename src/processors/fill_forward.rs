//! Fill-forward merge of remark identifiers onto sensor rows.

use log::debug;

use crate::core::loaders::{RawRecord, RawTable};

use super::classifier::{classify_row, RowKind};
use super::identifier::{ExtractIdentifier, SampleIdentifier};

/// A sensor row with the sample it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRow {
    pub identifier: SampleIdentifier,
    pub observation: i64,
    pub record: RawRecord,
}

/// Row counts from merging one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub remark_rows: usize,
    pub identifiers_found: usize,
    pub boot_noise_rows: usize,
    /// Readings dropped because no identifier preceded them
    pub unlabelled_rows: usize,
    pub retained_rows: usize,
}

impl MergeStats {
    pub fn absorb(&mut self, other: &MergeStats) {
        self.remark_rows += other.remark_rows;
        self.identifiers_found += other.identifiers_found;
        self.boot_noise_rows += other.boot_noise_rows;
        self.unlabelled_rows += other.unlabelled_rows;
        self.retained_rows += other.retained_rows;
    }
}

/// Carry each present label down over the following absent ones.
///
/// Leading `None`s stay `None`. Applying this twice gives the same result as
/// applying it once.
///
/// # Example
///
/// ```
/// use gasex_tidy::processors::fill_forward::fill_forward;
///
/// let filled = fill_forward(&[None, Some('a'), None, Some('b'), None]);
/// assert_eq!(filled, vec![None, Some('a'), Some('a'), Some('b'), Some('b')]);
/// ```
pub fn fill_forward<T: Clone>(labels: &[Option<T>]) -> Vec<Option<T>> {
    labels
        .iter()
        .scan(None, |current: &mut Option<T>, label| {
            if label.is_some() {
                *current = label.clone();
            }
            Some(current.clone())
        })
        .collect()
}

/// Attach identifiers to the readings of one session.
///
/// Each field of a remark row is searched on its own and the first match
/// wins; the instrument puts the remark payload in the column after the
/// observation field, and a match never spans two fields. The identifier
/// accumulator starts empty for every
/// call, so labels never cross session boundaries. Remark and boot-noise
/// rows are dropped, as are readings seen before the first identifier.
pub fn merge_session<E>(table: &RawTable, extractor: &E, boot_marker: &str) -> (Vec<AnnotatedRow>, MergeStats)
where
    E: ExtractIdentifier + ?Sized,
{
    let mut stats = MergeStats::default();

    let kinds: Vec<RowKind> = table
        .records
        .iter()
        .map(|record| classify_row(&record.observation, boot_marker))
        .collect();

    let labels: Vec<Option<SampleIdentifier>> = kinds
        .iter()
        .zip(&table.records)
        .map(|(kind, record)| match kind {
            RowKind::Remark(_) => {
                let found = record.fields.iter().find_map(|field| extractor.extract(field));
                if found.is_none() {
                    debug!("remark without identifier: {}", record.fields.join(" | "));
                }
                found
            }
            RowKind::Observation(_) | RowKind::BootNoise => None,
        })
        .collect();

    stats.identifiers_found = labels.iter().filter(|l| l.is_some()).count();

    let filled = fill_forward(&labels);
    let mut rows = Vec::with_capacity(table.records.len());

    for ((kind, record), label) in kinds.into_iter().zip(&table.records).zip(filled) {
        match kind {
            RowKind::Observation(observation) => match label {
                Some(identifier) => rows.push(AnnotatedRow {
                    identifier,
                    observation,
                    record: record.clone(),
                }),
                None => stats.unlabelled_rows += 1,
            },
            RowKind::Remark(_) => stats.remark_rows += 1,
            RowKind::BootNoise => stats.boot_noise_rows += 1,
        }
    }

    stats.retained_rows = rows.len();
    (rows, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentifierConfig;
    use crate::processors::identifier::IdentifierGrammar;

    fn grammar() -> IdentifierGrammar {
        IdentifierGrammar::from_config(&IdentifierConfig::text_log_default()).unwrap()
    }

    fn remark(text: &str) -> RawRecord {
        RawRecord {
            observation: "Remark=".to_string(),
            time: String::new(),
            channels: vec![String::new()],
            fields: vec!["Remark=".to_string(), format!("09:00:00 {}", text)],
        }
    }

    fn reading(obs: i64) -> RawRecord {
        RawRecord {
            observation: obs.to_string(),
            time: "09:01:00".to_string(),
            channels: vec![format!("{}.5", obs)],
            fields: vec![obs.to_string(), "09:01:00".to_string(), format!("{}.5", obs)],
        }
    }

    fn boot(text: &str) -> RawRecord {
        RawRecord {
            observation: "in".to_string(),
            time: String::new(),
            channels: vec![String::new()],
            fields: vec!["in".to_string(), text.to_string()],
        }
    }

    fn table(records: Vec<RawRecord>) -> RawTable {
        RawTable {
            channels: vec!["Photo".to_string()],
            records,
        }
    }

    fn labels(rows: &[AnnotatedRow]) -> Vec<(String, String, String, i64)> {
        rows.iter()
            .map(|r| {
                (
                    r.identifier.plot.clone(),
                    r.identifier.plant.clone(),
                    r.identifier.leaf.clone(),
                    r.observation,
                )
            })
            .collect()
    }

    #[test]
    fn test_fill_forward_idempotent() {
        let raw = vec![None, Some(1), None, None, Some(2), None, Some(3)];
        let once = fill_forward(&raw);
        let twice = fill_forward(&once);
        assert_eq!(once, twice);
        assert_eq!(once, vec![None, Some(1), Some(1), Some(1), Some(2), Some(2), Some(3)]);
    }

    #[test]
    fn test_fill_forward_empty() {
        let empty: Vec<Option<u8>> = Vec::new();
        assert!(fill_forward(&empty).is_empty());
    }

    #[test]
    fn test_merge_two_remarks() {
        let session = table(vec![
            remark("a1 x"),
            reading(1),
            reading(2),
            remark("a1 y"),
            reading(3),
        ]);
        let (rows, stats) = merge_session(&session, &grammar(), "in");

        let a1x = ("a".to_string(), "1".to_string(), "x".to_string());
        let a1y = ("a".to_string(), "1".to_string(), "y".to_string());
        assert_eq!(
            labels(&rows),
            vec![
                (a1x.0.clone(), a1x.1.clone(), a1x.2.clone(), 1),
                (a1x.0, a1x.1, a1x.2, 2),
                (a1y.0, a1y.1, a1y.2, 3),
            ]
        );
        assert_eq!(stats.remark_rows, 2);
        assert_eq!(stats.identifiers_found, 2);
        assert_eq!(stats.retained_rows, 3);
    }

    #[test]
    fn test_merge_drops_rows_before_first_identifier() {
        let session = table(vec![
            reading(1),
            reading(2),
            remark("b4 z"),
            reading(3),
        ]);
        let (rows, stats) = merge_session(&session, &grammar(), "in");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].observation, 3);
        assert_eq!(rows[0].identifier, SampleIdentifier::new("b", "4", "z"));
        assert_eq!(stats.unlabelled_rows, 2);
    }

    #[test]
    fn test_merge_commentary_keeps_current_identifier() {
        let session = table(vec![
            remark("a1 x"),
            reading(1),
            remark("leaf looks wilted"),
            reading(2),
        ]);
        let (rows, stats) = merge_session(&session, &grammar(), "in");

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.identifier == SampleIdentifier::new("a", "1", "x")));
        assert_eq!(stats.remark_rows, 2);
        assert_eq!(stats.identifiers_found, 1);
    }

    #[test]
    fn test_merge_label_never_spans_fields() {
        let split = RawRecord {
            fields: vec![
                "Remark=".to_string(),
                "09:02:00 moved to c2".to_string(),
                "ok".to_string(),
            ],
            ..remark("")
        };
        let session = table(vec![remark("a1 x"), reading(1), split, reading(2)]);
        let (rows, stats) = merge_session(&session, &grammar(), "in");

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.identifier == SampleIdentifier::new("a", "1", "x")));
        assert_eq!(stats.identifiers_found, 1);
    }

    #[test]
    fn test_merge_boot_noise_never_labels() {
        let session = table(vec![
            boot("c9 q"),
            reading(1),
            remark("a1 x"),
            boot("c9 q"),
            reading(2),
        ]);
        let (rows, stats) = merge_session(&session, &grammar(), "in");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].identifier, SampleIdentifier::new("a", "1", "x"));
        assert_eq!(stats.boot_noise_rows, 2);
        assert_eq!(stats.unlabelled_rows, 1);
    }

    #[test]
    fn test_merge_without_any_identifier_is_empty() {
        let session = table(vec![reading(1), remark("no label here"), reading(2)]);
        let (rows, stats) = merge_session(&session, &grammar(), "in");
        assert!(rows.is_empty());
        assert_eq!(stats.unlabelled_rows, 2);
    }

    #[test]
    fn test_merge_is_stable_on_merged_output() {
        // Re-labelling rows that already carry their identifier changes nothing
        let session = table(vec![remark("a1 x"), reading(1), remark("a2 y"), reading(2)]);
        let (first, _) = merge_session(&session, &grammar(), "in");

        let rebuilt = table(
            first
                .iter()
                .flat_map(|row| {
                    let id = &row.identifier;
                    vec![
                        remark(&format!("{}{} {}", id.plot, id.plant, id.leaf)),
                        row.record.clone(),
                    ]
                })
                .collect(),
        );
        let (second, _) = merge_session(&rebuilt, &grammar(), "in");
        assert_eq!(first, second);
    }
}
