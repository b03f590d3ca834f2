//! Classification of the observation field.
//!
//! The instrument reuses its observation-number column for three things:
//! numbered readings, operator remarks, and warm-up rows. Whether the field
//! parses as an integer is the only reliable discriminator.

/// What the observation field of a row holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationField {
    /// A sensor reading with its observation number.
    Numeric(i64),
    /// Anything that is not an integer: remark markers, empty cells, noise.
    Remark(String),
}

impl ObservationField {
    #[inline]
    pub fn is_remark(&self) -> bool {
        matches!(self, ObservationField::Remark(_))
    }
}

/// Classify an observation field.
///
/// Surrounding whitespace and quotes are ignored. This never fails: text
/// that does not parse as an integer is a remark.
///
/// # Example
///
/// ```
/// use gasex_tidy::processors::classifier::{classify, ObservationField};
///
/// assert_eq!(classify("14"), ObservationField::Numeric(14));
/// assert!(classify("Remark=").is_remark());
/// ```
pub fn classify(field: &str) -> ObservationField {
    let cleaned = field.trim().trim_matches('"').trim();
    match cleaned.parse::<i64>() {
        Ok(n) => ObservationField::Numeric(n),
        Err(_) => ObservationField::Remark(cleaned.to_string()),
    }
}

/// Row category used by the fill-forward merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Observation(i64),
    Remark(String),
    /// Warm-up row; dropped without ever contributing an identifier.
    BootNoise,
}

/// Classify a row, separating warm-up rows from ordinary remarks.
///
/// A remark whose text equals `boot_marker` is boot noise, whatever else the
/// row carries.
pub fn classify_row(field: &str, boot_marker: &str) -> RowKind {
    match classify(field) {
        ObservationField::Numeric(n) => RowKind::Observation(n),
        ObservationField::Remark(text) if text == boot_marker => RowKind::BootNoise,
        ObservationField::Remark(text) => RowKind::Remark(text),
    }
}
