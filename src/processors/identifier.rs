//! Sample identifier extraction from remark text.
//!
//! Operators label samples by typing a short code into a remark, e.g.
//! `a1 x` (plot `a`, plant `1`, leaf `x`). The labelling convention varies
//! between deployments, so the grammar is configuration: a regular
//! expression that finds the code, a delimiter, and a [`Decomposition`] rule.
//! The pipeline only depends on the [`ExtractIdentifier`] trait.

use std::fmt;

use regex::Regex;
use thiserror::Error;

pub use crate::config::Decomposition;
use crate::config::IdentifierConfig;

/// Errors building an identifier grammar.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("invalid identifier pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("identifier delimiter must not be empty")]
    EmptyDelimiter,
}

/// Composite plot/plant/leaf label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleIdentifier {
    pub plot: String,
    pub plant: String,
    pub leaf: String,
}

impl SampleIdentifier {
    pub fn new(plot: impl Into<String>, plant: impl Into<String>, leaf: impl Into<String>) -> Self {
        Self {
            plot: plot.into(),
            plant: plant.into(),
            leaf: leaf.into(),
        }
    }
}

impl fmt::Display for SampleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.plot, self.plant, self.leaf)
    }
}

/// Anything that can read a sample identifier out of remark text.
///
/// Returning `None` is normal: most remarks are commentary.
pub trait ExtractIdentifier {
    fn extract(&self, text: &str) -> Option<SampleIdentifier>;
}

impl<F> ExtractIdentifier for F
where
    F: Fn(&str) -> Option<SampleIdentifier>,
{
    fn extract(&self, text: &str) -> Option<SampleIdentifier> {
        self(text)
    }
}

/// Regex-driven identifier grammar.
#[derive(Debug, Clone)]
pub struct IdentifierGrammar {
    pattern: Regex,
    delimiter: String,
    decomposition: Decomposition,
}

impl IdentifierGrammar {
    /// Build a grammar from its parts.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regex or `delimiter` is
    /// empty.
    pub fn new(pattern: &str, delimiter: &str, decomposition: Decomposition) -> Result<Self, GrammarError> {
        if delimiter.is_empty() {
            return Err(GrammarError::EmptyDelimiter);
        }
        let regex = Regex::new(pattern).map_err(|e| GrammarError::InvalidPattern {
            pattern: pattern.to_string(),
            source: e,
        })?;

        Ok(Self {
            pattern: regex,
            delimiter: delimiter.to_string(),
            decomposition,
        })
    }

    pub fn from_config(config: &IdentifierConfig) -> Result<Self, GrammarError> {
        Self::new(&config.pattern, &config.delimiter, config.decomposition)
    }

    /// Split an identifier token into its parts.
    ///
    /// Returns `None` unless all three parts are non-empty.
    pub fn decompose(&self, token: &str) -> Option<SampleIdentifier> {
        let delim = self.delimiter.as_str();

        let (plot, plant, leaf) = match self.decomposition {
            Decomposition::Compact => {
                let (head, leaf) = token.split_once(delim)?;
                let split = head.find(|c: char| !c.is_alphabetic())?;
                (&head[..split], &head[split..], leaf)
            }
            Decomposition::Separated => {
                let mut parts = token.splitn(3, delim);
                (parts.next()?, parts.next()?, parts.next()?)
            }
        };

        if plot.is_empty() || plant.is_empty() || leaf.is_empty() {
            return None;
        }
        Some(SampleIdentifier::new(plot, plant, leaf))
    }

    /// Write an identifier back out in this grammar's layout.
    pub fn render(&self, id: &SampleIdentifier) -> String {
        let delim = &self.delimiter;
        match self.decomposition {
            Decomposition::Compact => format!("{}{}{}{}", id.plot, id.plant, delim, id.leaf),
            Decomposition::Separated => {
                format!("{}{}{}{}{}", id.plot, delim, id.plant, delim, id.leaf)
            }
        }
    }
}

impl ExtractIdentifier for IdentifierGrammar {
    fn extract(&self, text: &str) -> Option<SampleIdentifier> {
        let token = self.pattern.find(text)?;
        self.decompose(token.as_str())
    }
}
