//! Data processing modules.

pub mod assembler;
pub mod classifier;
pub mod fill_forward;
pub mod identifier;
pub mod pipeline;
pub mod segmenter;

// Re-export key types for convenience
pub use assembler::{Assembler, IdentifierColumn, TidyRecord, TidyTable};
pub use classifier::{classify, classify_row, ObservationField, RowKind};
pub use fill_forward::{fill_forward, merge_session, AnnotatedRow, MergeStats};
pub use identifier::{
    Decomposition, ExtractIdentifier, GrammarError, IdentifierGrammar, SampleIdentifier,
};
pub use pipeline::{
    assemble_sessions, process_spreadsheets, process_text_log, tidy_text_log, PipelineError,
    RunSummary,
};
pub use segmenter::{split_sessions, Sessions};
