//! Core data types and I/O operations.

pub mod loaders;
pub mod transforms;
pub mod writers;

pub use loaders::{LoaderError, RawRecord, RawTable};
pub use writers::{write_tidy_csv, WriteError};
