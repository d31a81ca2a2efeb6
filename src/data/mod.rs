//! Data loading and in-memory tables.
//!
//! - [`DatasetSchema`]: which columns are numeric, categorical, label, id
//! - [`Dataset`]: column-major table with explicit missing cells
//! - [`Record`]: one application, used for single-instance inference
//! - [`read_csv`] / [`load_csv`]: delimited file loading
//! - [`stratified_split`]: seeded train/test partition preserving class ratios

mod dataset;
mod loader;
mod record;
mod schema;
mod split;

pub use dataset::{Dataset, MissingCounts};
pub use loader::{is_missing_token, load_csv, read_csv};
pub use record::{Record, Value};
pub use schema::{DatasetSchema, FeatureKind};
pub use split::{SplitIndices, stratified_split};

use std::path::PathBuf;

use thiserror::Error;

/// The table does not match the columns a schema (or a fitted pipeline) expects.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    /// Input file lacks a required column.
    #[error("missing required column `{column}`")]
    MissingColumn { column: String },

    /// A record passed for inference lacks a required field.
    #[error("record is missing required field `{field}`")]
    MissingField { field: String },

    /// A record field holds the wrong kind of value.
    #[error("field `{field}` expects a {expected} value")]
    WrongValueKind { field: String, expected: &'static str },

    /// A numeric cell could not be parsed.
    #[error("column `{column}` row {row}: `{value}` is not a number")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    /// The label column has a missing cell.
    #[error("label is missing at row {row}")]
    MissingLabel { row: usize },

    /// The label column does not have exactly two classes.
    #[error("label must have exactly two classes, found {found:?}")]
    LabelClasses { found: Vec<String> },

    /// A label value was not seen when the label encoder was fit.
    #[error("unknown label `{value}`")]
    UnknownLabel { value: String },

    /// The schema declares a column twice.
    #[error("column `{column}` is declared more than once")]
    DuplicateColumn { column: String },

    /// The schema declares no feature columns.
    #[error("schema declares no feature columns")]
    NoFeatures,

    /// The operation needs a label column that the table does not carry.
    #[error("table has no label column")]
    NoLabel,

    /// Column lengths disagree.
    #[error("column `{column}` has {got} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },
}

/// Errors raised while loading or partitioning data.
#[derive(Debug, Error)]
pub enum DataError {
    /// The table does not match the schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Malformed delimited input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The input file could not be opened.
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file has a header but no rows.
    #[error("dataset is empty")]
    Empty,

    /// The requested split leaves one side empty.
    #[error("invalid split: {0}")]
    InvalidSplit(String),
}
