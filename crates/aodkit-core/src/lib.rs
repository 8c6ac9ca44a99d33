//! # aodkit-core
//!
//! This is an internal crate used by `aodkit`.
#![warn(clippy::perf, clippy::style)]
#![allow(clippy::excessive_precision)]

use thiserror::Error;

/// Pairing helpers for two-particle analyses.
pub mod combinations;
/// Task settings, processing switches, and workflow configuration files.
pub mod config;
/// AOD record types, tables, and their Parquet persistence.
pub mod data;
/// Fixed-binning histograms and the [`HistogramRegistry`](crate::histogram::HistogramRegistry).
pub mod histogram;
/// Composable selection cuts over table rows.
pub mod selection;
/// Utility functions, enums, and kinematics.
pub mod utils;
/// The [`AnalysisTask`](crate::workflow::AnalysisTask) trait and the sequential workflow runner.
pub mod workflow;
/// Useful traits for all crate structs
pub mod traits {
    pub use crate::data::{AodRow, AodSource, CollisionLinked};
    pub use crate::selection::{Variable, VariableExt};
    pub use crate::workflow::AnalysisTask;
}

pub use crate::combinations::{full_index_combinations, strictly_upper_combinations};
pub use crate::config::{Configurable, ProcessSwitch, WorkflowConfig};
pub use crate::data::{
    AodFrame, Collision, D0Candidate, DerivedTables, HfCand2Prong, McParticle, Row, Table, Track,
    V0,
};
pub use crate::histogram::{Axis, HistID, HistSpec, Hist1D, Hist2D, Histogram, HistogramRegistry};
pub use crate::selection::{Selection, TrackSelection, TrackVar, V0Var};
pub use crate::utils::angles::delta_phi;
pub use crate::utils::enums::{DecayType, RunPeriod, Species};
pub use crate::utils::vectors::{Vec3, Vec4};
pub use crate::workflow::{ProcessingContext, Workflow, WorkflowOutput};

/// Shorthand for results returned by `aodkit`.
pub type AodResult<T> = Result<T, AodError>;

/// The error type used by all `aodkit` internal methods
#[derive(Error, Debug)]
pub enum AodError {
    /// An alias for [`std::io::Error`].
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
    /// An alias for [`parquet::errors::ParquetError`].
    #[error("Parquet Error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),
    /// An alias for [`arrow::error::ArrowError`].
    #[error("Arrow Error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),
    /// An alias for [`serde_json::Error`].
    #[error("JSON Error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// An alias for [`shellexpand::LookupError`].
    #[error("Failed to expand path: {0}")]
    LookupError(#[from] shellexpand::LookupError<std::env::VarError>),
    /// A required column was not present in a record batch.
    #[error("Missing column \"{name}\" in table \"{table}\"")]
    MissingColumn {
        /// Table being read
        table: String,
        /// Name of the missing column
        name: String,
    },
    /// A column was present but stored with an unsupported type.
    #[error("Column \"{name}\" has unsupported type {datatype}")]
    InvalidColumnType {
        /// Name of the column
        name: String,
        /// The Arrow type found on disk
        datatype: String,
    },
    /// A non-nullable column contained a null.
    #[error("Column \"{name}\" contains a null value at row {row}")]
    NullValue {
        /// Name of the column
        name: String,
        /// Row of the first null
        row: usize,
    },
    /// An index column refers to a row past the end of its target table.
    #[error("Index {index} is out of range for table \"{table}\" with {len} rows")]
    DanglingIndex {
        /// Target table
        table: String,
        /// The offending index
        index: usize,
        /// Number of rows in the target table
        len: usize,
    },
    /// An error which occurs when the user tries to register two histograms by the same name to
    /// the same [`HistogramRegistry`].
    #[error("A histogram by the name \"{name}\" is already registered!")]
    RegistrationError {
        /// Name of histogram which is already registered
        name: String,
    },
    /// An error which occurs when the user tries to fill an unregistered histogram.
    #[error("No registered histogram with name \"{name}\"!")]
    HistogramNotFound {
        /// Name of histogram which failed lookup
        name: String,
    },
    /// A 1-D fill was requested on a 2-D histogram or vice versa.
    #[error("Histogram \"{name}\" is not a {expected} histogram")]
    HistogramKindMismatch {
        /// Name of the histogram
        name: String,
        /// The kind the caller asked for
        expected: &'static str,
    },
    /// A histogram axis with no bins or an empty range.
    #[error("Invalid axis ({bins} bins over [{min}, {max})): {reason}")]
    InvalidAxis {
        /// Requested number of bins
        bins: usize,
        /// Lower edge
        min: f64,
        /// Upper edge
        max: f64,
        /// What is wrong with it
        reason: &'static str,
    },
    /// Two tasks in one workflow share a name.
    #[error("A task by the name \"{name}\" is already part of this workflow!")]
    DuplicateTask {
        /// Name of the repeated task
        name: String,
    },
    /// Every processing switch of a task is turned off.
    #[error("Task \"{task}\" has no enabled process function")]
    NoProcessEnabled {
        /// Name of the task
        task: String,
    },
    /// An error which occurs when the user tries to parse an invalid string of text, typically
    /// into an enum variant.
    #[error("Failed to parse string: \"{name}\" does not correspond to a valid \"{object}\"!")]
    ParseError {
        /// The string which was parsed
        name: String,
        /// The name of the object it failed to parse into
        object: String,
    },
    /// A custom fallback error for errors too complex or too infrequent to warrant their own error
    /// category.
    #[error("{0}")]
    Custom(String),
}
