#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Source readers for the London area datasets.
//!
//! One reader per dataset normalizes its input into rows keyed by area
//! code:
//!
//! - [`ethnicity`]: long-format Census 2021 counts (CSV)
//! - [`income`]: small-area income estimates (XLSX)
//! - [`housing`]: median house prices (XLSX)
//! - [`boundaries`]: area polygons from a zipped shapefile
//!
//! Readers only read local files. Obtaining the census CSV over the network
//! is a separate, optional step implemented in [`census`].

pub mod boundaries;
pub mod census;
pub mod columns;
pub mod config;
pub mod ethnicity;
pub mod housing;
pub mod income;
pub mod inputs;
pub mod paths;
pub mod progress;
pub mod retry;
pub mod spreadsheet;

pub use config::DatasetConfig;

/// Errors raised while reading or validating input data.
///
/// Every variant names the artifact (file, sheet, or column) at fault so the
/// caller can tell the user exactly what is missing. All of them are fatal
/// to the current load.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// One or more required input files do not exist.
    #[error("Missing required data files: {}", .files.join(", "))]
    MissingFiles {
        /// File names that were not found.
        files: Vec<String>,
    },

    /// A spreadsheet does not contain the expected sheet.
    #[error("Sheet '{sheet}' not found in {path}")]
    MissingSheet {
        /// Workbook path.
        path: String,
        /// Expected sheet name.
        sheet: String,
    },

    /// An expected column is absent.
    #[error("Column '{column}' not found in {artifact}")]
    MissingColumn {
        /// File or table the column was expected in.
        artifact: String,
        /// Expected column name or description.
        column: String,
    },

    /// More than one column matched an identification rule.
    #[error("Ambiguous {wanted} column in {artifact}: candidates {}", .candidates.join(", "))]
    AmbiguousColumn {
        /// File or table being inspected.
        artifact: String,
        /// What the column was supposed to hold (e.g. "area code").
        wanted: String,
        /// Every column the rule matched.
        candidates: Vec<String>,
    },

    /// The boundary archive contains no matching shapefile.
    #[error("No {granularity}/{region} shapefile found in {archive}")]
    ShapefileNotFound {
        /// Archive path.
        archive: String,
        /// Granularity token searched for.
        granularity: String,
        /// Region token searched for.
        region: String,
    },

    /// A shapefile sidecar (e.g. `.dbf`) is missing from the archive.
    #[error("Sidecar {member} missing from {archive}")]
    MissingSidecar {
        /// Archive path.
        archive: String,
        /// Expected member name.
        member: String,
    },

    /// A required filter left nothing to work with.
    #[error("No rows left in {artifact} after {step}")]
    EmptyResult {
        /// File or table being filtered.
        artifact: String,
        /// The step that emptied it.
        step: String,
    },

    /// Table-wide statistics were requested for an empty table.
    #[error("Cannot compute {statistic} over an empty table")]
    EmptyTable {
        /// The statistic being computed.
        statistic: String,
    },

    /// An area has zero population, so its group share is undefined.
    #[error("Area {area_code} has zero population")]
    ZeroPopulation {
        /// Offending area code.
        area_code: String,
    },

    /// A statistic came out as NaN or infinite.
    #[error("Statistic {statistic} is not finite ({value})")]
    NonFiniteStatistic {
        /// The statistic being computed.
        statistic: String,
        /// The offending value.
        value: f64,
    },

    /// A value could not be interpreted.
    #[error("Invalid value '{value}' in column '{column}' of {artifact}")]
    InvalidValue {
        /// File the value came from.
        artifact: String,
        /// Column the value came from.
        column: String,
        /// The raw value.
        value: String,
    },

    /// I/O error while reading a file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV decoding failed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// File being decoded.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// The spreadsheet could not be opened or decoded.
    #[error("Spreadsheet error in {path}: {message}")]
    Spreadsheet {
        /// Workbook path.
        path: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The zip archive could not be read.
    #[error("Archive error in {path}: {message}")]
    Archive {
        /// Archive path.
        path: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The shapefile or its attribute table could not be decoded.
    #[error("Shapefile error in {path}: {message}")]
    Shapefile {
        /// Shapefile member or path.
        path: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The dataset configuration is invalid.
    #[error("Invalid configuration {path}: {message}")]
    Config {
        /// Config file path or label.
        path: String,
        /// Description of what went wrong.
        message: String,
    },
}

/// A non-fatal report of values that could not be coerced to numbers.
///
/// The affected rows are dropped; processing continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionWarning {
    /// File the rows came from.
    pub artifact: String,
    /// Column that failed coercion.
    pub column: String,
    /// Number of rows dropped.
    pub dropped: usize,
}

impl std::fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Removed {} rows with non-numeric '{}' in {}",
            self.dropped, self.column, self.artifact
        )
    }
}
