//! Canonical file paths for the input data directory.
//!
//! Input files live under the project root's `data/` directory unless the
//! caller supplies another directory.

use std::path::{Path, PathBuf};

use crate::config::InputFiles;

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`. Falls back to the
/// current directory if the manifest has fewer ancestors than expected.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the default `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Absolute locations of the four inputs within a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub ethnicity: PathBuf,
    pub income: PathBuf,
    pub housing: PathBuf,
    pub boundaries: PathBuf,
}

impl InputPaths {
    /// Joins each configured file name onto `dir`.
    #[must_use]
    pub fn resolve(dir: &Path, files: &InputFiles) -> Self {
        Self {
            ethnicity: dir.join(&files.ethnicity),
            income: dir.join(&files.income),
            housing: dir.join(&files.housing),
            boundaries: dir.join(&files.boundaries),
        }
    }
}
