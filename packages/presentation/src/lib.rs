#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Presentation adapter for the area map.
//!
//! Turns the joined table, its statistics, and one set of filter criteria
//! into what a choropleth renderer needs: the membership mask, the match
//! count, and the layer descriptors. Nothing here renders; the output is
//! plain data, exportable as `GeoJSON` plus a JSON layer document.

pub mod features;
pub mod format;
pub mod layers;

use std::path::{Path, PathBuf};

use area_map_analysis::{compute_mask, match_count};
use area_map_area_models::layers::{LayerDescriptor, MapView};
use area_map_area_models::{AreaTable, FilterCriteria, TableStats};
use serde::Serialize;

pub use layers::LayerVisibility;

/// File name of the exported feature collection.
pub const GEOJSON_FILE: &str = "areas.geojson";

/// File name of the exported layer document.
pub const LAYERS_FILE: &str = "layers.json";

/// Errors that can occur while writing an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The output could not be written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Output path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output of one filter evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    /// Per-row membership, aligned with the table.
    pub mask: Vec<bool>,
    /// Number of `true` entries in `mask`.
    pub match_count: usize,
    /// The thresholds that produced the mask.
    pub criteria: FilterCriteria,
    /// Statistics the defaults were drawn from.
    pub stats: TableStats,
    pub layers: Vec<LayerDescriptor>,
}

/// Evaluates `criteria` against the table and assembles the layers.
///
/// Pure: identical inputs give identical output.
#[must_use]
pub fn present(
    table: &AreaTable,
    stats: &TableStats,
    criteria: &FilterCriteria,
    visibility: &LayerVisibility,
) -> Presentation {
    let mask = compute_mask(table, criteria);
    let match_count = match_count(&mask);
    log::debug!("{match_count} of {} areas match", table.len());
    Presentation {
        mask,
        match_count,
        criteria: *criteria,
        stats: *stats,
        layers: layers::catalog(visibility),
    }
}

/// The layer document written next to the feature collection.
#[derive(Debug, Serialize)]
struct LayerDocument<'a> {
    map: &'a MapView,
    criteria: &'a FilterCriteria,
    stats: &'a TableStats,
    match_count: usize,
    layers: &'a [LayerDescriptor],
}

/// Writes [`GEOJSON_FILE`] and [`LAYERS_FILE`] into `dir`, creating it if
/// needed. Returns the two paths written.
///
/// # Errors
///
/// Returns [`ExportError`] if the directory or either file cannot be
/// written.
pub fn write_export(
    dir: &Path,
    table: &AreaTable,
    presentation: &Presentation,
    map: &MapView,
) -> Result<(PathBuf, PathBuf), ExportError> {
    std::fs::create_dir_all(dir).map_err(|e| ExportError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;

    let collection = features::feature_collection(table, &presentation.mask)?;
    let geojson_path = dir.join(GEOJSON_FILE);
    write_json(&geojson_path, &collection)?;

    let document = LayerDocument {
        map,
        criteria: &presentation.criteria,
        stats: &presentation.stats,
        match_count: presentation.match_count,
        layers: &presentation.layers,
    };
    let layers_path = dir.join(LAYERS_FILE);
    write_json(&layers_path, &document)?;

    log::info!(
        "Exported {} areas ({} matching) to {}",
        table.len(),
        presentation.match_count,
        dir.display()
    );

    Ok((geojson_path, layers_path))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let file = std::fs::File::create(path).map_err(|e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::to_writer(std::io::BufWriter::new(file), value)?;
    Ok(())
}
