//! Dataset layout configuration.
//!
//! [`DatasetConfig`] captures everything that ties the readers to a
//! particular publication of the input datasets: file names, sheet names,
//! header offsets, column names, and the code prefixes used for filtering.
//! The default layout is embedded from `datasets.toml` at compile time; a
//! TOML file of the same shape can replace it at runtime.

use std::path::Path;

use area_map_area_models::layers::MapView;
use serde::Deserialize;

use crate::DataError;

/// Embedded default configuration.
const DEFAULT_DATASETS_TOML: &str = include_str!("../datasets.toml");

// ── Top-level config ─────────────────────────────────────────────────────

/// Complete dataset layout consumed by the readers and the session.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// Input file names, relative to the data directory.
    pub files: InputFiles,
    /// Ethnicity CSV layout.
    pub ethnicity: EthnicityLayout,
    /// Income spreadsheet layout.
    pub income: IncomeLayout,
    /// Housing spreadsheet layout.
    pub housing: HousingLayout,
    /// Boundary archive layout.
    pub boundaries: BoundaryLayout,
    /// Census REST API parameters for the optional download step.
    pub census_api: CensusApiConfig,
    /// Filter defaults.
    pub filters: FilterDefaults,
    /// Initial map viewport.
    #[serde(default)]
    pub map: MapView,
}

impl DatasetConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Config`] if the text is not valid TOML or does
    /// not match the expected shape.
    pub fn from_toml(label: &str, text: &str) -> Result<Self, DataError> {
        toml::de::from_str(text).map_err(|e| DataError::Config {
            path: label.to_string(),
            message: e.to_string(),
        })
    }

    /// Loads a configuration file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Io`] if the file cannot be read, or
    /// [`DataError::Config`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let text = std::fs::read_to_string(path).map_err(|e| DataError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        log::info!("Loaded dataset config from {}", path.display());
        Self::from_toml(&path.display().to_string(), &text)
    }
}

impl Default for DatasetConfig {
    /// Returns the embedded `datasets.toml` layout.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML fails to parse. It is a compile-time
    /// constant, so a failure is a development error caught by tests.
    fn default() -> Self {
        Self::from_toml("datasets.toml", DEFAULT_DATASETS_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded datasets.toml: {e}"))
    }
}

// ── Sections ─────────────────────────────────────────────────────────────

/// File names of the four inputs.
#[derive(Debug, Clone, Deserialize)]
pub struct InputFiles {
    pub ethnicity: String,
    pub income: String,
    pub housing: String,
    pub boundaries: String,
}

/// Long-format census CSV layout.
#[derive(Debug, Clone, Deserialize)]
pub struct EthnicityLayout {
    /// Header of the area-code column.
    pub area_code_column: String,
    /// Header of the subcategory label column.
    pub category_column: String,
    /// Header of the numeric observation column.
    pub value_column: String,
    /// Only area codes starting with this prefix are kept.
    pub region_prefix: String,
    /// Subcategory labels starting with this prefix belong to the tracked
    /// group.
    pub group_prefix: String,
    /// Where to obtain the file.
    pub source_url: String,
}

/// Income spreadsheet layout.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomeLayout {
    pub sheet: String,
    /// Leading rows before the header row.
    pub skip_rows: usize,
    pub area_code_column: String,
    pub income_column: String,
    pub source_url: String,
}

/// Housing spreadsheet layout.
#[derive(Debug, Clone, Deserialize)]
pub struct HousingLayout {
    pub sheet: String,
    #[serde(default)]
    pub skip_rows: usize,
    pub area_code_column: String,
    pub area_name_column: String,
    pub price_column: String,
    pub source_url: String,
}

/// Boundary archive layout.
#[derive(Debug, Clone, Deserialize)]
pub struct BoundaryLayout {
    /// Granularity token matched in the shapefile name and used as the
    /// attribute column prefix (e.g. `"msoa"`).
    pub granularity: String,
    /// Region token matched in the shapefile name (e.g. `"london"`).
    pub region: String,
    pub source_url: String,
}

/// ONS census observations API parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CensusApiConfig {
    pub base_url: String,
    pub dataset: String,
    pub edition: String,
    pub version: u32,
    pub area_type: String,
    pub dimensions: String,
    /// `sex` label of the rows to keep.
    pub all_persons_label: String,
    /// `ethnic_group` label of the all-groups total row, which is dropped.
    pub total_label: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

impl CensusApiConfig {
    /// URL of the dataset version, without a trailing endpoint.
    #[must_use]
    pub fn version_url(&self) -> String {
        format!(
            "{}/datasets/{}/editions/{}/versions/{}",
            self.base_url.trim_end_matches('/'),
            self.dataset,
            self.edition,
            self.version
        )
    }
}

/// Defaults for the filter inputs.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterDefaults {
    /// Default minimum group share, as a fraction.
    pub default_min_group_share: f64,
    /// Percentile rank of the default price ceiling, in `[0, 1]`.
    pub price_percentile: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embedded_config() {
        let config = DatasetConfig::default();
        assert_eq!(config.files.boundaries, "london_boundaries.zip");
        assert_eq!(config.ethnicity.region_prefix, "E02");
        assert_eq!(config.income.skip_rows, 4);
        assert_eq!(config.housing.skip_rows, 0);
        assert_eq!(config.boundaries.granularity, "msoa");
        assert_eq!(config.census_api.max_attempts, 3);
        assert!((config.filters.price_percentile - 0.65).abs() < f64::EPSILON);
        assert_eq!(config.map.zoom, 11);
    }

    #[test]
    fn builds_census_version_url() {
        let config = DatasetConfig::default();
        assert_eq!(
            config.census_api.version_url(),
            "https://api.beta.ons.gov.uk/v1/datasets/TS021/editions/2021/versions/1"
        );
    }

    #[test]
    fn rejects_incomplete_config() {
        let err = DatasetConfig::from_toml("broken.toml", "[files]\nethnicity = \"a.csv\"\n")
            .unwrap_err();
        assert!(matches!(err, DataError::Config { ref path, .. } if path == "broken.toml"));
    }
}
