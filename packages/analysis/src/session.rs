//! Load session: reads the inputs once and keeps the joined table.
//!
//! A [`Session`] owns the dataset configuration and the data directory. The
//! first [`Session::load`] runs the readers, the joiner, and the statistics;
//! later calls return the cached result until [`Session::invalidate`].

use std::path::{Path, PathBuf};

use area_map_area_models::{
    AreaTable, BoundaryRow, EthnicityRow, FilterSettings, IncomeRow, TableStats,
};
use area_map_source::housing::HousingTable;
use area_map_source::inputs::check_inputs;
use area_map_source::paths::InputPaths;
use area_map_source::{CoercionWarning, DataError, DatasetConfig};
use area_map_source::{boundaries, ethnicity, housing, income};

use crate::join::join;
use crate::metrics::compute_stats;

/// Everything produced by one load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedData {
    pub table: AreaTable,
    pub stats: TableStats,
    /// Boundary rows dropped by the joiner as incomplete.
    pub dropped: usize,
    /// Non-fatal coercion reports from the readers.
    pub warnings: Vec<CoercionWarning>,
}

/// Normalized rows from the four readers, ready to join.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub boundaries: Vec<BoundaryRow>,
    pub income: Vec<IncomeRow>,
    pub ethnicity: Vec<EthnicityRow>,
    pub housing: HousingTable,
}

impl SourceTables {
    /// Runs every reader against the resolved input paths.
    ///
    /// # Errors
    ///
    /// Returns the first [`DataError`] raised by a reader.
    pub fn read(paths: &InputPaths, config: &DatasetConfig) -> Result<Self, DataError> {
        Ok(Self {
            boundaries: boundaries::read_boundaries(&paths.boundaries, &config.boundaries)?,
            income: income::read_income(&paths.income, &config.income)?,
            ethnicity: ethnicity::read_ethnicity(&paths.ethnicity, &config.ethnicity)?,
            housing: housing::read_housing(&paths.housing, &config.housing)?,
        })
    }

    /// Joins the tables and computes the statistics.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the join fails or the joined table is empty
    /// or yields non-finite statistics.
    pub fn build(self, percentile_rank: f64) -> Result<LoadedData, DataError> {
        let joined = join(self.boundaries, &self.income, &self.ethnicity, &self.housing.rows)?;
        let stats = compute_stats(&joined.table, percentile_rank)?;
        Ok(LoadedData {
            table: joined.table,
            stats,
            dropped: joined.dropped,
            warnings: self.housing.warning.into_iter().collect(),
        })
    }
}

/// Explicit load context. Replaces any process-wide caching.
#[derive(Debug)]
pub struct Session {
    config: DatasetConfig,
    data_dir: PathBuf,
    loaded: Option<LoadedData>,
}

impl Session {
    #[must_use]
    pub const fn new(config: DatasetConfig, data_dir: PathBuf) -> Self {
        Self {
            config,
            data_dir,
            loaded: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DatasetConfig {
        &self.config
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Verifies that every input file exists.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingFiles`] naming each absent file.
    pub fn check_inputs(&self) -> Result<InputPaths, DataError> {
        check_inputs(&self.data_dir, &self.config)
    }

    /// Loads and joins the inputs, or returns the cached result.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if an input is missing or fails to read, join,
    /// or summarize. A failed load leaves the session unloaded.
    pub fn load(&mut self) -> Result<&LoadedData, DataError> {
        let data = match self.loaded.take() {
            Some(data) => data,
            None => {
                let paths = self.check_inputs()?;
                log::info!("Loading area data from {}", self.data_dir.display());
                SourceTables::read(&paths, &self.config)?.build(self.config.filters.price_percentile)?
            }
        };
        Ok(&*self.loaded.insert(data))
    }

    /// Drops the cached data; the next [`Session::load`] re-reads the inputs.
    pub fn invalidate(&mut self) {
        if self.loaded.take().is_some() {
            log::debug!("Session cache invalidated");
        }
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    #[must_use]
    pub fn table(&self) -> Option<&AreaTable> {
        self.loaded.as_ref().map(|data| &data.table)
    }

    #[must_use]
    pub fn stats(&self) -> Option<&TableStats> {
        self.loaded.as_ref().map(|data| &data.stats)
    }

    /// Default filter settings from the configuration.
    #[must_use]
    pub fn default_settings(&self) -> FilterSettings {
        FilterSettings::new(self.config.filters.default_min_group_share)
    }
}

#[cfg(test)]
mod tests {
    use area_map_area_models::{AreaGeometry, HousingRow};

    use super::*;

    fn tables() -> SourceTables {
        let codes = ["E02000001", "E02000002", "E02000003"];
        SourceTables {
            boundaries: codes
                .iter()
                .map(|code| BoundaryRow {
                    area_code: (*code).to_string(),
                    area_name: (*code).to_string(),
                    geometry: AreaGeometry::Point(geo::Point::new(0.0, 0.0)),
                })
                .collect(),
            income: vec![
                IncomeRow {
                    area_code: codes[0].to_string(),
                    income: Some(50_000.0),
                },
                IncomeRow {
                    area_code: codes[1].to_string(),
                    income: Some(60_000.0),
                },
                IncomeRow {
                    area_code: codes[2].to_string(),
                    income: Some(40_000.0),
                },
            ],
            ethnicity: vec![
                EthnicityRow {
                    area_code: codes[0].to_string(),
                    total_population: 1000,
                    group_count: 200,
                },
                EthnicityRow {
                    area_code: codes[1].to_string(),
                    total_population: 1000,
                    group_count: 50,
                },
                EthnicityRow {
                    area_code: codes[2].to_string(),
                    total_population: 1000,
                    group_count: 300,
                },
            ],
            housing: HousingTable {
                rows: vec![
                    HousingRow {
                        area_code: codes[0].to_string(),
                        full_name: "A".to_string(),
                        house_price: 300_000.0,
                    },
                    HousingRow {
                        area_code: codes[1].to_string(),
                        full_name: "B".to_string(),
                        house_price: 200_000.0,
                    },
                    HousingRow {
                        area_code: codes[2].to_string(),
                        full_name: "C".to_string(),
                        house_price: 500_000.0,
                    },
                ],
                warning: Some(CoercionWarning {
                    artifact: "housing.xlsx".to_string(),
                    column: "All properties".to_string(),
                    dropped: 4,
                }),
            },
        }
    }

    #[test]
    fn builds_table_and_stats() {
        let data = tables().build(0.65).unwrap();
        assert_eq!(data.table.len(), 3);
        assert_eq!(data.dropped, 0);
        assert_eq!(data.warnings.len(), 1);
        assert!((data.stats.mean_income - 50_000.0).abs() < 1e-9);
        assert!((data.stats.house_price_percentile - 360_000.0).abs() < 1e-6);
        assert!((data.table.records()[0].group_share - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn build_fails_when_nothing_joins() {
        let mut tables = tables();
        tables.income.clear();
        assert!(matches!(tables.build(0.65), Err(DataError::EmptyTable { .. })));
    }

    #[test]
    fn load_reports_missing_inputs_and_stays_unloaded() {
        let dir = std::env::temp_dir().join("area_map_session_missing_inputs");
        let mut session = Session::new(DatasetConfig::default(), dir);
        let err = session.load().unwrap_err();
        assert!(matches!(err, DataError::MissingFiles { ref files } if files.len() == 4));
        assert!(!session.is_loaded());
        assert!(session.table().is_none());
    }

    #[test]
    fn invalidate_clears_cache() {
        let mut session = Session::new(DatasetConfig::default(), PathBuf::from("data"));
        session.loaded = Some(tables().build(0.65).unwrap());
        assert!(session.is_loaded());
        assert_eq!(session.load().unwrap().table.len(), 3);

        session.invalidate();
        assert!(!session.is_loaded());
        assert!(session.stats().is_none());
    }

    #[test]
    fn default_settings_use_configured_share() {
        let session = Session::new(DatasetConfig::default(), PathBuf::from("data"));
        let settings = session.default_settings();
        assert!((settings.min_group_share - 0.15).abs() < f64::EPSILON);
        assert_eq!(settings, FilterSettings::new(0.15));
    }
}
