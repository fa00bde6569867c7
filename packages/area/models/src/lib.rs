#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistical area records and the types that flow between pipeline stages.
//!
//! Each source reader produces one of the normalized row types below
//! ([`EthnicityRow`], [`IncomeRow`], [`HousingRow`], [`BoundaryRow`]). The
//! joiner merges them into an [`AreaTable`] of [`AreaRecord`]s, from which
//! [`TableStats`] and the per-row membership mask are derived.

pub mod layers;

use serde::{Deserialize, Serialize};

/// Geometry of a single statistical area.
///
/// Passed through from the boundary file without reprojection or
/// simplification.
pub type AreaGeometry = geo::Geometry<f64>;

/// Per-area population counts produced by the ethnicity reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthnicityRow {
    /// Area code (e.g. `"E02000001"`).
    pub area_code: String,
    /// Sum of the observation value across every subcategory for the area.
    pub total_population: u64,
    /// Sum of the observation value across the tracked group's subcategories.
    pub group_count: u64,
}

/// Per-area income estimate produced by the income reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRow {
    /// Area code.
    pub area_code: String,
    /// Mean annual income. `None` when the cell is blank or non-numeric.
    pub income: Option<f64>,
}

/// Per-area house price estimate produced by the housing reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingRow {
    /// Area code.
    pub area_code: String,
    /// Full area name as published in the housing table.
    pub full_name: String,
    /// Median price across all property types.
    pub house_price: f64,
}

/// Per-area boundary produced by the geometry reader.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryRow {
    /// Area code.
    pub area_code: String,
    /// Area name from the boundary file's attribute table.
    pub area_name: String,
    /// Area polygon or multipolygon.
    pub geometry: AreaGeometry,
}

/// One fully-populated row of the joined table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaRecord {
    /// Area code, unique across the table.
    pub area_code: String,
    /// Display label from the boundary file.
    pub area_name: String,
    /// Full name from the housing table, used in tooltips.
    pub full_name: String,
    /// Total resident population.
    pub total_population: u64,
    /// Residents belonging to the tracked group.
    pub group_count: u64,
    /// `group_count / total_population`.
    pub group_share: f64,
    /// Mean annual income.
    pub income: f64,
    /// Median house price.
    pub house_price: f64,
    /// Area geometry.
    #[serde(skip)]
    pub geometry: AreaGeometry,
}

/// The joined, metric-complete table.
///
/// Built once per session and never mutated afterwards; filtering yields a
/// separate boolean mask aligned with [`AreaTable::records`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaTable {
    records: Vec<AreaRecord>,
}

impl AreaTable {
    /// Wraps a list of records.
    #[must_use]
    pub const fn new(records: Vec<AreaRecord>) -> Self {
        Self { records }
    }

    /// Returns the records in table order.
    #[must_use]
    pub fn records(&self) -> &[AreaRecord] {
        &self.records
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the records in table order.
    pub fn iter(&self) -> std::slice::Iter<'_, AreaRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a AreaTable {
    type Item = &'a AreaRecord;
    type IntoIter = std::slice::Iter<'a, AreaRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Table-wide statistics computed once per load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableStats {
    /// Number of rows the statistics were computed over.
    pub row_count: usize,
    /// Arithmetic mean of `income`.
    pub mean_income: f64,
    /// Percentile of `house_price` used as the default affordability ceiling.
    pub house_price_percentile: f64,
    /// The percentile rank behind `house_price_percentile`, in `[0, 1]`.
    pub percentile_rank: f64,
    /// Largest `income` in the table.
    pub max_income: f64,
    /// Largest `house_price` in the table.
    pub max_house_price: f64,
}

/// Resolved thresholds for one filter evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Minimum `group_share`, inclusive.
    pub min_group_share: f64,
    /// Minimum `income`, inclusive.
    pub min_income: f64,
    /// Maximum `house_price`, inclusive.
    pub max_house_price: f64,
}

impl FilterCriteria {
    /// Criteria using the statistics' defaults for income and price.
    #[must_use]
    pub const fn with_defaults(min_group_share: f64, stats: &TableStats) -> Self {
        Self {
            min_group_share,
            min_income: stats.mean_income,
            max_house_price: stats.house_price_percentile,
        }
    }
}

/// How the income threshold is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum IncomeThreshold {
    /// Use the dataset-wide mean income.
    #[default]
    AboveMean,
    /// Use an absolute value.
    Custom(f64),
}

/// How the house price ceiling is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum PriceThreshold {
    /// Use the dataset-wide price percentile.
    #[default]
    BelowPercentile,
    /// Use an absolute value.
    Custom(f64),
}

/// User-facing filter inputs, before resolution against [`TableStats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Minimum group share as a fraction in `[0, 1]`.
    pub min_group_share: f64,
    /// Income threshold mode.
    pub income: IncomeThreshold,
    /// Price threshold mode.
    pub price: PriceThreshold,
}

impl FilterSettings {
    /// Settings with the given share threshold and default modes.
    #[must_use]
    pub fn new(min_group_share: f64) -> Self {
        Self {
            min_group_share,
            income: IncomeThreshold::default(),
            price: PriceThreshold::default(),
        }
    }

    /// Resolves the modes into concrete thresholds.
    #[must_use]
    pub const fn resolve(&self, stats: &TableStats) -> FilterCriteria {
        FilterCriteria {
            min_group_share: self.min_group_share,
            min_income: match self.income {
                IncomeThreshold::AboveMean => stats.mean_income,
                IncomeThreshold::Custom(value) => value,
            },
            max_house_price: match self.price {
                PriceThreshold::BelowPercentile => stats.house_price_percentile,
                PriceThreshold::Custom(value) => value,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> TableStats {
        TableStats {
            row_count: 3,
            mean_income: 50_000.0,
            house_price_percentile: 380_000.0,
            percentile_rank: 0.65,
            max_income: 60_000.0,
            max_house_price: 500_000.0,
        }
    }

    #[test]
    fn default_modes_resolve_to_stats() {
        let criteria = FilterSettings::new(0.15).resolve(&stats());
        assert!((criteria.min_group_share - 0.15).abs() < f64::EPSILON);
        assert!((criteria.min_income - 50_000.0).abs() < f64::EPSILON);
        assert!((criteria.max_house_price - 380_000.0).abs() < f64::EPSILON);
        assert_eq!(criteria, FilterCriteria::with_defaults(0.15, &stats()));
    }

    #[test]
    fn custom_modes_override_stats() {
        let settings = FilterSettings {
            min_group_share: 0.3,
            income: IncomeThreshold::Custom(42_000.0),
            price: PriceThreshold::Custom(250_000.0),
        };
        let criteria = settings.resolve(&stats());
        assert!((criteria.min_income - 42_000.0).abs() < f64::EPSILON);
        assert!((criteria.max_house_price - 250_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn threshold_modes_serialize_with_tag() {
        let json = serde_json::to_value(IncomeThreshold::Custom(1.5)).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "custom", "value": 1.5}));
        let json = serde_json::to_value(PriceThreshold::BelowPercentile).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "below_percentile"}));
    }
}
