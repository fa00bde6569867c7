//! Derived metrics: group share, table statistics, and the membership mask.
//!
//! Everything here is pure. Computing the mask twice with the same table and
//! criteria gives the same result, so callers may recompute on every change
//! of the thresholds.

use area_map_area_models::{AreaTable, FilterCriteria, TableStats};
use area_map_source::DataError;

/// Fraction of an area's population in the tracked group.
///
/// # Errors
///
/// Returns [`DataError::ZeroPopulation`] when `total_population` is zero.
#[allow(clippy::cast_precision_loss)]
pub fn group_share(area_code: &str, group_count: u64, total_population: u64) -> Result<f64, DataError> {
    if total_population == 0 {
        return Err(DataError::ZeroPopulation {
            area_code: area_code.to_string(),
        });
    }
    Ok(group_count as f64 / total_population as f64)
}

/// Arithmetic mean, or `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Percentile `p` (in `[0, 1]`, clamped) with linear interpolation between
/// order statistics. Returns `None` for an empty slice.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

fn finite(statistic: &str, value: f64) -> Result<f64, DataError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DataError::NonFiniteStatistic {
            statistic: statistic.to_string(),
            value,
        })
    }
}

/// Computes the table-wide statistics.
///
/// `percentile_rank` selects the default price ceiling (0.65 for the 65th
/// percentile).
///
/// # Errors
///
/// Returns [`DataError::EmptyTable`] for an empty table and
/// [`DataError::NonFiniteStatistic`] if any result is NaN or infinite.
pub fn compute_stats(table: &AreaTable, percentile_rank: f64) -> Result<TableStats, DataError> {
    let incomes: Vec<f64> = table.iter().map(|r| r.income).collect();
    let prices: Vec<f64> = table.iter().map(|r| r.house_price).collect();

    let empty = |statistic: &str| DataError::EmptyTable {
        statistic: statistic.to_string(),
    };

    let mean_income = mean(&incomes).ok_or_else(|| empty("mean income"))?;
    let house_price_percentile =
        percentile(&prices, percentile_rank).ok_or_else(|| empty("house price percentile"))?;
    let max_income = incomes.iter().copied().reduce(f64::max).ok_or_else(|| empty("max income"))?;
    let max_house_price = prices
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or_else(|| empty("max house price"))?;

    let stats = TableStats {
        row_count: table.len(),
        mean_income: finite("mean income", mean_income)?,
        house_price_percentile: finite("house price percentile", house_price_percentile)?,
        percentile_rank,
        max_income: finite("max income", max_income)?,
        max_house_price: finite("max house price", max_house_price)?,
    };

    log::info!(
        "Stats over {} areas: mean income {:.0}, p{:.0} house price {:.0}",
        stats.row_count,
        stats.mean_income,
        percentile_rank * 100.0,
        stats.house_price_percentile
    );

    Ok(stats)
}

/// Per-row membership: share, income, and price thresholds all hold.
/// Bounds are inclusive.
#[must_use]
pub fn compute_mask(table: &AreaTable, criteria: &FilterCriteria) -> Vec<bool> {
    table
        .iter()
        .map(|r| {
            r.group_share >= criteria.min_group_share
                && r.income >= criteria.min_income
                && r.house_price <= criteria.max_house_price
        })
        .collect()
}

/// Number of rows the mask selects.
#[must_use]
pub fn match_count(mask: &[bool]) -> usize {
    mask.iter().filter(|m| **m).count()
}
