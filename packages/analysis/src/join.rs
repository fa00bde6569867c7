//! Merges the four source tables on area code.
//!
//! The boundary rows drive the result: each boundary is matched by exact
//! area code against the income, ethnicity, and housing tables in turn.
//! Rows missing any metric are dropped, so the output never has more rows
//! than the smallest input and every row is fully populated. Output order
//! follows the boundary file.

use std::collections::{HashMap, HashSet};

use area_map_area_models::{
    AreaRecord, AreaTable, BoundaryRow, EthnicityRow, HousingRow, IncomeRow,
};
use area_map_source::DataError;

use crate::metrics::group_share;

/// The joined table and how many boundary rows were dropped as incomplete.
#[derive(Debug, Clone, PartialEq)]
pub struct Joined {
    pub table: AreaTable,
    pub dropped: usize,
}

/// Indexes rows by area code. The first occurrence of a code wins.
fn index_by_code<'a, T>(
    label: &str,
    rows: &'a [T],
    code: impl Fn(&T) -> &str,
) -> HashMap<&'a str, &'a T> {
    let mut index = HashMap::with_capacity(rows.len());
    let mut duplicates = 0usize;
    for row in rows {
        if index.contains_key(code(row)) {
            duplicates += 1;
        } else {
            index.insert(code(row), row);
        }
    }
    if duplicates > 0 {
        log::warn!("{label}: ignored {duplicates} rows with a repeated area code");
    }
    index
}

/// Joins boundaries ⋈ income ⋈ ethnicity ⋈ housing on area code.
///
/// # Errors
///
/// Returns [`DataError::ZeroPopulation`] if a complete row has zero total
/// population.
pub fn join(
    boundaries: Vec<BoundaryRow>,
    income: &[IncomeRow],
    ethnicity: &[EthnicityRow],
    housing: &[HousingRow],
) -> Result<Joined, DataError> {
    let income_by_code = index_by_code("income", income, |r| r.area_code.as_str());
    let ethnicity_by_code = index_by_code("ethnicity", ethnicity, |r| r.area_code.as_str());
    let housing_by_code = index_by_code("housing", housing, |r| r.area_code.as_str());

    let total = boundaries.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(total);
    let mut records = Vec::with_capacity(total);
    let mut duplicates = 0usize;
    let mut dropped = 0usize;

    for boundary in boundaries {
        if !seen.insert(boundary.area_code.clone()) {
            duplicates += 1;
            continue;
        }

        let code = boundary.area_code.as_str();
        let income = income_by_code.get(code).and_then(|r| r.income);
        let ethnicity = ethnicity_by_code.get(code);
        let housing = housing_by_code.get(code);

        let (Some(income), Some(ethnicity), Some(housing)) = (income, ethnicity, housing) else {
            log::debug!("Area {code} is missing a metric, dropping");
            dropped += 1;
            continue;
        };

        let group_share = group_share(code, ethnicity.group_count, ethnicity.total_population)?;

        records.push(AreaRecord {
            area_code: boundary.area_code,
            area_name: boundary.area_name,
            full_name: housing.full_name.clone(),
            total_population: ethnicity.total_population,
            group_count: ethnicity.group_count,
            group_share,
            income,
            house_price: housing.house_price,
            geometry: boundary.geometry,
        });
    }

    if duplicates > 0 {
        log::warn!("boundaries: ignored {duplicates} rows with a repeated area code");
    }
    if dropped > 0 {
        log::warn!("Dropped {dropped} of {total} areas with missing income, population, or price");
    }
    log::info!("Joined table has {} areas", records.len());

    Ok(Joined {
        table: AreaTable::new(records),
        dropped,
    })
}
