//! Census ethnicity reader.
//!
//! The input is long-format: one row per (area, ethnic subcategory) pair
//! with a numeric observation. The reader keeps areas inside the region,
//! sums every subcategory into the area's total population, and sums the
//! subcategories under the tracked group's label prefix into the group
//! count.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use area_map_area_models::EthnicityRow;

use crate::DataError;
use crate::config::EthnicityLayout;

/// Reads the ethnicity CSV at `path`.
///
/// # Errors
///
/// Returns [`DataError`] if the file cannot be opened or fails any of the
/// checks described on [`read_ethnicity_from`].
pub fn read_ethnicity(path: &Path, layout: &EthnicityLayout) -> Result<Vec<EthnicityRow>, DataError> {
    let display = path.display().to_string();
    log::info!("Reading census ethnicity counts from {display}");
    let file = std::fs::File::open(path).map_err(|e| DataError::Io {
        path: display.clone(),
        source: e,
    })?;
    read_ethnicity_from(&display, std::io::BufReader::new(file), layout)
}

/// Reads ethnicity rows from any CSV source.
///
/// Rows are returned in area-code order.
///
/// # Errors
///
/// Returns [`DataError::MissingColumn`] if the area-code, category, or value
/// column is absent, [`DataError::InvalidValue`] if an observation is not a
/// non-negative whole number, and [`DataError::EmptyResult`] if no area
/// matches the region prefix.
pub fn read_ethnicity_from<R: Read>(
    artifact: &str,
    reader: R,
    layout: &EthnicityLayout,
) -> Result<Vec<EthnicityRow>, DataError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv
        .headers()
        .map_err(|e| DataError::Csv {
            path: artifact.to_string(),
            source: e,
        })?
        .clone();

    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name.trim())
            .ok_or_else(|| DataError::MissingColumn {
                artifact: artifact.to_string(),
                column: name.to_string(),
            })
    };
    let code_idx = find(&layout.area_code_column)?;
    let category_idx = find(&layout.category_column)?;
    let value_idx = find(&layout.value_column)?;

    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    let mut groups: BTreeMap<String, u64> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in csv.records() {
        let record = record.map_err(|e| DataError::Csv {
            path: artifact.to_string(),
            source: e,
        })?;

        let code = record.get(code_idx).unwrap_or_default();
        if !code.starts_with(&layout.region_prefix) {
            skipped += 1;
            continue;
        }

        let raw_value = record.get(value_idx).unwrap_or_default();
        let value = parse_count(raw_value).ok_or_else(|| DataError::InvalidValue {
            artifact: artifact.to_string(),
            column: layout.value_column.clone(),
            value: raw_value.to_string(),
        })?;

        *totals.entry(code.to_string()).or_default() += value;

        let category = record.get(category_idx).unwrap_or_default();
        if category.starts_with(&layout.group_prefix) {
            *groups.entry(code.to_string()).or_default() += value;
        }
    }

    if totals.is_empty() {
        return Err(DataError::EmptyResult {
            artifact: artifact.to_string(),
            step: format!("filtering area codes by prefix '{}'", layout.region_prefix),
        });
    }

    if skipped > 0 {
        log::debug!("{artifact}: skipped {skipped} rows outside prefix '{}'", layout.region_prefix);
    }

    let rows: Vec<EthnicityRow> = totals
        .into_iter()
        .map(|(area_code, total_population)| {
            let group_count = groups.get(&area_code).copied().unwrap_or(0);
            EthnicityRow {
                area_code,
                total_population,
                group_count,
            }
        })
        .collect();

    log::info!("{artifact}: {} areas with population counts", rows.len());

    Ok(rows)
}

/// Parses an observation as a whole, non-negative count. Accepts `"12"` and
/// `"12.0"`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n);
    }
    let f = raw.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= 9.007_199_254_740_992e15 {
        Some(f as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatasetConfig;

    const HEADER: &str =
        "Middle layer Super Output Areas Code,Middle layer Super Output Areas,Ethnic group (20 categories) Code,Ethnic group (20 categories),Observation\n";

    fn layout() -> EthnicityLayout {
        DatasetConfig::default().ethnicity
    }

    fn read(body: &str) -> Result<Vec<EthnicityRow>, DataError> {
        let csv = format!("{HEADER}{body}");
        read_ethnicity_from("test.csv", csv.as_bytes(), &layout())
    }

    #[test]
    fn computes_total_and_group_counts() {
        let rows = read(
            "E02000001,City of London 001,13,\"Black, Black British, Black Welsh, Caribbean or African: African\",50\n\
             E02000001,City of London 001,17,White: English,450\n",
        )
        .unwrap();
        assert_eq!(
            rows,
            vec![EthnicityRow {
                area_code: "E02000001".to_string(),
                total_population: 500,
                group_count: 50,
            }]
        );
        #[allow(clippy::cast_precision_loss)]
        let share = rows[0].group_count as f64 / rows[0].total_population as f64;
        assert!((share - 0.10).abs() < 1e-12);
    }

    #[test]
    fn sums_every_group_subcategory() {
        let rows = read(
            "E02000002,Barking 001,12,\"Black, Black British, Black Welsh, Caribbean or African: Caribbean\",30\n\
             E02000002,Barking 001,13,\"Black, Black British, Black Welsh, Caribbean or African: African\",70\n\
             E02000002,Barking 001,14,\"Black, Black British, Black Welsh, Caribbean or African: Other Black\",5\n\
             E02000002,Barking 001,6,\"Asian, Asian British or Asian Welsh: Indian\",95\n",
        )
        .unwrap();
        assert_eq!(rows[0].group_count, 105);
        assert_eq!(rows[0].total_population, 200);
    }

    #[test]
    fn drops_areas_outside_region_prefix() {
        let rows = read(
            "W02000001,Isle of Anglesey 001,17,White: Welsh,300\n\
             E02000003,Barking 002,17,White: English,120\n",
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].area_code, "E02000003");
        assert_eq!(rows[0].group_count, 0);
    }

    #[test]
    fn orders_rows_by_area_code() {
        let rows = read(
            "E02000009,B,17,White: English,1\n\
             E02000004,A,17,White: English,1\n",
        )
        .unwrap();
        let codes: Vec<&str> = rows.iter().map(|r| r.area_code.as_str()).collect();
        assert_eq!(codes, vec!["E02000004", "E02000009"]);
    }

    #[test]
    fn fails_when_no_area_matches() {
        let err = read("W02000001,Anglesey,17,White: Welsh,300\n").unwrap_err();
        assert!(matches!(err, DataError::EmptyResult { .. }));
    }

    #[test]
    fn fails_on_missing_column() {
        let csv = "Area,Ethnic group (20 categories),Observation\nE02000001,White: English,1\n";
        let err = read_ethnicity_from("test.csv", csv.as_bytes(), &layout()).unwrap_err();
        assert!(matches!(
            err,
            DataError::MissingColumn { ref column, .. } if column == "Middle layer Super Output Areas Code"
        ));
    }

    #[test]
    fn fails_on_non_numeric_observation() {
        let err = read("E02000001,City,17,White: English,lots\n").unwrap_err();
        assert!(matches!(err, DataError::InvalidValue { ref value, .. } if value == "lots"));
    }

    #[test]
    fn parses_counts() {
        assert_eq!(parse_count("12"), Some(12));
        assert_eq!(parse_count("12.0"), Some(12));
        assert_eq!(parse_count("12.5"), None);
        assert_eq!(parse_count("-1"), None);
        assert_eq!(parse_count(""), None);
    }
}
