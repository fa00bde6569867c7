//! Median house price reader.
//!
//! Prices are coerced to numbers. Suppressed or otherwise non-numeric cells
//! (`":"`, `"[x]"`, blanks) cannot take part in the affordability threshold,
//! so those rows are dropped and reported as a [`CoercionWarning`] instead
//! of failing the load.

use std::path::Path;

use area_map_area_models::HousingRow;

use crate::config::HousingLayout;
use crate::spreadsheet::{Cell, Table, cell, load_sheet};
use crate::{CoercionWarning, DataError};

/// Output of the housing reader.
#[derive(Debug, Clone, PartialEq)]
pub struct HousingTable {
    /// Rows with a numeric price.
    pub rows: Vec<HousingRow>,
    /// Rows dropped because the price was not numeric, if any.
    pub warning: Option<CoercionWarning>,
}

/// Reads the housing workbook at `path`.
///
/// # Errors
///
/// Returns [`DataError`] if the workbook or sheet cannot be read, or if a
/// required column is missing.
pub fn read_housing(path: &Path, layout: &HousingLayout) -> Result<HousingTable, DataError> {
    log::info!("Reading house prices from {}", path.display());
    let grid = load_sheet(path, &layout.sheet)?;
    read_housing_grid(&path.display().to_string(), &grid, layout)
}

/// Reads housing rows from a loaded sheet grid.
///
/// # Errors
///
/// Returns [`DataError::MissingColumn`] if the area-code, area-name, or
/// price column is absent from the header row.
pub fn read_housing_grid(
    artifact: &str,
    grid: &[Vec<Cell>],
    layout: &HousingLayout,
) -> Result<HousingTable, DataError> {
    let table = Table::with_header(artifact, grid, layout.skip_rows)?;
    log::debug!("{artifact}: columns {}", table.header().join(", "));

    let code_idx = table.column(&layout.area_code_column)?;
    let name_idx = table.column(&layout.area_name_column)?;
    let price_idx = table.column(&layout.price_column)?;

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    let mut blank_codes = 0usize;

    for row in table.rows() {
        let Some(area_code) = cell(row, code_idx).as_text() else {
            blank_codes += 1;
            continue;
        };
        let Some(house_price) = cell(row, price_idx).as_number() else {
            dropped += 1;
            continue;
        };
        rows.push(HousingRow {
            area_code,
            full_name: cell(row, name_idx).as_text().unwrap_or_default(),
            house_price,
        });
    }

    let warning = (dropped > 0).then(|| CoercionWarning {
        artifact: artifact.to_string(),
        column: layout.price_column.clone(),
        dropped,
    });
    if let Some(warning) = &warning {
        log::warn!("{warning}");
    }
    if blank_codes > 0 {
        log::debug!("{artifact}: skipped {blank_codes} rows without an area code");
    }
    log::info!("{artifact}: {} rows with numeric prices", rows.len());

    Ok(HousingTable { rows, warning })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatasetConfig;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn layout() -> HousingLayout {
        DatasetConfig::default().housing
    }

    fn header() -> Vec<Cell> {
        vec![
            text("Local authority code"),
            text("MSOA code"),
            text("MSOA name"),
            text("All properties"),
            text("Detached"),
        ]
    }

    #[test]
    fn selects_code_name_and_price() {
        let grid = vec![
            header(),
            vec![
                text("E09000001"),
                text("E02000001"),
                text("City of London 001"),
                Cell::Number(850_000.0),
                text(":"),
            ],
            vec![
                text("E09000002"),
                text("E02000002"),
                text("Barking and Dagenham 001"),
                text("310000"),
                Cell::Number(500_000.0),
            ],
        ];
        let table = read_housing_grid("housing.xlsx", &grid, &layout()).unwrap();
        assert!(table.warning.is_none());
        assert_eq!(
            table.rows,
            vec![
                HousingRow {
                    area_code: "E02000001".to_string(),
                    full_name: "City of London 001".to_string(),
                    house_price: 850_000.0,
                },
                HousingRow {
                    area_code: "E02000002".to_string(),
                    full_name: "Barking and Dagenham 001".to_string(),
                    house_price: 310_000.0,
                },
            ]
        );
    }

    #[test]
    fn drops_non_numeric_prices_with_warning() {
        let grid = vec![
            header(),
            vec![text("E09000001"), text("E02000001"), text("A"), text(":")],
            vec![text("E09000001"), text("E02000002"), text("B"), Cell::Empty],
            vec![
                text("E09000001"),
                text("E02000003"),
                text("C"),
                Cell::Number(400_000.0),
            ],
        ];
        let table = read_housing_grid("housing.xlsx", &grid, &layout()).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(
            table.warning,
            Some(CoercionWarning {
                artifact: "housing.xlsx".to_string(),
                column: "All properties".to_string(),
                dropped: 2,
            })
        );
    }

    #[test]
    fn drops_formatted_price_text() {
        let grid = vec![
            header(),
            vec![text("E09000001"), text("E02000001"), text("A"), text("310,000")],
            vec![text("E09000001"), text("E02000002"), text("B"), text("£295,000")],
            vec![text("E09000001"), text("E02000003"), text("C"), text(" 280000 ")],
        ];
        let table = read_housing_grid("housing.xlsx", &grid, &layout()).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].area_code, "E02000003");
        assert!((table.rows[0].house_price - 280_000.0).abs() < f64::EPSILON);
        assert_eq!(table.warning.map(|w| w.dropped), Some(2));
    }

    #[test]
    fn skips_rows_without_area_code_uncounted() {
        let grid = vec![
            header(),
            vec![text("E09000001"), Cell::Empty, text("Totals"), Cell::Number(1.0)],
            vec![text("E09000001"), text("  "), text("Notes"), text(":")],
            vec![
                text("E09000001"),
                text("E02000001"),
                text("A"),
                Cell::Number(400_000.0),
            ],
        ];
        let table = read_housing_grid("housing.xlsx", &grid, &layout()).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert!(table.warning.is_none());
    }

    #[test]
    fn fails_when_price_column_missing() {
        let grid = vec![vec![text("MSOA code"), text("MSOA name"), text("Median")]];
        let err = read_housing_grid("housing.xlsx", &grid, &layout()).unwrap_err();
        assert!(matches!(
            err,
            DataError::MissingColumn { ref column, .. } if column == "All properties"
        ));
    }
}
