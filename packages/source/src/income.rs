//! Small-area income estimate reader.
//!
//! The published workbook carries a few rows of titles above the header, so
//! the header is found after a fixed number of skipped rows. Only the
//! area-code and income columns are kept.

use std::path::Path;

use area_map_area_models::IncomeRow;

use crate::DataError;
use crate::config::IncomeLayout;
use crate::spreadsheet::{Cell, Table, cell, load_sheet};

/// Reads the income workbook at `path`.
///
/// # Errors
///
/// Returns [`DataError`] if the workbook or sheet cannot be read, or if a
/// required column is missing.
pub fn read_income(path: &Path, layout: &IncomeLayout) -> Result<Vec<IncomeRow>, DataError> {
    log::info!("Reading income estimates from {}", path.display());
    let grid = load_sheet(path, &layout.sheet)?;
    read_income_grid(&path.display().to_string(), &grid, layout)
}

/// Reads income rows from a loaded sheet grid.
///
/// Rows with a blank area code are skipped. Rows whose income is blank or
/// non-numeric keep `income: None`; the joiner treats them as incomplete.
///
/// # Errors
///
/// Returns [`DataError::MissingColumn`] if the area-code or income column
/// is absent from the header row, or [`DataError::EmptyResult`] if the sheet
/// is shorter than the header offset.
pub fn read_income_grid(
    artifact: &str,
    grid: &[Vec<Cell>],
    layout: &IncomeLayout,
) -> Result<Vec<IncomeRow>, DataError> {
    let table = Table::with_header(artifact, grid, layout.skip_rows)?;
    let code_idx = table.column(&layout.area_code_column)?;
    let income_idx = table.column(&layout.income_column)?;

    let rows: Vec<IncomeRow> = table
        .rows()
        .iter()
        .filter_map(|row| {
            let area_code = cell(row, code_idx).as_text()?;
            Some(IncomeRow {
                area_code,
                income: cell(row, income_idx).as_number(),
            })
        })
        .collect();

    let missing = rows.iter().filter(|r| r.income.is_none()).count();
    if missing > 0 {
        log::warn!("{artifact}: {missing} areas have no numeric income");
    }
    log::info!("{artifact}: {} income rows", rows.len());

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatasetConfig;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn layout() -> IncomeLayout {
        DatasetConfig::default().income
    }

    fn grid() -> Vec<Vec<Cell>> {
        vec![
            vec![text("Small area income estimates for MSOAs")],
            vec![text("Financial year ending 2020")],
            vec![],
            vec![text("Source: Office for National Statistics")],
            vec![
                text("MSOA code"),
                text("MSOA name"),
                text("Local authority code"),
                text("Total annual income (£)"),
                text("Upper confidence limit (£)"),
            ],
            vec![
                text("E02000001"),
                text("City of London 001"),
                text("E09000001"),
                Cell::Number(82_000.0),
                Cell::Number(95_000.0),
            ],
            vec![
                text("E02000002"),
                text("Barking and Dagenham 001"),
                text("E09000002"),
                text("41600"),
                Cell::Number(48_000.0),
            ],
            vec![
                text("E02000003"),
                text("Barking and Dagenham 002"),
                text("E09000002"),
                text(".."),
            ],
            vec![Cell::Empty, text("Footnote")],
        ]
    }

    #[test]
    fn selects_code_and_income_after_skipped_rows() {
        let rows = read_income_grid("income.xlsx", &grid(), &layout()).unwrap();
        assert_eq!(
            rows,
            vec![
                IncomeRow {
                    area_code: "E02000001".to_string(),
                    income: Some(82_000.0),
                },
                IncomeRow {
                    area_code: "E02000002".to_string(),
                    income: Some(41_600.0),
                },
                IncomeRow {
                    area_code: "E02000003".to_string(),
                    income: None,
                },
            ]
        );
    }

    #[test]
    fn fails_when_income_column_missing() {
        let mut layout = layout();
        layout.income_column = "Net annual income (£)".to_string();
        let err = read_income_grid("income.xlsx", &grid(), &layout).unwrap_err();
        assert!(matches!(
            err,
            DataError::MissingColumn { ref column, .. } if column == "Net annual income (£)"
        ));
    }

    #[test]
    fn fails_with_wrong_header_offset() {
        let mut layout = layout();
        layout.skip_rows = 0;
        let err = read_income_grid("income.xlsx", &grid(), &layout).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { .. }));
    }
}
