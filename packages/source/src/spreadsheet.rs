//! Minimal spreadsheet access on top of `calamine`.
//!
//! A worksheet is loaded into a plain grid of [`Cell`]s indexed from the
//! sheet's first row and column, so that header offsets line up with what a
//! person sees in the workbook even when the leading rows are blank. The
//! readers only ever work with the grid, which keeps them testable without
//! fixture workbooks.

use std::path::Path;

use calamine::{Data, Reader as _, open_workbook_auto};

use crate::DataError;

/// A single spreadsheet cell, reduced to what the readers care about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Cell content as trimmed text, or `None` for blanks.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }

    /// Cell content as a number. Text cells must hold a plain number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Empty => None,
            Self::Number(n) => n.is_finite().then_some(*n),
            Self::Text(s) => parse_number(s),
        }
    }
}

/// Parses a plain numeric string such as `"450000"` or `" 31200.5 "`.
///
/// Formatted text (`"450,000"`, `"£31,200"`) and suppression markers
/// (`":"`, `".."`) are not numbers and yield `None`.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

impl From<&Data> for Cell {
    #[allow(clippy::cast_precision_loss)]
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Self::Number(*i as f64),
            Data::Float(f) => Self::Number(*f),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Text(s.clone()),
            Data::Bool(b) => Self::Text(b.to_string()),
            Data::DateTime(dt) => Self::Number(dt.as_f64()),
            Data::Error(e) => Self::Text(e.to_string()),
            Data::Empty => Self::Empty,
        }
    }
}

/// Loads one worksheet into a grid anchored at cell A1.
///
/// # Errors
///
/// Returns [`DataError::Spreadsheet`] if the workbook cannot be opened, or
/// [`DataError::MissingSheet`] if the sheet does not exist.
pub fn load_sheet(path: &Path, sheet: &str) -> Result<Vec<Vec<Cell>>, DataError> {
    let display = path.display().to_string();
    let mut workbook = open_workbook_auto(path).map_err(|e| DataError::Spreadsheet {
        path: display.clone(),
        message: e.to_string(),
    })?;

    if !workbook.sheet_names().iter().any(|name| name.as_str() == sheet) {
        return Err(DataError::MissingSheet {
            path: display,
            sheet: sheet.to_string(),
        });
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| DataError::Spreadsheet {
            path: display.clone(),
            message: e.to_string(),
        })?;

    let (start_row, start_col) = range
        .start()
        .map_or((0, 0), |(r, c)| (r as usize, c as usize));

    let mut grid: Vec<Vec<Cell>> = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col];
        cells.extend(row.iter().map(Cell::from));
        grid.push(cells);
    }

    log::info!("Read {} rows from sheet '{sheet}' of {display}", grid.len());

    Ok(grid)
}

/// A grid split into a header row and the data rows below it.
pub struct Table<'a> {
    artifact: &'a str,
    header: Vec<String>,
    rows: &'a [Vec<Cell>],
}

impl<'a> Table<'a> {
    /// Uses row `skip_rows` as the header; everything below is data.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptyResult`] if the grid has no row at
    /// `skip_rows`.
    pub fn with_header(
        artifact: &'a str,
        grid: &'a [Vec<Cell>],
        skip_rows: usize,
    ) -> Result<Self, DataError> {
        let header_row = grid.get(skip_rows).ok_or_else(|| DataError::EmptyResult {
            artifact: artifact.to_string(),
            step: format!("skipping {skip_rows} header rows"),
        })?;
        let header = header_row
            .iter()
            .map(|cell| cell.as_text().unwrap_or_default())
            .collect();
        Ok(Self {
            artifact,
            header,
            rows: &grid[skip_rows + 1..],
        })
    }

    /// Index of the column whose header equals `name` (trimmed).
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingColumn`] if no header matches.
    pub fn column(&self, name: &str) -> Result<usize, DataError> {
        let wanted = name.trim();
        self.header
            .iter()
            .position(|h| h == wanted)
            .ok_or_else(|| DataError::MissingColumn {
                artifact: self.artifact.to_string(),
                column: name.to_string(),
            })
    }

    /// Header names, trimmed.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows below the header.
    #[must_use]
    pub const fn rows(&self) -> &'a [Vec<Cell>] {
        self.rows
    }
}

static EMPTY: Cell = Cell::Empty;

/// Returns the cell at `index`, treating short rows as blank.
#[must_use]
pub fn cell(row: &[Cell], index: usize) -> &Cell {
    row.get(index).unwrap_or(&EMPTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn parses_plain_numbers_only() {
        assert_eq!(parse_number("450000"), Some(450_000.0));
        assert_eq!(parse_number(" 31200.5 "), Some(31_200.5));
        assert_eq!(parse_number("1e3"), Some(1_000.0));
        assert_eq!(parse_number("450,000"), None);
        assert_eq!(parse_number(" £31,200 "), None);
        assert_eq!(parse_number(":"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn cell_conversions() {
        assert_eq!(Cell::Number(3.0).as_number(), Some(3.0));
        assert_eq!(text(" 12 ").as_number(), Some(12.0));
        assert_eq!(text("  ").as_text(), None);
        assert_eq!(Cell::Empty.as_number(), None);
        assert_eq!(Cell::from(&Data::Int(7)), Cell::Number(7.0));
        assert_eq!(Cell::from(&Data::Empty), Cell::Empty);
    }

    #[test]
    fn splits_header_after_skipped_rows() {
        let grid = vec![
            vec![text("Title")],
            vec![],
            vec![text("MSOA code"), text(" Value ")],
            vec![text("E02000001"), Cell::Number(1.0)],
        ];
        let table = Table::with_header("book.xlsx", &grid, 2).unwrap();
        assert_eq!(table.column("Value").unwrap(), 1);
        assert_eq!(table.rows().len(), 1);
        assert!(matches!(
            table.column("Missing"),
            Err(DataError::MissingColumn { .. })
        ));
    }

    #[test]
    fn rejects_header_past_end() {
        let grid = vec![vec![text("only row")]];
        assert!(matches!(
            Table::with_header("book.xlsx", &grid, 4),
            Err(DataError::EmptyResult { .. })
        ));
    }

    #[test]
    fn short_rows_read_as_blank() {
        let row = vec![text("a")];
        assert_eq!(cell(&row, 5), &Cell::Empty);
    }
}
