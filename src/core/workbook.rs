//! Spreadsheet access
//!
//! A workbook is a list of named sheets. Each sheet is read into a
//! [`SheetTable`]: the first row of the used range is the header, every
//! following row is data. Cells are addressed by absolute column position,
//! so a sheet whose column A is empty still reports the lookup code at
//! column index 4.

use calamine::{open_workbook_auto, DataType, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A spreadsheet cell, reduced to the value kinds the pipeline looks at
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    /// Empty cells and whitespace-only text count as blank
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Render the cell as trimmed text.
    ///
    /// Integral floats lose their fractional part, so a part number typed
    /// as `12345` in a numeric column reads back as `"12345"`, not `"12345.0"`.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", *f as i64)
            }
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

impl From<&DataType> for Cell {
    fn from(value: &DataType) -> Self {
        match value {
            DataType::Empty => Cell::Empty,
            DataType::String(s) => Cell::Text(s.clone()),
            DataType::Int(n) => Cell::Int(*n),
            DataType::Float(f) => Cell::Float(*f),
            DataType::Bool(b) => Cell::Bool(*b),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

/// One sheet of a workbook: a header row plus data rows
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    /// Zero-based position of the sheet in the workbook
    pub index: usize,
    /// Sheet name as shown on its tab
    pub name: String,
    pub header: Vec<Cell>,
    pub rows: Vec<Vec<Cell>>,
    /// 1-based spreadsheet row number of the header row
    header_line: usize,
}

impl SheetTable {
    /// Build a sheet from a grid whose first row is the header.
    ///
    /// `header_line` is the 1-based spreadsheet row of `grid[0]`.
    pub fn new(index: usize, name: impl Into<String>, grid: Vec<Vec<Cell>>, header_line: usize) -> Self {
        let mut rows = grid.into_iter();
        let header = rows.next().unwrap_or_default();
        Self {
            index,
            name: name.into(),
            header,
            rows: rows.collect(),
            header_line,
        }
    }

    /// Number of columns spanned by the header or any data row
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }

    /// 1-based spreadsheet row number of a data row, for error messages
    pub fn line_of(&self, row: usize) -> usize {
        self.header_line + 1 + row
    }
}

/// Errors raised while opening or reading a workbook
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("Spreadsheet not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to open spreadsheet {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("Sheet index {index} is out of range (workbook has {count} sheet(s))")]
    SheetOutOfRange { index: usize, count: usize },

    #[error("Failed to read sheet '{name}': {message}")]
    Read { name: String, message: String },
}

/// Source of sheets for the pipeline
pub trait Workbook {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Read one sheet by zero-based index
    fn read_sheet(&mut self, index: usize) -> Result<SheetTable, WorkbookError>;

    fn sheet_count(&self) -> usize {
        self.sheet_names().len()
    }
}

/// Workbook backed by a spreadsheet file (xlsx, xlsm, xlsb, xls, ods)
pub struct ExcelWorkbook {
    sheets: Sheets<BufReader<File>>,
}

impl ExcelWorkbook {
    pub fn open(path: &Path) -> Result<Self, WorkbookError> {
        if !path.exists() {
            return Err(WorkbookError::NotFound(path.to_path_buf()));
        }

        let sheets = open_workbook_auto(path).map_err(|e| WorkbookError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(Self { sheets })
    }
}

impl Workbook for ExcelWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names().to_vec()
    }

    fn read_sheet(&mut self, index: usize) -> Result<SheetTable, WorkbookError> {
        let names = self.sheet_names();
        let name = names
            .get(index)
            .cloned()
            .ok_or(WorkbookError::SheetOutOfRange {
                index,
                count: names.len(),
            })?;

        let range = self
            .sheets
            .worksheet_range_at(index)
            .ok_or(WorkbookError::SheetOutOfRange {
                index,
                count: names.len(),
            })?
            .map_err(|e| WorkbookError::Read {
                name: name.clone(),
                message: e.to_string(),
            })?;

        // The used range may not start at A1; pad so column indexes stay absolute
        let (first_row, first_col) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let grid = range
            .rows()
            .map(|row| {
                let mut cells = vec![Cell::Empty; first_col];
                cells.extend(row.iter().map(Cell::from));
                cells
            })
            .collect();

        Ok(SheetTable::new(index, name, grid, first_row + 1))
    }
}

/// Workbook held in memory, for feeding the pipeline without a file
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, Vec<Vec<Cell>>)>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet; the first row of `grid` is its header
    pub fn with_sheet(mut self, name: impl Into<String>, grid: Vec<Vec<Cell>>) -> Self {
        self.sheets.push((name.into(), grid));
        self
    }
}

impl Workbook for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, index: usize) -> Result<SheetTable, WorkbookError> {
        let (name, grid) = self
            .sheets
            .get(index)
            .ok_or(WorkbookError::SheetOutOfRange {
                index,
                count: self.sheets.len(),
            })?;
        Ok(SheetTable::new(index, name.clone(), grid.clone(), 1))
    }
}
