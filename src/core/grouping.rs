//! Family grouping
//!
//! A BOM sheet lists candidate parts under part families. The family name and
//! the desired quantity are usually only typed on a family's first row, so the
//! table is filled down before rows are partitioned into [`FamilyGroup`]s.

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::core::workbook::{Cell, SheetTable};

/// Column holding the part family name
pub const FAMILY_COLUMN: usize = 0;
/// Column holding the manufacturer part number
pub const MANUFACTURER_PART_COLUMN: usize = 1;
/// Column holding the supplier lookup code
pub const LOOKUP_CODE_COLUMN: usize = 4;
/// Column holding the desired purchase quantity
pub const QUANTITY_COLUMN: usize = 5;

const TRACKED_COLUMNS: [(usize, &str); 4] = [
    (FAMILY_COLUMN, "family"),
    (MANUFACTURER_PART_COLUMN, "manufacturer part"),
    (LOOKUP_CODE_COLUMN, "lookup code"),
    (QUANTITY_COLUMN, "quantity"),
];

/// Lookup code meaning "no supplier code for this part"
pub const NO_CODE_SENTINEL: &str = "--";

/// True if a lookup code is the "no code" placeholder (any case, any padding)
pub fn is_no_code(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(NO_CODE_SENTINEL)
}

/// One BOM line after fill-down
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub family: String,
    pub manufacturer_part_id: String,
    pub lookup_code: String,
    pub desired_quantity: u64,
    /// 1-based spreadsheet row this line came from
    pub line: usize,
}

/// All candidate codes for one part family
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyGroup {
    pub family: String,
    pub desired_quantity: u64,
    /// Distinct lookup codes in first-seen order (may include the "--" sentinel)
    pub candidate_codes: Vec<String>,
}

/// A sheet that cannot be grouped without guessing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GroupError {
    #[error("sheet has no data rows")]
    EmptySheet,

    #[error("sheet has {found} column(s) but {required} are needed (family, part, code and quantity at columns 1, 2, 5 and 6)")]
    MissingColumns { found: usize, required: usize },

    #[error("row {row}: {column} cell is blank and there is no earlier value to fill down from")]
    LeadingBlank { column: &'static str, row: usize },

    #[error("row {row}: desired quantity '{value}' is not a non-negative whole number")]
    InvalidQuantity { row: usize, value: String },

    #[error("row {row}: family '{family}' wants quantity {found}, but its first row says {expected}")]
    InconsistentQuantity {
        family: String,
        expected: u64,
        found: u64,
        row: usize,
    },
}

/// Fill blank cells with the nearest non-blank value above them, per column.
///
/// Cells that have nothing above them stay blank. Rows shorter than the widest
/// row are padded so every column can be filled.
pub fn forward_fill(rows: &mut [Vec<Cell>]) {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut carried: Vec<Option<Cell>> = vec![None; width];

    for row in rows.iter_mut() {
        row.resize(width, Cell::Empty);
        for (cell, last) in row.iter_mut().zip(carried.iter_mut()) {
            if cell.is_blank() {
                if let Some(value) = last {
                    *cell = value.clone();
                }
            } else {
                *last = Some(cell.clone());
            }
        }
    }
}

/// Coerce a quantity cell to a whole number
fn parse_quantity(cell: &Cell, row: usize) -> Result<u64, GroupError> {
    let invalid = || GroupError::InvalidQuantity {
        row,
        value: cell.as_text(),
    };

    match cell {
        Cell::Int(n) => u64::try_from(*n).map_err(|_| invalid()),
        Cell::Float(f) if f.is_finite() && f.fract() == 0.0 && *f >= 0.0 => Ok(*f as u64),
        Cell::Text(s) => {
            let cleaned = s.trim().replace(',', "");
            if let Ok(n) = cleaned.parse::<u64>() {
                return Ok(n);
            }
            match cleaned.parse::<f64>() {
                Ok(f) if f.is_finite() && f.fract() == 0.0 && f >= 0.0 => Ok(f as u64),
                _ => Err(invalid()),
            }
        }
        _ => Err(invalid()),
    }
}

/// Read the tracked columns of a sheet into filled-down [`Row`]s.
///
/// Entirely blank lines are dropped before filling.
pub fn rows_from_sheet(sheet: &SheetTable) -> Result<Vec<Row>, GroupError> {
    let mut lines = Vec::new();
    let mut table = Vec::new();
    for (i, row) in sheet.rows.iter().enumerate() {
        if row.iter().all(Cell::is_blank) {
            continue;
        }
        lines.push(sheet.line_of(i));
        table.push(row.clone());
    }

    if table.is_empty() {
        return Err(GroupError::EmptySheet);
    }

    let required = QUANTITY_COLUMN + 1;
    let found = sheet.width();
    if found < required {
        return Err(GroupError::MissingColumns { found, required });
    }

    forward_fill(&mut table);

    let mut rows = Vec::with_capacity(table.len());
    for (cells, &line) in table.iter().zip(&lines) {
        for &(column, label) in &TRACKED_COLUMNS {
            if cells.get(column).map_or(true, Cell::is_blank) {
                return Err(GroupError::LeadingBlank { column: label, row: line });
            }
        }

        rows.push(Row {
            family: cells[FAMILY_COLUMN].as_text(),
            manufacturer_part_id: cells[MANUFACTURER_PART_COLUMN].as_text(),
            lookup_code: cells[LOOKUP_CODE_COLUMN].as_text(),
            desired_quantity: parse_quantity(&cells[QUANTITY_COLUMN], line)?,
            line,
        });
    }

    Ok(rows)
}

/// Partition rows into one group per family, in first-seen family order
pub fn group(rows: &[Row]) -> Result<Vec<FamilyGroup>, GroupError> {
    if rows.is_empty() {
        return Err(GroupError::EmptySheet);
    }

    let mut groups: Vec<FamilyGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        match index.get(row.family.as_str()) {
            Some(&i) => {
                let group = &mut groups[i];
                if row.desired_quantity != group.desired_quantity {
                    return Err(GroupError::InconsistentQuantity {
                        family: row.family.clone(),
                        expected: group.desired_quantity,
                        found: row.desired_quantity,
                        row: row.line,
                    });
                }
                if !group.candidate_codes.contains(&row.lookup_code) {
                    group.candidate_codes.push(row.lookup_code.clone());
                }
            }
            None => {
                index.insert(row.family.as_str(), groups.len());
                groups.push(FamilyGroup {
                    family: row.family.clone(),
                    desired_quantity: row.desired_quantity,
                    candidate_codes: vec![row.lookup_code.clone()],
                });
            }
        }
    }

    Ok(groups)
}

/// Fill down and group one sheet
pub fn group_sheet(sheet: &SheetTable) -> Result<Vec<FamilyGroup>, GroupError> {
    let rows = rows_from_sheet(sheet)?;
    group(&rows)
}
