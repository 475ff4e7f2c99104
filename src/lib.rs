//! partpick: cheapest in-stock part selection for multi-sheet BOMs
//!
//! Reads part families from a BOM workbook, looks up stock and price for
//! every candidate supplier code, and exports the cheapest buyable part per
//! family plus a list of families nothing could be bought for.

pub mod cli;
pub mod core;
