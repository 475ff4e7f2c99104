//! Shared utilities for CLI commands

use miette::Result;
use std::path::{Path, PathBuf};

use crate::cli::table::{CellValue, ColumnDef, TableRow};
use crate::core::{
    CatalogLookup, Config, ExcelWorkbook, LcscLookup, PartLookup, SelectionRecord, EXPORT_COLUMNS,
};

/// Load the layered configuration
pub fn load_config() -> Result<Config> {
    Config::load().map_err(|e| miette::miette!("{}", e))
}

/// Pick the source workbook: the command-line argument wins over config
pub fn resolve_source(arg: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    arg.or_else(|| config.source.clone()).ok_or_else(|| {
        miette::miette!(
            "No source workbook given. Pass it as an argument, set PARTPICK_SOURCE, or run 'partpick config set source <file>'"
        )
    })
}

pub fn open_workbook(path: &Path) -> Result<ExcelWorkbook> {
    ExcelWorkbook::open(path).map_err(|e| miette::miette!("{}", e))
}

/// Open the lookup the config asks for: the offline catalog when one is
/// configured, the live LCSC catalog otherwise
pub fn open_lookup(config: &Config) -> Result<Box<dyn PartLookup>> {
    match &config.catalog {
        Some(path) => {
            let catalog = CatalogLookup::load(path).map_err(|e| miette::miette!("{}", e))?;
            tracing::debug!(path = %path.display(), parts = catalog.len(), "loaded offline catalog");
            Ok(Box::new(catalog))
        }
        None => {
            let lcsc = LcscLookup::connect(&config.lcsc).map_err(|e| miette::miette!("{}", e))?;
            Ok(Box::new(lcsc))
        }
    }
}

/// Columns of an exported record, titled as in the CSV export
pub const RECORD_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("family", EXPORT_COLUMNS[0], 28),
    ColumnDef::new("code", EXPORT_COLUMNS[1], 14),
    ColumnDef::new("status", EXPORT_COLUMNS[2], 14),
    ColumnDef::new("stock", EXPORT_COLUMNS[3], 16),
    ColumnDef::new("price", EXPORT_COLUMNS[4], 12),
    ColumnDef::new("quantity", EXPORT_COLUMNS[5], 19),
    ColumnDef::new("rounded", EXPORT_COLUMNS[6], 27),
];

pub fn record_row(record: &SelectionRecord) -> TableRow {
    TableRow::new()
        .cell("family", CellValue::Text(record.family.clone()))
        .cell("code", CellValue::Code(record.lookup_code.clone()))
        .cell("status", CellValue::Status(record.stock_status))
        .cell("stock", CellValue::Number(record.stock_quantity))
        .cell("price", CellValue::Price(record.unit_price))
        .cell("quantity", CellValue::Number(record.desired_quantity))
        .cell("rounded", CellValue::Number(record.rounded_purchase_quantity))
}
