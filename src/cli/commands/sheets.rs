//! `partpick sheets` command - list the sheets of a workbook

use miette::Result;
use std::path::PathBuf;

use crate::cli::commands::utils::{load_config, open_workbook, resolve_source};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Workbook;

#[derive(clap::Args, Debug)]
pub struct SheetsArgs {
    /// BOM workbook to inspect (default: configured source)
    pub source: Option<PathBuf>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("index", "INDEX", 7),
    ColumnDef::new("name", "NAME", 40),
    ColumnDef::new("processed", "PROCESSED", 11),
];

pub fn run(args: SheetsArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config()?;
    let source = resolve_source(args.source, &config)?;
    let workbook = open_workbook(&source)?;

    let names = workbook.sheet_names();
    let start = config.sheet_start();
    let end = config.sheet_end.unwrap_or(names.len());
    let in_range = |index: usize| index >= start && index < end;

    if global.format == OutputFormat::Json {
        let sheets: Vec<serde_json::Value> = names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                serde_json::json!({
                    "index": index,
                    "name": name,
                    "processed": in_range(index),
                })
            })
            .collect();
        let json = serde_json::to_string_pretty(&sheets).map_err(|e| miette::miette!("{}", e))?;
        println!("{}", json);
        return Ok(());
    }

    let rows: Vec<TableRow> = names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            TableRow::new()
                .cell("index", CellValue::Number(index as u64))
                .cell("name", CellValue::Text(name.clone()))
                .cell(
                    "processed",
                    if in_range(index) {
                        CellValue::Text("yes".to_string())
                    } else {
                        CellValue::Empty
                    },
                )
        })
        .collect();

    let mut formatter = TableFormatter::new(COLUMNS, "sheet");
    if global.quiet {
        formatter = formatter.without_summary();
    }
    formatter.output(&rows, global.format);
    Ok(())
}
