//! `partpick groups` command - show the part families of one sheet

use miette::Result;
use std::path::PathBuf;

use crate::cli::commands::utils::{load_config, open_workbook, resolve_source};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{group_sheet, FamilyGroup, PipelineError, Workbook};

#[derive(clap::Args, Debug)]
pub struct GroupsArgs {
    /// BOM workbook to read (default: configured source)
    pub source: Option<PathBuf>,

    /// Sheet index (zero-based)
    #[arg(long, short = 's')]
    pub sheet: usize,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("family", "FAMILY", 32),
    ColumnDef::new("quantity", "QTY", 8),
    ColumnDef::new("candidates", "CANDIDATES", 60),
];

pub fn run(args: GroupsArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config()?;
    let source = resolve_source(args.source, &config)?;
    let mut workbook = open_workbook(&source)?;

    let sheet = workbook
        .read_sheet(args.sheet)
        .map_err(|e| miette::miette!("{}", e))?;
    let groups = group_sheet(&sheet).map_err(|source| PipelineError::MalformedSheet {
        index: sheet.index,
        name: sheet.name.clone(),
        source,
    })?;

    if global.format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&groups).map_err(|e| miette::miette!("{}", e))?;
        println!("{}", json);
        return Ok(());
    }

    let rows: Vec<TableRow> = groups.iter().map(group_row).collect();
    let mut formatter = TableFormatter::new(COLUMNS, "family");
    if global.quiet {
        formatter = formatter.without_summary();
    }
    formatter.output(&rows, global.format);
    Ok(())
}

fn group_row(group: &FamilyGroup) -> TableRow {
    TableRow::new()
        .cell("family", CellValue::Text(group.family.clone()))
        .cell("quantity", CellValue::Number(group.desired_quantity))
        .cell("candidates", CellValue::Codes(group.candidate_codes.clone()))
}
