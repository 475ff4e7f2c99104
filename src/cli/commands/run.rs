//! `partpick run` command - select the cheapest in-stock part per family

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::commands::utils::{
    load_config, open_lookup, open_workbook, record_row, resolve_source, RECORD_COLUMNS,
};
use crate::cli::helpers::{format_duration, format_price, plural};
use crate::cli::table::{TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::pipeline::{self, Progress};
use crate::core::{
    Config, FamilyOutcome, FamilyReport, GroupError, LookupSession, PartLookup, RunOptions,
    RunSummary, SheetSummary, Throttle,
};

#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Source BOM workbook (xlsx, xlsm, xls, ods)
    pub source: Option<PathBuf>,

    /// CSV file receiving the selected parts
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// CSV file receiving families with no buyable part
    #[arg(long, short = 'u')]
    pub unavailable: Option<PathBuf>,

    /// First sheet to process (zero-based; sheet 0 is usually BOM notes)
    #[arg(long)]
    pub sheet_start: Option<usize>,

    /// Sheet to stop before (zero-based, exclusive; default: all sheets)
    #[arg(long)]
    pub sheet_end: Option<usize>,

    /// Seconds to wait between supplier queries
    #[arg(long)]
    pub delay: Option<f64>,

    /// Use an offline YAML catalog instead of the live LCSC catalog
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Continue past malformed sheets (default: stop on the first one)
    #[arg(long)]
    pub skip_errors: bool,
}

impl RunArgs {
    /// Command-line flags as the top config layer
    fn as_config(&self) -> Config {
        Config {
            source: self.source.clone(),
            output: self.output.clone(),
            unavailable: self.unavailable.clone(),
            sheet_start: self.sheet_start,
            sheet_end: self.sheet_end,
            delay_secs: self.delay,
            catalog: self.catalog.clone(),
            ..Config::default()
        }
    }
}

pub fn run(args: RunArgs, global: &GlobalOpts) -> Result<()> {
    let mut config = load_config()?;
    config.merge(args.as_config());

    let source = resolve_source(None, &config)?;
    let delay = config
        .inter_query_delay()
        .map_err(|e| miette::miette!("{}", e))?;
    let options = RunOptions {
        output: config.output(),
        unavailable: config.unavailable(),
        sheet_start: config.sheet_start(),
        sheet_end: config.sheet_end,
        skip_errors: args.skip_errors,
    };

    let mut workbook = open_workbook(&source)?;
    let lookup = open_lookup(&config)?;
    let source_name = lookup.source_name().to_string();
    let session = LookupSession::new(lookup);
    let mut throttle = Throttle::new(delay);

    let json = global.format == OutputFormat::Json;
    let mut progress = ConsoleProgress {
        format: global.format,
        quiet: global.quiet || json,
        verbose: global.verbose || config.verbose(),
    };

    if !progress.quiet {
        println!(
            "{} Selecting parts from {} using {}",
            style("→").blue(),
            style(source.display()).yellow(),
            style(&source_name).cyan()
        );
        println!();
    }

    let summary = pipeline::run(&options, &mut workbook, session, &mut throttle, &mut progress)?;

    if json {
        print_json_summary(&summary)?;
    } else if !global.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Prints run progress to the console
struct ConsoleProgress {
    format: OutputFormat,
    quiet: bool,
    verbose: bool,
}

impl ConsoleProgress {
    fn print_records(&self, title: &str, rows: Vec<TableRow>) {
        if rows.is_empty() {
            return;
        }
        println!("{}", style(title).bold());
        TableFormatter::new(RECORD_COLUMNS, "family")
            .without_summary()
            .output(&rows, self.format);
        println!();
    }
}

impl Progress for ConsoleProgress {
    fn sheet_started(&mut self, index: usize, name: &str, families: usize) {
        if self.quiet {
            return;
        }
        println!(
            "{} Sheet {} {} ({})",
            style("→").blue(),
            style(index).cyan(),
            style(name).bold(),
            plural(families, "family", "families")
        );
    }

    fn family_done(&mut self, report: &FamilyReport) {
        if self.quiet || !self.verbose {
            return;
        }

        let outcome = match &report.outcome {
            FamilyOutcome::Selected(record) => style(format!(
                "selected {} at {}",
                record.lookup_code,
                format_price(record.unit_price)
            ))
            .green(),
            FamilyOutcome::Unavailable(_) => style("no buyable part".to_string()).yellow(),
            FamilyOutcome::NotNeeded => style("quantity 0, skipped".to_string()).dim(),
        };
        println!(
            "  {} (qty {}): {}",
            style(&report.family).cyan(),
            report.desired_quantity,
            outcome
        );

        for candidate in &report.candidates {
            let price = candidate
                .quote
                .map(|q| format!("{} @ {}", format_price(q.unit_price), q.rounded_purchase_quantity))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "      {:<14} {:<6} stock {:>8}  {}",
                candidate.code,
                if candidate.in_stock { "yes" } else { "no" },
                candidate.available_quantity,
                style(price).dim()
            );
        }
        for code in &report.skipped_codes {
            println!("      {:<14} {}", code, style("(no code, skipped)").dim());
        }
        for failure in &report.failures {
            println!("      {} {}", style("!").yellow(), style(failure).dim());
        }
    }

    fn sheet_done(&mut self, summary: &SheetSummary) {
        if self.quiet {
            return;
        }
        self.print_records("Selected", summary.selected.iter().map(record_row).collect());
        self.print_records(
            "Unavailable",
            summary.unavailable.iter().map(record_row).collect(),
        );
        println!(
            "{} Sheet {} done: {} selected, {} unavailable",
            style("✓").green(),
            style(summary.index).cyan(),
            style(summary.selected.len()).green(),
            style(summary.unavailable.len()).yellow()
        );
        println!();
    }

    fn sheet_skipped(&mut self, index: usize, name: &str, error: &GroupError) {
        if self.quiet {
            return;
        }
        println!(
            "{} Skipping sheet {} {}: {}",
            style("!").yellow(),
            style(index).cyan(),
            style(name).bold(),
            style(error).red()
        );
        println!();
    }
}

fn print_summary(summary: &RunSummary) {
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Run Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Sheets processed: {}", style(summary.sheets.len()).cyan());
    println!("  Families:         {}", style(summary.family_count()).cyan());
    println!("  Selected:         {}", style(summary.selected_count()).green());
    println!("  Unavailable:      {}", style(summary.unavailable_count()).yellow());
    if !summary.skipped.is_empty() {
        println!("  Skipped sheets:   {}", style(summary.skipped.len()).red());
        for (index, name, reason) in &summary.skipped {
            println!("    {} {}: {}", style(index).cyan(), name, style(reason).dim());
        }
    }
    println!();
    println!(
        "{} Selected parts written to {}",
        style("✓").green(),
        style(summary.output.display()).yellow()
    );
    println!(
        "{} Unavailable families written to {}",
        style("✓").green(),
        style(summary.unavailable.display()).yellow()
    );
    println!(
        "  Total execution time: {}",
        style(format_duration(summary.elapsed)).cyan()
    );
}

fn print_json_summary(summary: &RunSummary) -> Result<()> {
    let sheets: Vec<serde_json::Value> = summary
        .sheets
        .iter()
        .map(|sheet| {
            serde_json::json!({
                "index": sheet.index,
                "name": sheet.name,
                "families": sheet.families,
                "selected": sheet.selected,
                "unavailable": sheet.unavailable,
            })
        })
        .collect();
    let skipped: Vec<serde_json::Value> = summary
        .skipped
        .iter()
        .map(|(index, name, reason)| {
            serde_json::json!({
                "index": index,
                "name": name,
                "reason": reason.to_string(),
            })
        })
        .collect();
    let value = serde_json::json!({
        "sheets": sheets,
        "skipped": skipped,
        "output": summary.output,
        "unavailable": summary.unavailable,
        "elapsed_secs": summary.elapsed.as_secs_f64(),
    });
    let json = serde_json::to_string_pretty(&value).map_err(|e| miette::miette!("{}", e))?;
    println!("{}", json);
    Ok(())
}
