//! Sheet-by-sheet selection run
//!
//! Drives the whole job: clears the export files, then for every sheet in the
//! requested range groups the rows, selects a part per family and appends the
//! results. The lookup session is owned by the run and closed however it ends.

use miette::Diagnostic;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::core::export::{append_records, reset_outputs, ExportError};
use crate::core::grouping::{group_sheet, GroupError};
use crate::core::lookup::{LookupError, LookupSession, PartLookup};
use crate::core::selector::{select_cheapest_with, FamilyReport, SelectionRecord};
use crate::core::throttle::{Clock, Throttle};
use crate::core::workbook::{Workbook, WorkbookError};

/// Where results go and which sheets to read
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output: PathBuf,
    pub unavailable: PathBuf,
    /// First sheet to process (zero-based)
    pub sheet_start: usize,
    /// Sheet to stop before; `None` means the last sheet
    pub sheet_end: Option<usize>,
    /// Report malformed sheets and move on instead of stopping the run
    pub skip_errors: bool,
}

/// Progress sink for a run; every hook defaults to doing nothing
pub trait Progress {
    fn sheet_started(&mut self, _index: usize, _name: &str, _families: usize) {}
    fn family_done(&mut self, _report: &FamilyReport) {}
    fn sheet_done(&mut self, _summary: &SheetSummary) {}
    fn sheet_skipped(&mut self, _index: usize, _name: &str, _error: &GroupError) {}
}

/// A no-op progress sink
pub struct NullProgress;
impl Progress for NullProgress {}

/// Records produced by one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    pub index: usize,
    pub name: String,
    pub families: usize,
    pub selected: Vec<SelectionRecord>,
    pub unavailable: Vec<SelectionRecord>,
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub sheets: Vec<SheetSummary>,
    /// Malformed sheets passed over with `skip_errors`: index, name and reason
    pub skipped: Vec<(usize, String, GroupError)>,
    pub output: PathBuf,
    pub unavailable: PathBuf,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn selected_count(&self) -> usize {
        self.sheets.iter().map(|s| s.selected.len()).sum()
    }

    pub fn unavailable_count(&self) -> usize {
        self.sheets.iter().map(|s| s.unavailable.len()).sum()
    }

    pub fn family_count(&self) -> usize {
        self.sheets.iter().map(|s| s.families).sum()
    }
}

/// Errors that end a run
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error(transparent)]
    #[diagnostic(code(partpick::workbook))]
    Workbook(#[from] WorkbookError),

    #[error("sheet range {start}..{end} is invalid for a workbook with {count} sheet(s)")]
    #[diagnostic(
        code(partpick::sheet::range),
        help("sheet_start must be below sheet_end, and sheet_end at most the sheet count; sheet 0 is usually the info sheet")
    )]
    InvalidSheetRange {
        start: usize,
        end: usize,
        count: usize,
    },

    #[error("sheet {index} ('{name}') is malformed: {source}")]
    #[diagnostic(
        code(partpick::sheet::malformed),
        help("fix the sheet, or pass --skip-errors to leave it out of the export")
    )]
    MalformedSheet {
        index: usize,
        name: String,
        #[source]
        source: GroupError,
    },

    #[error("lookup source failed on sheet {index} ('{name}') while processing family '{family}': {source}")]
    #[diagnostic(
        code(partpick::lookup::fatal),
        help("records for sheets before this one were already exported")
    )]
    LookupFatal {
        index: usize,
        name: String,
        family: String,
        #[source]
        source: LookupError,
    },

    #[error(transparent)]
    #[diagnostic(code(partpick::export))]
    Export(#[from] ExportError),

    #[error("failed to close the lookup session: {0}")]
    #[diagnostic(code(partpick::lookup::close))]
    Close(#[source] LookupError),
}

/// Resolve the sheet range against the workbook's sheet count
pub fn sheet_range(options: &RunOptions, count: usize) -> Result<std::ops::Range<usize>, PipelineError> {
    let start = options.sheet_start;
    let end = options.sheet_end.unwrap_or(count);
    if start >= end || end > count {
        return Err(PipelineError::InvalidSheetRange { start, end, count });
    }
    Ok(start..end)
}

/// Run the selection over every sheet in range.
///
/// The session is closed on success and on every error path.
pub fn run<W, L, C>(
    options: &RunOptions,
    workbook: &mut W,
    mut session: LookupSession<L>,
    throttle: &mut Throttle<C>,
    progress: &mut dyn Progress,
) -> Result<RunSummary, PipelineError>
where
    W: Workbook + ?Sized,
    L: PartLookup,
    C: Clock,
{
    let started = Instant::now();
    let result = run_sheets(options, workbook, &mut *session, throttle, progress);

    match result {
        Ok(mut summary) => {
            session.close().map_err(PipelineError::Close)?;
            summary.elapsed = started.elapsed();
            Ok(summary)
        }
        Err(e) => {
            if let Err(close_err) = session.close() {
                tracing::warn!("failed to close lookup session after error: {close_err}");
            }
            Err(e)
        }
    }
}

fn run_sheets<W, L, C>(
    options: &RunOptions,
    workbook: &mut W,
    lookup: &mut L,
    throttle: &mut Throttle<C>,
    progress: &mut dyn Progress,
) -> Result<RunSummary, PipelineError>
where
    W: Workbook + ?Sized,
    L: PartLookup + ?Sized,
    C: Clock,
{
    let range = sheet_range(options, workbook.sheet_count())?;
    reset_outputs(&[options.output.as_path(), options.unavailable.as_path()])?;

    let mut summary = RunSummary {
        sheets: Vec::new(),
        skipped: Vec::new(),
        output: options.output.clone(),
        unavailable: options.unavailable.clone(),
        elapsed: Duration::ZERO,
    };

    for index in range {
        let sheet = workbook.read_sheet(index)?;
        tracing::info!(sheet = index, name = %sheet.name, "processing sheet");

        let groups = match group_sheet(&sheet) {
            Ok(groups) => groups,
            Err(source) if options.skip_errors => {
                tracing::info!(sheet = index, name = %sheet.name, "skipping malformed sheet: {source}");
                progress.sheet_skipped(index, &sheet.name, &source);
                summary.skipped.push((index, sheet.name.clone(), source));
                continue;
            }
            Err(source) => {
                return Err(PipelineError::MalformedSheet {
                    index,
                    name: sheet.name.clone(),
                    source,
                })
            }
        };

        progress.sheet_started(index, &sheet.name, groups.len());

        let selection = select_cheapest_with(&groups, lookup, throttle, |report| {
            progress.family_done(report)
        })
        .map_err(|e| PipelineError::LookupFatal {
            index,
            name: sheet.name.clone(),
            family: e.family,
            source: e.source,
        })?;

        append_records(&options.output, &selection.selected)?;
        append_records(&options.unavailable, &selection.unavailable)?;

        let sheet_summary = SheetSummary {
            index,
            name: sheet.name.clone(),
            families: groups.len(),
            selected: selection.selected,
            unavailable: selection.unavailable,
        };
        progress.sheet_done(&sheet_summary);
        summary.sheets.push(sheet_summary);
    }

    Ok(summary)
}
