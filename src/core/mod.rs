//! Core module - selection pipeline and its collaborators

pub mod catalog;
pub mod config;
pub mod export;
pub mod grouping;
pub mod lcsc;
pub mod lookup;
pub mod pipeline;
pub mod pricing;
pub mod selector;
pub mod throttle;
pub mod workbook;

pub use catalog::{CatalogEntry, CatalogError, CatalogLookup};
pub use config::{Config, ConfigError, LcscSettings};
pub use export::{append_records, reset_outputs, ExportError, EXPORT_COLUMNS};
pub use grouping::{group, group_sheet, FamilyGroup, GroupError, Row};
pub use lcsc::LcscLookup;
pub use lookup::{LookupError, LookupResult, LookupSession, PartLookup};
pub use pipeline::{NullProgress, PipelineError, Progress, RunOptions, RunSummary, SheetSummary};
pub use pricing::{PriceBreak, PriceLadder, PriceQuote};
pub use selector::{
    select_cheapest, select_cheapest_with, select_family, FamilyOutcome, FamilyReport, Selection,
    SelectionError, SelectionRecord, StockStatus,
};
pub use throttle::{Clock, ManualClock, SystemClock, Throttle};
pub use workbook::{Cell, ExcelWorkbook, MemoryWorkbook, SheetTable, Workbook, WorkbookError};
