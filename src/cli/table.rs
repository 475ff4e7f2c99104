//! Table formatting utilities for CLI list commands
//!
//! Commands describe their rows as typed cells once and the formatter renders
//! them as aligned console columns, plain TSV for piping, or Markdown.

use console::style;
use rust_decimal::Decimal;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_tsv, format_price, truncate_str};
use crate::cli::OutputFormat;
use crate::core::StockStatus;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Supplier lookup code (cyan)
    Code(String),
    /// Plain text, truncated to the column width on the console
    Text(String),
    /// Stock status with color coding
    Status(StockStatus),
    Number(u64),
    Price(Decimal),
    /// Several codes shown as a comma-separated list
    Codes(Vec<String>),
    Empty,
}

impl CellValue {
    /// Raw string value, no styling
    pub fn raw(&self) -> String {
        match self {
            CellValue::Code(s) | CellValue::Text(s) => s.clone(),
            CellValue::Status(status) => status.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Price(p) => format_price(*p),
            CellValue::Codes(codes) => codes.join(", "),
            CellValue::Empty => String::new(),
        }
    }

    /// Format for aligned console output (with colors if terminal)
    pub fn format_console(&self, width: usize) -> String {
        match self {
            CellValue::Code(code) => format!("{:<width$}", style(code).cyan(), width = width),
            CellValue::Text(_) | CellValue::Codes(_) => {
                let truncated = truncate_str(&self.raw(), width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Status(status) => {
                let s = status.to_string();
                let styled = match status {
                    StockStatus::InStock => style(s).green(),
                    StockStatus::OutOfStock => style(s).red(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Number(_) | CellValue::Price(_) => {
                format!("{:>width$}", self.raw(), width = width)
            }
            CellValue::Empty => format!("{:<width$}", style("-").dim(), width = width),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        match self {
            CellValue::Empty => "-".to_string(),
            _ => self.raw().replace('|', "\\|"),
        }
    }

    /// Display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Empty => 1,
            _ => self.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
#[derive(Debug, Clone, Default)]
pub struct TableRow {
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    item_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], item_name: &'static str) -> Self {
        Self {
            columns,
            item_name,
            show_summary: true,
        }
    }

    /// Leave off the "N item(s) found" line
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Render rows in the given format. JSON is left to the caller.
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Tsv => self.render_tsv(rows),
            OutputFormat::Md => self.render_md(rows),
            OutputFormat::Auto | OutputFormat::Json => self.render_console(rows),
        }
    }

    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        print!("{}", self.render(rows, format));
    }

    fn cell_or_empty<'r>(row: &'r TableRow, key: &str) -> &'r CellValue {
        row.get(key).unwrap_or(&CellValue::Empty)
    }

    /// Calculate column widths from content, capped at each column's width
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let max_content = rows
                    .iter()
                    .map(|r| Self::cell_or_empty(r, col.key).display_width())
                    .max()
                    .unwrap_or(0);
                col.header
                    .len()
                    .max(max_content.saturating_add(2))
                    .min(col.width)
            })
            .collect()
    }

    fn render_console(&self, rows: &[TableRow]) -> String {
        let widths = self.calculate_widths(rows);
        let mut out = String::new();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = w))
            .collect();
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            let parts: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| Self::cell_or_empty(row, col.key).format_console(*w))
                .collect();
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }

        if self.show_summary {
            out.push('\n');
            out.push_str(&format!(
                "{} {}(s) found.\n",
                style(rows.len()).cyan(),
                self.item_name
            ));
        }
        out
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let header: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        out.push_str(&header.join("\t"));
        out.push('\n');
        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| escape_tsv(&Self::cell_or_empty(row, col.key).raw()))
                .collect();
            out.push_str(&values.join("\t"));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|c| c.header.to_string()));
        for row in rows {
            builder.push_record(
                self.columns
                    .iter()
                    .map(|col| Self::cell_or_empty(row, col.key).format_md()),
            );
        }
        let mut table = builder.build();
        table.with(Style::markdown());
        format!("{}\n", table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("code", "CODE", 12),
        ColumnDef::new("status", "STATUS", 14),
        ColumnDef::new("price", "PRICE", 10),
    ];

    fn sample_rows() -> Vec<TableRow> {
        vec![
            TableRow::new()
                .cell("code", CellValue::Code("C100".to_string()))
                .cell("status", CellValue::Status(StockStatus::InStock))
                .cell("price", CellValue::Price(Decimal::from_str("0.120").unwrap())),
            TableRow::new()
                .cell("code", CellValue::Code("C200".to_string()))
                .cell("status", CellValue::Status(StockStatus::OutOfStock)),
        ]
    }

    #[test]
    fn test_cell_value_raw() {
        assert_eq!(CellValue::Status(StockStatus::OutOfStock).raw(), "Out of Stock");
        assert_eq!(CellValue::Number(42).raw(), "42");
        assert_eq!(
            CellValue::Codes(vec!["C1".to_string(), "C2".to_string()]).raw(),
            "C1, C2"
        );
        assert_eq!(CellValue::Empty.raw(), "");
    }

    #[test]
    fn test_cell_value_md_escapes_pipes() {
        let cell = CellValue::Text("a|b".to_string());
        assert_eq!(cell.format_md(), "a\\|b");
        assert_eq!(CellValue::Empty.format_md(), "-");
    }

    #[test]
    fn test_table_row_builder() {
        let row = TableRow::new().cell("code", CellValue::Code("C1".to_string()));
        assert!(row.get("code").is_some());
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_render_tsv_is_plain() {
        let out = TableFormatter::new(COLUMNS, "part").render(&sample_rows(), OutputFormat::Tsv);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "code\tstatus\tprice");
        assert_eq!(lines[1], "C100\tIn-Stock\t0.12");
        assert_eq!(lines[2], "C200\tOut of Stock\t");
    }

    #[test]
    fn test_render_md_has_header_and_rows() {
        let out = TableFormatter::new(COLUMNS, "part").render(&sample_rows(), OutputFormat::Md);
        assert!(out.contains("CODE"));
        assert!(out.contains("C100"));
        assert!(out.contains("Out of Stock"));
        assert!(out.contains("|"));
    }

    #[test]
    fn test_render_console_summary() {
        let out = TableFormatter::new(COLUMNS, "part").render(&sample_rows(), OutputFormat::Auto);
        assert!(out.contains("part(s) found"));

        let bare = TableFormatter::new(COLUMNS, "part")
            .without_summary()
            .render(&sample_rows(), OutputFormat::Auto);
        assert!(!bare.contains("found"));
    }
}
