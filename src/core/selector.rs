//! Cheapest in-stock part selection
//!
//! For every family the selector queries each candidate code, drops the ones
//! that are out of stock or short on quantity, and keeps the candidate with
//! the lowest unit price at the desired quantity. Families with no buyable
//! candidate produce a fixed "unavailable" record instead.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::core::grouping::{is_no_code, FamilyGroup};
use crate::core::lookup::{LookupError, LookupResult, PartLookup};
use crate::core::pricing::PriceQuote;
use crate::core::throttle::{Clock, Throttle};

/// Lookup code written for families with no buyable part
pub const UNAVAILABLE_CODE: &str = "N/A";

/// Unit price written for families with no buyable part
pub const UNAVAILABLE_PRICE: u32 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "In-Stock")]
    InStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockStatus::InStock => write!(f, "In-Stock"),
            StockStatus::OutOfStock => write!(f, "Out of Stock"),
        }
    }
}

/// One exported line. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionRecord {
    pub family: String,
    pub lookup_code: String,
    pub stock_status: StockStatus,
    pub stock_quantity: u64,
    pub unit_price: Decimal,
    pub desired_quantity: u64,
    pub rounded_purchase_quantity: u64,
}

impl SelectionRecord {
    /// Placeholder record for a family nothing could be bought for
    pub fn unavailable(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            lookup_code: UNAVAILABLE_CODE.to_string(),
            stock_status: StockStatus::OutOfStock,
            stock_quantity: 0,
            unit_price: Decimal::from(UNAVAILABLE_PRICE),
            desired_quantity: 0,
            rounded_purchase_quantity: 0,
        }
    }

    fn chosen(group: &FamilyGroup, candidate: &LookupResult, quote: PriceQuote) -> Self {
        Self {
            family: group.family.clone(),
            lookup_code: candidate.code.clone(),
            stock_status: StockStatus::InStock,
            stock_quantity: candidate.available_quantity,
            unit_price: quote.unit_price,
            desired_quantity: group.desired_quantity,
            rounded_purchase_quantity: quote.rounded_purchase_quantity,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.lookup_code == UNAVAILABLE_CODE && self.stock_status == StockStatus::OutOfStock
    }
}

/// What happened to one family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyOutcome {
    Selected(SelectionRecord),
    Unavailable(SelectionRecord),
    /// Desired quantity is zero; the family is not needed
    NotNeeded,
}

/// Everything learned while selecting a part for one family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyReport {
    pub family: String,
    pub desired_quantity: u64,
    /// Candidates that answered, in query order; eligible ones carry a quote
    pub candidates: Vec<LookupResult>,
    /// Sentinel codes that were not queried
    pub skipped_codes: Vec<String>,
    /// Recoverable lookup failures, one line per affected candidate
    pub failures: Vec<String>,
    pub outcome: FamilyOutcome,
}

impl FamilyReport {
    fn new(group: &FamilyGroup) -> Self {
        Self {
            family: group.family.clone(),
            desired_quantity: group.desired_quantity,
            candidates: Vec::new(),
            skipped_codes: Vec::new(),
            failures: Vec::new(),
            outcome: FamilyOutcome::NotNeeded,
        }
    }
}

/// Result of selecting over a list of families
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub selected: Vec<SelectionRecord>,
    pub unavailable: Vec<SelectionRecord>,
    pub reports: Vec<FamilyReport>,
}

/// A lookup failure that stops the run, tagged with the family in progress
#[derive(Debug, Error)]
#[error("family '{family}': {source}")]
pub struct SelectionError {
    pub family: String,
    #[source]
    pub source: LookupError,
}

/// Index of the cheapest quoted candidate; ties go to the earliest
fn cheapest(candidates: &[LookupResult]) -> Option<usize> {
    let mut best: Option<(usize, Decimal)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        if let Some(price) = candidate.unit_price_at_quantity() {
            if best.map_or(true, |(_, lowest)| price < lowest) {
                best = Some((i, price));
            }
        }
    }
    best.map(|(i, _)| i)
}

/// Pick the cheapest eligible part for one family.
///
/// Only fatal lookup errors are returned; everything else ends up in the
/// report.
pub fn select_family<L, C>(
    group: &FamilyGroup,
    lookup: &mut L,
    throttle: &mut Throttle<C>,
) -> Result<FamilyReport, LookupError>
where
    L: PartLookup + ?Sized,
    C: Clock,
{
    let mut report = FamilyReport::new(group);
    let desired = group.desired_quantity;

    if desired == 0 {
        tracing::debug!(family = %group.family, "desired quantity is 0, skipping");
        return Ok(report);
    }

    for code in &group.candidate_codes {
        if is_no_code(code) {
            report.skipped_codes.push(code.clone());
            continue;
        }

        throttle.wait();
        let mut candidate = match lookup.query(code) {
            Ok(result) => result,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::debug!(family = %group.family, code = %code, "{e}");
                report.failures.push(e.to_string());
                continue;
            }
        };

        if !candidate.is_eligible_for(desired) {
            tracing::debug!(
                family = %group.family,
                code = %code,
                in_stock = candidate.in_stock,
                available = candidate.available_quantity,
                desired,
                "candidate not eligible"
            );
            report.candidates.push(candidate);
            continue;
        }

        match lookup.quote_price(code, desired) {
            Ok(quote) => {
                tracing::debug!(
                    family = %group.family,
                    code = %code,
                    unit_price = %quote.unit_price,
                    rounded = quote.rounded_purchase_quantity,
                    "candidate quoted"
                );
                candidate.quote = Some(quote);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::debug!(family = %group.family, code = %code, "{e}");
                report.failures.push(e.to_string());
            }
        }
        report.candidates.push(candidate);
    }

    let winner = cheapest(&report.candidates).and_then(|i| {
        let candidate = &report.candidates[i];
        candidate
            .quote
            .map(|quote| SelectionRecord::chosen(group, candidate, quote))
    });

    report.outcome = match winner {
        Some(record) => FamilyOutcome::Selected(record),
        None => FamilyOutcome::Unavailable(SelectionRecord::unavailable(&group.family)),
    };

    Ok(report)
}

/// Select over every family, calling `on_family` as each one finishes
pub fn select_cheapest_with<L, C, F>(
    groups: &[FamilyGroup],
    lookup: &mut L,
    throttle: &mut Throttle<C>,
    mut on_family: F,
) -> Result<Selection, SelectionError>
where
    L: PartLookup + ?Sized,
    C: Clock,
    F: FnMut(&FamilyReport),
{
    let mut selection = Selection::default();

    for group in groups {
        let report = select_family(group, lookup, throttle).map_err(|source| SelectionError {
            family: group.family.clone(),
            source,
        })?;

        match &report.outcome {
            FamilyOutcome::Selected(record) => selection.selected.push(record.clone()),
            FamilyOutcome::Unavailable(record) => selection.unavailable.push(record.clone()),
            FamilyOutcome::NotNeeded => {}
        }

        on_family(&report);
        selection.reports.push(report);
    }

    Ok(selection)
}

/// Select the cheapest eligible part for every family
pub fn select_cheapest<L, C>(
    groups: &[FamilyGroup],
    lookup: &mut L,
    throttle: &mut Throttle<C>,
) -> Result<Selection, SelectionError>
where
    L: PartLookup + ?Sized,
    C: Clock,
{
    select_cheapest_with(groups, lookup, throttle, |_| {})
}
