//! Part lookup interface
//!
//! A [`PartLookup`] is a single stateful session against a supplier catalog.
//! Calls are sequential and take `&mut self`; nothing here is meant to be
//! shared between threads. [`LookupSession`] owns a lookup for the length of
//! a run and makes sure it is closed on every exit path.

use rust_decimal::Decimal;
use serde::Serialize;
use std::ops::{Deref, DerefMut};
use thiserror::Error;

use crate::core::pricing::PriceQuote;

/// Stock information for one candidate code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupResult {
    pub code: String,
    pub in_stock: bool,
    pub available_quantity: u64,
    /// Price quote at the desired quantity; only present for eligible candidates
    pub quote: Option<PriceQuote>,
}

impl LookupResult {
    pub fn in_stock(code: impl Into<String>, available_quantity: u64) -> Self {
        Self {
            code: code.into(),
            in_stock: true,
            available_quantity,
            quote: None,
        }
    }

    pub fn out_of_stock(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            in_stock: false,
            available_quantity: 0,
            quote: None,
        }
    }

    /// A candidate can be bought iff it is in stock with enough units
    pub fn is_eligible_for(&self, desired_quantity: u64) -> bool {
        self.in_stock && self.available_quantity >= desired_quantity
    }

    pub fn unit_price_at_quantity(&self) -> Option<Decimal> {
        self.quote.map(|q| q.unit_price)
    }
}

/// Errors from a part lookup source
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// One query failed; the candidate is skipped and the run continues
    #[error("lookup of '{code}' failed: {message}")]
    Transient { code: String, message: String },

    /// The source has no price for this quantity
    #[error("no price quote for '{code}' at quantity {quantity}")]
    NoQuote { code: String, quantity: u64 },

    /// The source as a whole is unusable; the run must stop
    #[error("part lookup source unavailable: {message}")]
    Fatal { message: String },
}

impl LookupError {
    pub fn transient(code: impl Into<String>, message: impl Into<String>) -> Self {
        LookupError::Transient {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        LookupError::Fatal {
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, LookupError::Fatal { .. })
    }
}

/// A supplier catalog session
pub trait PartLookup {
    /// Short name of the source for log lines
    fn source_name(&self) -> &str;

    /// Resolve stock status and available quantity for a code.
    ///
    /// The returned result carries no quote.
    fn query(&mut self, code: &str) -> Result<LookupResult, LookupError>;

    /// Quote a unit price for buying at least `quantity` units of a code
    /// that was just found to be in stock.
    ///
    /// Callers pace `query` only, so implementations must not reach the
    /// supplier again here.
    fn quote_price(&mut self, code: &str, quantity: u64) -> Result<PriceQuote, LookupError>;

    /// Release the session. Calling it twice is harmless.
    fn close(&mut self) -> Result<(), LookupError> {
        Ok(())
    }
}

impl<L: PartLookup + ?Sized> PartLookup for Box<L> {
    fn source_name(&self) -> &str {
        (**self).source_name()
    }

    fn query(&mut self, code: &str) -> Result<LookupResult, LookupError> {
        (**self).query(code)
    }

    fn quote_price(&mut self, code: &str, quantity: u64) -> Result<PriceQuote, LookupError> {
        (**self).quote_price(code, quantity)
    }

    fn close(&mut self) -> Result<(), LookupError> {
        (**self).close()
    }
}

/// Owns a lookup for one run and closes it when the run ends.
///
/// Prefer [`LookupSession::close`] to observe close errors; dropping an open
/// session closes it and only logs a failure.
pub struct LookupSession<L: PartLookup> {
    inner: L,
    closed: bool,
}

impl<L: PartLookup> LookupSession<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    pub fn close(mut self) -> Result<(), LookupError> {
        self.closed = true;
        self.inner.close()
    }
}

impl<L: PartLookup> Deref for LookupSession<L> {
    type Target = L;

    fn deref(&self) -> &L {
        &self.inner
    }
}

impl<L: PartLookup> DerefMut for LookupSession<L> {
    fn deref_mut(&mut self) -> &mut L {
        &mut self.inner
    }
}

impl<L: PartLookup> Drop for LookupSession<L> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.inner.close() {
            tracing::warn!(source = self.inner.source_name(), "failed to close lookup session: {e}");
        }
    }
}
