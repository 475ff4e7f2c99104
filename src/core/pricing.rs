//! Quantity price breaks and purchase rounding

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn one() -> u64 {
    1
}

/// Unit price that applies from `min_qty` units upward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreak {
    pub min_qty: u64,
    pub unit_price: Decimal,
}

impl PriceBreak {
    pub fn new(min_qty: u64, unit_price: Decimal) -> Self {
        Self { min_qty, unit_price }
    }
}

/// Price quoted for buying at least a given quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    /// Quantity actually purchased after rounding to what the supplier sells
    pub rounded_purchase_quantity: u64,
    pub unit_price: Decimal,
}

/// A supplier's price breaks together with its ordering rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLadder {
    #[serde(default)]
    pub breaks: Vec<PriceBreak>,

    /// Smallest quantity the supplier accepts
    #[serde(default = "one")]
    pub min_order: u64,

    /// Orders must be a multiple of this quantity
    #[serde(default = "one")]
    pub order_multiple: u64,

    /// Largest quantity accepted in one order, if limited
    #[serde(default)]
    pub max_order: Option<u64>,
}

impl Default for PriceLadder {
    fn default() -> Self {
        Self {
            breaks: Vec::new(),
            min_order: 1,
            order_multiple: 1,
            max_order: None,
        }
    }
}

impl PriceLadder {
    pub fn new(breaks: Vec<PriceBreak>) -> Self {
        Self {
            breaks,
            ..Self::default()
        }
    }

    pub fn with_min_order(mut self, min_order: u64) -> Self {
        self.min_order = min_order;
        self
    }

    pub fn with_order_multiple(mut self, order_multiple: u64) -> Self {
        self.order_multiple = order_multiple;
        self
    }

    pub fn with_max_order(mut self, max_order: Option<u64>) -> Self {
        self.max_order = max_order;
        self
    }

    /// Round a wanted quantity up to the nearest quantity the supplier sells
    pub fn round_quantity(&self, quantity: u64) -> u64 {
        let multiple = self.order_multiple.max(1);
        let rounded = quantity.div_ceil(multiple).saturating_mul(multiple);
        rounded.max(self.min_order)
    }

    /// Quote the unit price for buying at least `quantity` units.
    ///
    /// The price comes from the highest break reached by the rounded quantity.
    /// If the rounded quantity is below every break, the lowest break applies.
    /// Returns `None` when there are no breaks or the order would exceed the
    /// supplier's maximum.
    pub fn quote(&self, quantity: u64) -> Option<PriceQuote> {
        let rounded = self.round_quantity(quantity);
        if self.max_order.is_some_and(|max| rounded > max) {
            return None;
        }

        let applicable = self
            .breaks
            .iter()
            .filter(|b| b.min_qty <= rounded)
            .max_by_key(|b| b.min_qty)
            .or_else(|| self.breaks.iter().min_by_key(|b| b.min_qty))?;

        Some(PriceQuote {
            rounded_purchase_quantity: rounded,
            unit_price: applicable.unit_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ladder() -> PriceLadder {
        PriceLadder::new(vec![
            PriceBreak::new(10, dec("0.0120")),
            PriceBreak::new(100, dec("0.0085")),
            PriceBreak::new(1000, dec("0.0052")),
        ])
    }

    #[test]
    fn test_round_quantity() {
        let ladder = ladder().with_min_order(10).with_order_multiple(5);
        assert_eq!(ladder.round_quantity(1), 10);
        assert_eq!(ladder.round_quantity(10), 10);
        assert_eq!(ladder.round_quantity(11), 15);
        assert_eq!(ladder.round_quantity(0), 10);

        assert_eq!(PriceLadder::default().round_quantity(7), 7);
    }

    #[test]
    fn test_quote_uses_highest_reached_break() {
        let ladder = ladder();
        assert_eq!(ladder.quote(10).unwrap().unit_price, dec("0.0120"));
        assert_eq!(ladder.quote(99).unwrap().unit_price, dec("0.0120"));
        assert_eq!(ladder.quote(100).unwrap().unit_price, dec("0.0085"));
        assert_eq!(ladder.quote(5000).unwrap().unit_price, dec("0.0052"));
    }

    #[test]
    fn test_quote_below_first_break_uses_lowest() {
        let quote = ladder().quote(3).unwrap();
        assert_eq!(quote.rounded_purchase_quantity, 3);
        assert_eq!(quote.unit_price, dec("0.0120"));
    }

    #[test]
    fn test_quote_rounding_moves_into_next_break() {
        // 95 rounds up to 100 and gets the 100+ price
        let ladder = ladder().with_order_multiple(50);
        let quote = ladder.quote(95).unwrap();
        assert_eq!(quote.rounded_purchase_quantity, 100);
        assert_eq!(quote.unit_price, dec("0.0085"));
    }

    #[test]
    fn test_quote_unsorted_breaks() {
        let ladder = PriceLadder::new(vec![
            PriceBreak::new(500, dec("1.10")),
            PriceBreak::new(1, dec("1.50")),
            PriceBreak::new(50, dec("1.25")),
        ]);
        assert_eq!(ladder.quote(60).unwrap().unit_price, dec("1.25"));
    }

    #[test]
    fn test_no_quote() {
        assert!(PriceLadder::default().quote(1).is_none());
        assert!(ladder().with_max_order(Some(500)).quote(501).is_none());
        assert!(ladder().with_max_order(Some(500)).quote(500).is_some());
    }
}
