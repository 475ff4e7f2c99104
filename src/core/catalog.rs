//! Offline part catalog
//!
//! A YAML file standing in for the live supplier, for dry runs and tests:
//!
//! ```yaml
//! parts:
//!   C2040:
//!     stock: 48213
//!     pricing:
//!       breaks:
//!         - { min_qty: 1, unit_price: "0.85" }
//!         - { min_qty: 10, unit_price: "0.78" }
//!   C8056:
//!     stock: 0
//! ```
//!
//! Codes match case-insensitively. A code missing from the file is reported
//! as a transient lookup failure, like a product the live catalog cannot find.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::lookup::{LookupError, LookupResult, PartLookup};
use crate::core::pricing::{PriceLadder, PriceQuote};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Stock and pricing for one code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub stock: u64,

    /// Defaults to `stock > 0`
    #[serde(default)]
    pub in_stock: Option<bool>,

    #[serde(default)]
    pub pricing: PriceLadder,
}

impl CatalogEntry {
    fn is_in_stock(&self) -> bool {
        self.in_stock.unwrap_or(self.stock > 0)
    }
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    parts: BTreeMap<String, CatalogEntry>,
}

/// Part lookup answering from an in-memory table
#[derive(Debug, Clone, Default)]
pub struct CatalogLookup {
    name: String,
    entries: HashMap<String, CatalogEntry>,
}

impl CatalogLookup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Load a catalog from a YAML file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&path.display().to_string(), &contents).map_err(|message| {
            CatalogError::Parse {
                path: path.to_path_buf(),
                message,
            }
        })
    }

    /// Parse catalog YAML; the error is the parser's message
    pub fn from_yaml(name: &str, contents: &str) -> Result<Self, String> {
        let file: CatalogFile = if contents.trim().is_empty() {
            CatalogFile::default()
        } else {
            serde_yml::from_str(contents).map_err(|e| e.to_string())?
        };

        let mut catalog = Self::new(name);
        for (code, entry) in file.parts {
            catalog.insert(&code, entry);
        }
        Ok(catalog)
    }

    fn insert(&mut self, code: &str, entry: CatalogEntry) {
        self.entries.insert(code.trim().to_uppercase(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, code: &str) -> Result<&CatalogEntry, LookupError> {
        self.entries
            .get(&code.trim().to_uppercase())
            .ok_or_else(|| LookupError::transient(code, "not in catalog"))
    }
}

impl PartLookup for CatalogLookup {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn query(&mut self, code: &str) -> Result<LookupResult, LookupError> {
        let entry = self.entry(code)?;
        Ok(if entry.is_in_stock() {
            LookupResult::in_stock(code, entry.stock)
        } else {
            LookupResult::out_of_stock(code)
        })
    }

    fn quote_price(&mut self, code: &str, quantity: u64) -> Result<PriceQuote, LookupError> {
        self.entry(code)?
            .pricing
            .quote(quantity)
            .ok_or_else(|| LookupError::NoQuote {
                code: code.to_string(),
                quantity,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const CATALOG: &str = r#"
parts:
  C2040:
    stock: 48213
    pricing:
      min_order: 5
      breaks:
        - { min_qty: 1, unit_price: "0.85" }
        - { min_qty: 10, unit_price: "0.78" }
  c8056:
    stock: 0
  C1591:
    stock: 100
    in_stock: false
"#;

    #[test]
    fn test_parse_and_query() {
        let mut catalog = CatalogLookup::from_yaml("test", CATALOG).unwrap();
        assert_eq!(catalog.len(), 3);

        let hit = catalog.query("c2040").unwrap();
        assert!(hit.in_stock);
        assert_eq!(hit.available_quantity, 48213);
        assert_eq!(hit.code, "c2040");

        assert!(!catalog.query("C8056").unwrap().in_stock);
        assert!(!catalog.query("C1591").unwrap().in_stock);
    }

    #[test]
    fn test_quote() {
        let mut catalog = CatalogLookup::from_yaml("test", CATALOG).unwrap();

        let quote = catalog.quote_price("C2040", 2).unwrap();
        assert_eq!(quote.rounded_purchase_quantity, 5);
        assert_eq!(quote.unit_price, Decimal::from_str("0.85").unwrap());

        let quote = catalog.quote_price("C2040", 12).unwrap();
        assert_eq!(quote.unit_price, Decimal::from_str("0.78").unwrap());

        assert!(matches!(
            catalog.quote_price("C8056", 1),
            Err(LookupError::NoQuote { .. })
        ));
    }

    #[test]
    fn test_unknown_code_is_transient() {
        let mut catalog = CatalogLookup::new("empty");
        let err = catalog.query("C404").unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(CatalogLookup::from_yaml("bad", "parts: [1, 2").is_err());
        assert!(CatalogLookup::from_yaml("empty", "").unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = CatalogLookup::load(Path::new("no-such-catalog.yaml")).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
