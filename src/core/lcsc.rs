//! LCSC catalog client
//!
//! Queries the LCSC product-detail endpoint over HTTP. One query returns the
//! stock level and the full price ladder of a product, so the ladder of the
//! most recent product is kept and quoting that product needs no second
//! request.
//!
//! Failure classification:
//! - failing to build the HTTP client, HTTP 401/403, or too many consecutive
//!   connection failures mean the source is unusable (fatal);
//! - any other failure only affects the code being looked up (transient).

use reqwest::blocking::Client;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::core::config::LcscSettings;
use crate::core::lookup::{LookupError, LookupResult, PartLookup};
use crate::core::pricing::{PriceBreak, PriceLadder, PriceQuote};

const DETAIL_PATH: &str = "/ftps/wm/product/detail";

#[derive(Debug, Deserialize)]
struct DetailResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    result: Option<ProductDetail>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDetail {
    #[serde(default)]
    product_code: Option<String>,
    #[serde(default)]
    stock_number: Option<i64>,
    #[serde(default)]
    min_buy_number: Option<i64>,
    /// -1 when unlimited
    #[serde(default)]
    max_buy_number: Option<i64>,
    #[serde(default)]
    min_packet_number: Option<i64>,
    #[serde(default)]
    product_price_list: Option<Vec<LadderPrice>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LadderPrice {
    ladder: u64,
    #[serde(alias = "usdPrice")]
    product_price: Decimal,
}

fn positive(value: Option<i64>) -> Option<u64> {
    value.filter(|v| *v > 0).map(|v| v as u64)
}

impl ProductDetail {
    fn stock(&self, code: &str) -> LookupResult {
        match positive(self.stock_number) {
            Some(available) => LookupResult::in_stock(code, available),
            None => LookupResult::out_of_stock(code),
        }
    }

    fn ladder(&self) -> PriceLadder {
        let breaks = self
            .product_price_list
            .iter()
            .flatten()
            .map(|p| PriceBreak::new(p.ladder, p.product_price))
            .collect();

        PriceLadder::new(breaks)
            .with_min_order(positive(self.min_buy_number).unwrap_or(1))
            .with_order_multiple(positive(self.min_packet_number).unwrap_or(1))
            .with_max_order(positive(self.max_buy_number))
    }
}

/// Live LCSC catalog session
pub struct LcscLookup {
    client: Client,
    base_url: String,
    max_consecutive_failures: u32,
    consecutive_failures: u32,
    /// Price ladder of the last product queried
    last: Option<(String, PriceLadder)>,
    closed: bool,
}

impl LcscLookup {
    /// Open a session; failure to set up the HTTP client is fatal
    pub fn connect(settings: &LcscSettings) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent())
            .build()
            .map_err(|e| LookupError::fatal(format!("could not start HTTP session: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url().trim_end_matches('/').to_string(),
            max_consecutive_failures: settings.max_consecutive_failures(),
            consecutive_failures: 0,
            last: None,
            closed: false,
        })
    }

    fn connection_failure(&mut self, code: &str, error: reqwest::Error) -> LookupError {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.max_consecutive_failures {
            LookupError::fatal(format!(
                "{} consecutive request failures, last for '{code}': {error}",
                self.consecutive_failures
            ))
        } else {
            LookupError::transient(code, error.to_string())
        }
    }

    fn fetch(&mut self, code: &str) -> Result<ProductDetail, LookupError> {
        if self.closed {
            return Err(LookupError::fatal("session already closed"));
        }

        let url = format!("{}{}", self.base_url, DETAIL_PATH);
        tracing::debug!(%url, code, "requesting product detail");

        let response = match self.client.get(&url).query(&[("productCode", code)]).send() {
            Ok(response) => response,
            Err(e) => return Err(self.connection_failure(code, e)),
        };
        self.consecutive_failures = 0;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LookupError::fatal(format!("catalog refused access (HTTP {status})")));
        }
        if !status.is_success() {
            return Err(LookupError::transient(code, format!("HTTP {status}")));
        }

        let body: DetailResponse = response
            .json()
            .map_err(|e| LookupError::transient(code, format!("unreadable response: {e}")))?;
        parse_detail(code, body)
    }

    fn cached_ladder(&self, code: &str) -> Option<PriceLadder> {
        self.last
            .as_ref()
            .filter(|(cached, _)| cached.eq_ignore_ascii_case(code))
            .map(|(_, ladder)| ladder.clone())
    }
}

fn parse_detail(code: &str, body: DetailResponse) -> Result<ProductDetail, LookupError> {
    if body.code != 200 {
        let message = body.msg.unwrap_or_else(|| format!("catalog answered code {}", body.code));
        return Err(LookupError::transient(code, message));
    }

    let detail = body
        .result
        .ok_or_else(|| LookupError::transient(code, "product not found"))?;

    if let Some(found) = &detail.product_code {
        if !found.eq_ignore_ascii_case(code) {
            return Err(LookupError::transient(
                code,
                format!("catalog returned a different product ({found})"),
            ));
        }
    }

    Ok(detail)
}

impl PartLookup for LcscLookup {
    fn source_name(&self) -> &str {
        "lcsc"
    }

    fn query(&mut self, code: &str) -> Result<LookupResult, LookupError> {
        let detail = self.fetch(code)?;
        self.last = Some((code.to_string(), detail.ladder()));
        Ok(detail.stock(code))
    }

    /// Quotes from the ladder of the last query; a code that was not just
    /// queried is refused without a request, so every request stays paced by
    /// the caller's throttle.
    fn quote_price(&mut self, code: &str, quantity: u64) -> Result<PriceQuote, LookupError> {
        let ladder = self
            .cached_ladder(code)
            .ok_or_else(|| LookupError::transient(code, "quote requested before a query"))?;

        ladder.quote(quantity).ok_or_else(|| LookupError::NoQuote {
            code: code.to_string(),
            quantity,
        })
    }

    fn close(&mut self) -> Result<(), LookupError> {
        self.closed = true;
        self.last = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const SAMPLE: &str = r#"{
        "code": 200,
        "msg": null,
        "result": {
            "productCode": "C2040",
            "productModel": "RP2040",
            "stockNumber": 48213,
            "minBuyNumber": 1,
            "maxBuyNumber": -1,
            "minPacketNumber": 1,
            "productPriceList": [
                {"ladder": 1, "productPrice": 0.8532},
                {"ladder": 10, "productPrice": "0.7761"},
                {"ladder": 50, "usdPrice": 0.7311}
            ]
        }
    }"#;

    fn sample() -> DetailResponse {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_detail_stock_and_ladder() {
        let detail = parse_detail("C2040", sample()).unwrap();

        let stock = detail.stock("C2040");
        assert!(stock.in_stock);
        assert_eq!(stock.available_quantity, 48213);

        let ladder = detail.ladder();
        assert_eq!(ladder.breaks.len(), 3);
        assert_eq!(ladder.max_order, None);
        let quote = ladder.quote(20).unwrap();
        assert_eq!(quote.rounded_purchase_quantity, 20);
        assert_eq!(quote.unit_price, Decimal::from_str("0.7761").unwrap());
    }

    #[test]
    fn test_zero_stock_is_out_of_stock() {
        let body: DetailResponse = serde_json::from_str(
            r#"{"code": 200, "result": {"productCode": "C1", "stockNumber": 0}}"#,
        )
        .unwrap();
        let detail = parse_detail("C1", body).unwrap();
        assert!(!detail.stock("C1").in_stock);
        assert!(detail.ladder().quote(1).is_none());
    }

    #[test]
    fn test_error_code_is_transient() {
        let body: DetailResponse =
            serde_json::from_str(r#"{"code": 404, "msg": "product missing", "result": null}"#).unwrap();
        let err = parse_detail("C404", body).unwrap_err();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("product missing"));
    }

    #[test]
    fn test_other_product_is_transient() {
        let err = parse_detail("C9999", sample()).unwrap_err();
        assert!(matches!(err, LookupError::Transient { .. }));
    }

    #[test]
    fn test_packet_rounding_and_max_order() {
        let body: DetailResponse = serde_json::from_str(
            r#"{"code": 200, "result": {
                "productCode": "C25804", "stockNumber": 900000,
                "minBuyNumber": 100, "maxBuyNumber": 5000, "minPacketNumber": 100,
                "productPriceList": [{"ladder": 100, "productPrice": "0.0011"}]
            }}"#,
        )
        .unwrap();
        let ladder = parse_detail("c25804", body).unwrap().ladder();
        assert_eq!(ladder.quote(20).unwrap().rounded_purchase_quantity, 100);
        assert_eq!(ladder.quote(250).unwrap().rounded_purchase_quantity, 300);
        assert!(ladder.quote(6000).is_none());
    }

    #[test]
    fn test_unreachable_source_becomes_fatal() {
        // Nothing listens on the discard port; connections are refused
        let settings = LcscSettings {
            base_url: Some("http://127.0.0.1:9".to_string()),
            timeout_secs: Some(2),
            user_agent: None,
            max_consecutive_failures: Some(2),
        };
        let mut lookup = LcscLookup::connect(&settings).unwrap();

        let first = lookup.query("C1").unwrap_err();
        assert!(!first.is_fatal());
        let second = lookup.query("C2").unwrap_err();
        assert!(second.is_fatal());
    }

    #[test]
    fn test_quote_without_query_sends_no_request() {
        let settings = LcscSettings {
            base_url: Some("http://127.0.0.1:9".to_string()),
            timeout_secs: Some(2),
            user_agent: None,
            max_consecutive_failures: Some(1),
        };
        let mut lookup = LcscLookup::connect(&settings).unwrap();

        let err = lookup.quote_price("C2040", 10).unwrap_err();
        assert!(matches!(err, LookupError::Transient { .. }));
        assert!(err.to_string().contains("before a query"));
        assert_eq!(lookup.consecutive_failures, 0);
    }

    #[test]
    fn test_quote_uses_ladder_of_last_query() {
        let mut lookup = LcscLookup::connect(&LcscSettings::default()).unwrap();
        let detail = parse_detail("C2040", sample()).unwrap();
        lookup.last = Some(("C2040".to_string(), detail.ladder()));

        let quote = lookup.quote_price("c2040", 10).unwrap();
        assert_eq!(quote.unit_price, Decimal::from_str("0.7761").unwrap());
        assert!(lookup.quote_price("C1", 10).is_err());
    }

    #[test]
    fn test_closed_session_refuses_queries() {
        let mut lookup = LcscLookup::connect(&LcscSettings::default()).unwrap();
        lookup.close().unwrap();
        assert!(lookup.query("C2040").unwrap_err().is_fatal());
    }
}
