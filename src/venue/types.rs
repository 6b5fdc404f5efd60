//! Venue payloads and per-venue quote results.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Outcome of a single quote fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuoteStatus {
    /// Venue reported a usable price.
    Success,
    /// Venue failed, timed out or returned garbage.
    Error,
}

/// Result of asking one venue for a price.
#[derive(Debug, Clone, PartialEq)]
pub struct VenueQuote {
    /// Venue identifier.
    pub venue_id: String,
    /// Last traded price; present only on success.
    pub price: Option<Decimal>,
    /// Fetch outcome.
    pub status: QuoteStatus,
    /// Time spent waiting on the venue.
    pub latency_ms: u64,
    /// Failure reason, for logs and the scan report.
    pub error: Option<String>,
}

impl VenueQuote {
    /// Successful quote.
    pub fn success(venue_id: impl Into<String>, price: Decimal, latency_ms: u64) -> Self {
        Self {
            venue_id: venue_id.into(),
            price: Some(price),
            status: QuoteStatus::Success,
            latency_ms,
            error: None,
        }
    }

    /// Failed quote with no price.
    pub fn failed(venue_id: impl Into<String>, reason: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            venue_id: venue_id.into(),
            price: None,
            status: QuoteStatus::Error,
            latency_ms,
            error: Some(reason.into()),
        }
    }

    /// Whether the venue reported a price.
    pub fn is_success(&self) -> bool {
        self.status == QuoteStatus::Success && self.price.is_some()
    }
}

// === Exchange payloads ===

/// Binance `GET /api/v3/ticker/price`.
#[derive(Debug, Deserialize)]
pub struct BinanceTickerPrice {
    pub symbol: String,
    pub price: String,
}

/// Binance error body.
#[derive(Debug, Deserialize)]
pub struct BinanceError {
    pub code: i64,
    pub msg: String,
}

/// Bybit `GET /v5/market/tickers` envelope.
#[derive(Debug, Deserialize)]
pub struct BybitTickerResponse {
    #[serde(rename = "retCode")]
    pub ret_code: i64,
    #[serde(rename = "retMsg", default)]
    pub ret_msg: String,
    #[serde(default)]
    pub result: Option<BybitTickerResult>,
}

#[derive(Debug, Deserialize)]
pub struct BybitTickerResult {
    #[serde(default)]
    pub list: Vec<BybitTicker>,
}

#[derive(Debug, Deserialize)]
pub struct BybitTicker {
    pub symbol: String,
    #[serde(rename = "lastPrice")]
    pub last_price: String,
}

/// OKX `GET /api/v5/market/ticker` envelope.
#[derive(Debug, Deserialize)]
pub struct OkxTickerResponse {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Vec<OkxTicker>,
}

#[derive(Debug, Deserialize)]
pub struct OkxTicker {
    #[serde(rename = "instId")]
    pub inst_id: String,
    pub last: String,
}

/// KuCoin `GET /api/v1/market/orderbook/level1` envelope.
#[derive(Debug, Deserialize)]
pub struct KucoinLevel1Response {
    pub code: String,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<KucoinLevel1>,
}

/// `price` is the last traded price.
#[derive(Debug, Deserialize)]
pub struct KucoinLevel1 {
    pub price: Option<String>,
}

/// Gate.io `GET /api/v4/spot/tickers` element.
#[derive(Debug, Deserialize)]
pub struct GateioTicker {
    pub currency_pair: String,
    pub last: String,
}
