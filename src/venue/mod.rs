//! Venue module: exchanges queried for last traded prices.
//!
//! This module handles:
//! - The set of supported exchanges
//! - The `PriceSource` seam every venue adapter implements
//! - An explicitly constructed registry passed to the scanner
//! - A mock price source for tests

pub mod client;
pub mod mock;
pub mod types;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::VenueError;

pub use client::ExchangeClient;
pub use mock::{MockBehavior, MockPriceSource};
pub use types::{QuoteStatus, VenueQuote};

/// Supported centralized exchanges.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Venue {
    /// Binance spot.
    Binance,
    /// Bybit spot (v5 API).
    Bybit,
    /// OKX spot (v5 API).
    Okx,
    /// KuCoin spot.
    Kucoin,
    /// Gate.io spot (v4 API).
    #[strum(to_string = "gateio", serialize = "gate")]
    Gateio,
}

impl Venue {
    /// Every supported venue, in default scan order.
    pub const ALL: [Venue; 5] = [
        Venue::Binance,
        Venue::Bybit,
        Venue::Okx,
        Venue::Kucoin,
        Venue::Gateio,
    ];

    /// Public REST base URL.
    pub fn api_base(&self) -> &'static str {
        match self {
            Venue::Binance => "https://api.binance.com/api/v3",
            Venue::Bybit => "https://api.bybit.com/v5",
            Venue::Okx => "https://www.okx.com/api/v5",
            Venue::Kucoin => "https://api.kucoin.com/api/v1",
            Venue::Gateio => "https://api.gateio.ws/api/v4",
        }
    }

    /// Instrument name for a base/quote pair in this venue's format.
    pub fn pair_symbol(&self, base: &str, quote: &str) -> String {
        let base = base.to_uppercase();
        let quote = quote.to_uppercase();
        match self {
            Venue::Binance | Venue::Bybit => format!("{}{}", base, quote),
            Venue::Okx | Venue::Kucoin => format!("{}-{}", base, quote),
            Venue::Gateio => format!("{}_{}", base, quote),
        }
    }
}

/// Anything able to report the last traded price of a pair on one venue.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Stable identifier used in logs, reports and tie-breaking.
    fn venue_id(&self) -> &str;

    /// Last traded price of `base` quoted in `quote`.
    async fn last_price(&self, base: &str, quote: &str) -> Result<Decimal, VenueError>;
}

/// Explicitly constructed set of price sources handed to the scanner.
#[derive(Clone, Default)]
pub struct VenueRegistry {
    sources: Vec<Arc<dyn PriceSource>>,
}

impl VenueRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build REST adapters for the given venues sharing one HTTP client.
    pub fn from_venues(venues: &[Venue], http: reqwest::Client) -> Self {
        let mut registry = Self::new();
        for venue in venues {
            registry.register(Arc::new(ExchangeClient::new(*venue, http.clone())));
        }
        registry
    }

    /// Add a source, builder style.
    pub fn with_source(mut self, source: impl PriceSource + 'static) -> Self {
        self.register(Arc::new(source));
        self
    }

    /// Add a shared source.
    pub fn register(&mut self, source: Arc<dyn PriceSource>) {
        self.sources.push(source);
    }

    /// Registered sources in registration order.
    pub fn sources(&self) -> &[Arc<dyn PriceSource>] {
        &self.sources
    }

    /// Registered venue ids.
    pub fn ids(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|s| s.venue_id().to_string())
            .collect()
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source is registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl fmt::Debug for VenueRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VenueRegistry")
            .field("venues", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn venue_parses_case_insensitively() {
        assert_eq!(Venue::from_str("binance").unwrap(), Venue::Binance);
        assert_eq!(Venue::from_str("OKX").unwrap(), Venue::Okx);
        assert_eq!(Venue::from_str("KuCoin").unwrap(), Venue::Kucoin);
        assert_eq!(Venue::from_str("gate").unwrap(), Venue::Gateio);
        assert!(Venue::from_str("ftx").is_err());
    }

    #[test]
    fn venue_display_is_lowercase_id() {
        assert_eq!(Venue::Okx.to_string(), "okx");
        assert_eq!(Venue::Gateio.to_string(), "gateio");
    }

    #[test]
    fn pair_symbol_formats() {
        assert_eq!(Venue::Binance.pair_symbol("btc", "usdt"), "BTCUSDT");
        assert_eq!(Venue::Bybit.pair_symbol("ETH", "USDT"), "ETHUSDT");
        assert_eq!(Venue::Okx.pair_symbol("BTC", "USDT"), "BTC-USDT");
        assert_eq!(Venue::Kucoin.pair_symbol("sol", "usdt"), "SOL-USDT");
        assert_eq!(Venue::Gateio.pair_symbol("BTC", "USDT"), "BTC_USDT");
    }

    #[test]
    fn registry_keeps_registration_order() {
        let registry = VenueRegistry::new()
            .with_source(MockPriceSource::with_price("okx", dec!(100)))
            .with_source(MockPriceSource::with_price("binance", dec!(101)));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids(), vec!["okx", "binance"]);
        assert!(format!("{:?}", registry).contains("okx"));
    }

    #[test]
    fn registry_from_venues_uses_venue_ids() {
        let registry = VenueRegistry::from_venues(&Venue::ALL, reqwest::Client::new());
        assert_eq!(
            registry.ids(),
            vec!["binance", "bybit", "okx", "kucoin", "gateio"]
        );
    }
}
