//! REST adapter fetching last traded prices from public exchange APIs.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::types::{
    BinanceError, BinanceTickerPrice, BybitTickerResponse, GateioTicker, KucoinLevel1Response,
    OkxTickerResponse,
};
use super::{PriceSource, Venue};
use crate::error::VenueError;

/// Public market-data client for one venue.
#[derive(Debug, Clone)]
pub struct ExchangeClient {
    /// Which exchange this client talks to.
    venue: Venue,
    /// Shared HTTP client.
    http: reqwest::Client,
    /// REST base URL, overridable for tests.
    base_url: String,
}

impl ExchangeClient {
    /// Create a client against the venue's public API.
    pub fn new(venue: Venue, http: reqwest::Client) -> Self {
        Self {
            venue,
            http,
            base_url: venue.api_base().to_string(),
        }
    }

    /// Point the client at another base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The venue this client queries.
    pub fn venue(&self) -> Venue {
        self.venue
    }

    /// Ticker endpoint (relative to the base URL) for a pair.
    pub fn ticker_endpoint(&self, base: &str, quote: &str) -> String {
        let symbol = self.venue.pair_symbol(base, quote);
        match self.venue {
            Venue::Binance => format!("ticker/price?symbol={}", symbol),
            Venue::Bybit => format!("market/tickers?category=spot&symbol={}", symbol),
            Venue::Okx => format!("market/ticker?instId={}", symbol),
            Venue::Kucoin => format!("market/orderbook/level1?symbol={}", symbol),
            Venue::Gateio => format!("spot/tickers?currency_pair={}", symbol),
        }
    }

    /// GET an endpoint and return the raw body of a 2xx response.
    async fn get_body(&self, endpoint: &str) -> Result<String, VenueError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| self.network(source))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| self.network(source))?;

        if !status.is_success() {
            return Err(VenueError::Exchange {
                venue: self.venue.to_string(),
                reason: format!("{} - {}", status, error_message(self.venue, &body)),
            });
        }

        Ok(body)
    }

    fn network(&self, source: reqwest::Error) -> VenueError {
        VenueError::Network {
            venue: self.venue.to_string(),
            source,
        }
    }
}

#[async_trait]
impl PriceSource for ExchangeClient {
    fn venue_id(&self) -> &str {
        self.venue.as_ref()
    }

    #[instrument(skip(self), fields(venue = %self.venue))]
    async fn last_price(&self, base: &str, quote: &str) -> Result<Decimal, VenueError> {
        validate_asset(base)?;
        validate_asset(quote)?;

        let endpoint = self.ticker_endpoint(base, quote);
        let body = self.get_body(&endpoint).await?;
        let price = price_from_body(self.venue, &body)?;

        debug!(price = %price, "Last traded price");
        Ok(price)
    }
}

fn validate_asset(asset: &str) -> Result<(), VenueError> {
    if asset.is_empty() {
        return Err(VenueError::InvalidSymbol(
            "Symbol cannot be empty".to_string(),
        ));
    }
    if !asset.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(VenueError::InvalidSymbol(format!(
            "Symbol must be alphanumeric: {}",
            asset
        )));
    }
    Ok(())
}

/// Extract the last traded price from a successful venue response body.
pub fn price_from_body(venue: Venue, body: &str) -> Result<Decimal, VenueError> {
    let parse_err = |e: serde_json::Error| VenueError::Parse {
        venue: venue.to_string(),
        reason: e.to_string(),
    };
    let exchange_err = |reason: String| VenueError::Exchange {
        venue: venue.to_string(),
        reason,
    };

    let raw = match venue {
        Venue::Binance => {
            let ticker: BinanceTickerPrice = serde_json::from_str(body).map_err(parse_err)?;
            ticker.price
        }
        Venue::Bybit => {
            let response: BybitTickerResponse = serde_json::from_str(body).map_err(parse_err)?;
            if response.ret_code != 0 {
                return Err(exchange_err(format!(
                    "{} - {}",
                    response.ret_code, response.ret_msg
                )));
            }
            response
                .result
                .and_then(|r| r.list.into_iter().next())
                .map(|t| t.last_price)
                .ok_or_else(|| exchange_err("empty ticker list".to_string()))?
        }
        Venue::Okx => {
            let response: OkxTickerResponse = serde_json::from_str(body).map_err(parse_err)?;
            if response.code != "0" {
                return Err(exchange_err(format!("{} - {}", response.code, response.msg)));
            }
            response
                .data
                .into_iter()
                .next()
                .map(|t| t.last)
                .ok_or_else(|| exchange_err("empty ticker data".to_string()))?
        }
        Venue::Kucoin => {
            // KuCoin signals success with "200000" and a null `data` for unknown symbols
            let response: KucoinLevel1Response = serde_json::from_str(body).map_err(parse_err)?;
            if response.code != "200000" {
                return Err(exchange_err(format!(
                    "{} - {}",
                    response.code,
                    response.msg.unwrap_or_default()
                )));
            }
            response
                .data
                .and_then(|d| d.price)
                .ok_or_else(|| exchange_err("no ticker for symbol".to_string()))?
        }
        Venue::Gateio => {
            let tickers: Vec<GateioTicker> = serde_json::from_str(body).map_err(parse_err)?;
            tickers
                .into_iter()
                .next()
                .map(|t| t.last)
                .ok_or_else(|| exchange_err("empty ticker list".to_string()))?
        }
    };

    parse_price(venue, &raw)
}

/// Parse a venue price string, accepting scientific notation.
fn parse_price(venue: Venue, raw: &str) -> Result<Decimal, VenueError> {
    let raw = raw.trim();
    let price = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| VenueError::Parse {
            venue: venue.to_string(),
            reason: format!("invalid price format: {:?}", raw),
        })?;

    if price <= Decimal::ZERO {
        return Err(VenueError::Parse {
            venue: venue.to_string(),
            reason: format!("non-positive price: {}", price),
        });
    }

    Ok(price)
}

/// Best-effort error text from a non-2xx body.
fn error_message(venue: Venue, body: &str) -> String {
    if venue == Venue::Binance {
        if let Ok(err) = serde_json::from_str::<BinanceError>(body) {
            return format!("{} {}", err.code, err.msg);
        }
    }
    let trimmed = body.trim();
    if trimmed.chars().count() > 200 {
        format!("{}...", trimmed.chars().take(200).collect::<String>())
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use rust_decimal_macros::dec;

    #[test]
    fn binance_body_parses() {
        let body = r#"{"symbol":"BTCUSDT","price":"64123.45000000"}"#;
        assert_eq!(
            price_from_body(Venue::Binance, body).unwrap(),
            dec!(64123.45)
        );
    }

    #[test]
    fn bybit_body_parses() {
        let body = r#"{"retCode":0,"retMsg":"OK","result":{"category":"spot","list":[{"symbol":"BTCUSDT","lastPrice":"64100.1","bid1Price":"64100"}]}}"#;
        assert_eq!(price_from_body(Venue::Bybit, body).unwrap(), dec!(64100.1));
    }

    #[test]
    fn bybit_error_code_is_exchange_error() {
        let body = r#"{"retCode":10001,"retMsg":"Not supported symbols","result":{}}"#;
        let err = price_from_body(Venue::Bybit, body).unwrap_err();
        assert_eq!(err.kind(), "exchange");
        assert!(err.to_string().contains("Not supported symbols"));
    }

    #[test]
    fn okx_body_parses() {
        let body = r#"{"code":"0","msg":"","data":[{"instId":"BTC-USDT","last":"64090.2","askPx":"64090.3"}]}"#;
        assert_eq!(price_from_body(Venue::Okx, body).unwrap(), dec!(64090.2));
    }

    #[test]
    fn okx_error_code_is_exchange_error() {
        let body = r#"{"code":"51001","msg":"Instrument ID does not exist","data":[]}"#;
        let err = price_from_body(Venue::Okx, body).unwrap_err();
        assert!(matches!(err, VenueError::Exchange { .. }));
    }

    #[test]
    fn kucoin_body_parses() {
        let body = r#"{"code":"200000","data":{"time":1700000000000,"sequence":"1","price":"64111","size":"0.01","bestBid":"64110","bestAsk":"64112"}}"#;
        assert_eq!(price_from_body(Venue::Kucoin, body).unwrap(), dec!(64111));
    }

    #[test]
    fn kucoin_null_data_is_exchange_error() {
        let body = r#"{"code":"200000","data":null}"#;
        assert!(matches!(
            price_from_body(Venue::Kucoin, body),
            Err(VenueError::Exchange { .. })
        ));
    }

    #[test]
    fn gateio_body_parses() {
        let body = r#"[{"currency_pair":"BTC_USDT","last":"64080.5","lowest_ask":"64080.6"}]"#;
        assert_eq!(price_from_body(Venue::Gateio, body).unwrap(), dec!(64080.5));
    }

    #[test]
    fn scientific_prices_parse() {
        let body = r#"{"symbol":"PEPEUSDT","price":"1.2e-5"}"#;
        assert_eq!(
            price_from_body(Venue::Binance, body).unwrap(),
            dec!(0.000012)
        );
    }

    #[test]
    fn zero_price_is_rejected() {
        let body = r#"{"symbol":"BTCUSDT","price":"0.00000000"}"#;
        let err = price_from_body(Venue::Binance, body).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn malformed_body_is_parse_error() {
        let err = price_from_body(Venue::Okx, "<html>502</html>").unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn ticker_endpoints_per_venue() {
        let http = reqwest::Client::new();
        assert_eq!(
            ExchangeClient::new(Venue::Binance, http.clone()).ticker_endpoint("btc", "usdt"),
            "ticker/price?symbol=BTCUSDT"
        );
        assert_eq!(
            ExchangeClient::new(Venue::Okx, http.clone()).ticker_endpoint("BTC", "USDT"),
            "market/ticker?instId=BTC-USDT"
        );
        assert_eq!(
            ExchangeClient::new(Venue::Gateio, http).ticker_endpoint("ETH", "USDT"),
            "spot/tickers?currency_pair=ETH_USDT"
        );
    }

    #[tokio::test]
    async fn fetches_price_from_http_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/ticker/price".to_string()))
            .match_query(Matcher::UrlEncoded("symbol".into(), "ETHUSDT".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"symbol":"ETHUSDT","price":"3150.25"}"#)
            .create_async()
            .await;

        let client = ExchangeClient::new(Venue::Binance, reqwest::Client::new())
            .with_base_url(server.url());

        let price = client.last_price("ETH", "USDT").await.unwrap();
        assert_eq!(price, dec!(3150.25));
        assert_eq!(client.venue_id(), "binance");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_error_status_maps_to_exchange_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/ticker/price".to_string()))
            .match_query(Matcher::UrlEncoded("symbol".into(), "NOPEUSDT".into()))
            .with_status(400)
            .with_body(r#"{"code":-1121,"msg":"Invalid symbol."}"#)
            .create_async()
            .await;

        let client = ExchangeClient::new(Venue::Binance, reqwest::Client::new())
            .with_base_url(server.url());

        let err = client.last_price("NOPE", "USDT").await.unwrap_err();
        match err {
            VenueError::Exchange { venue, reason } => {
                assert_eq!(venue, "binance");
                assert!(reason.contains("Invalid symbol."));
            }
            other => panic!("Expected Exchange error, got {:?}", other),
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn invalid_symbol_skips_network() {
        let client = ExchangeClient::new(Venue::Okx, reqwest::Client::new())
            .with_base_url("http://127.0.0.1:9");

        let err = client.last_price("BTC/X", "USDT").await.unwrap_err();
        assert!(matches!(err, VenueError::InvalidSymbol(_)));
    }
}
