//! Rate providers: live HTTP lookups with a static fallback.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{RateSource, RateTable};
use crate::config::Config;
use crate::error::ForexError;
use crate::metrics;

/// Source of forex rates for one request. Never fails.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Current rate table.
    async fn get_rates(&self) -> RateTable;
}

/// Rate service response (`{"base": "USD", "rates": {...}}`).
#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: Option<HashMap<String, Value>>,
}

/// Fetches rates from an HTTP rate service on every call.
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpRateProvider {
    /// Create a provider for the given URL.
    pub fn new(http: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            url: url.into(),
            timeout,
        }
    }

    /// Create a provider from configuration.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        Self::new(http, config.forex_api_url.clone(), config.forex_timeout())
    }

    /// Fetch the live table, surfacing any failure.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch_live(&self) -> Result<RateTable, ForexError> {
        let response = self
            .http
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForexError::Status(status.as_u16()));
        }

        let body: RatesResponse = response.json().await?;
        let rates: Vec<(String, Decimal)> = body
            .rates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(code, value)| rate_from_value(&value).map(|rate| (code, rate)))
            .collect();

        let table = RateTable::new(rates, RateSource::Live);
        if table.is_empty() {
            return Err(ForexError::EmptyRates);
        }

        debug!(currencies = table.len(), "Fetched live forex rates");
        Ok(table)
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn get_rates(&self) -> RateTable {
        match self.fetch_live().await {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "Forex rate service unavailable, using fallback rates");
                metrics::inc_forex_fallbacks();
                RateTable::fallback()
            }
        }
    }
}

/// Serves a fixed table. Used by tests and offline runs.
#[derive(Debug, Clone)]
pub struct FixedRateProvider {
    table: RateTable,
}

impl FixedRateProvider {
    /// Provider that always returns `table`.
    pub fn new(table: RateTable) -> Self {
        Self { table }
    }

    /// Provider that always returns the fallback table.
    pub fn fallback() -> Self {
        Self::new(RateTable::fallback())
    }
}

#[async_trait]
impl RateProvider for FixedRateProvider {
    async fn get_rates(&self) -> RateTable {
        self.table.clone()
    }
}

fn rate_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let raw = n.to_string();
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .ok()
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn provider(url: String) -> HttpRateProvider {
        HttpRateProvider::new(reqwest::Client::new(), url, Duration::from_secs(2))
    }

    #[tokio::test]
    async fn live_rates_are_parsed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v4/latest/USD")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"base":"USD","date":"2026-10-19","rates":{"USD":1,"INR":84.12,"EUR":0.921,"JPY":149.5}}"#)
            .create_async()
            .await;

        let table = provider(format!("{}/v4/latest/USD", server.url()))
            .get_rates()
            .await;

        assert_eq!(table.source(), RateSource::Live);
        assert_eq!(table.get("INR"), Some(dec!(84.12)));
        assert_eq!(table.get("EUR"), Some(dec!(0.921)));
        assert_eq!(table.len(), 4);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/latest")
            .with_status(503)
            .create_async()
            .await;

        let table = provider(format!("{}/latest", server.url())).get_rates().await;

        assert_eq!(table, RateTable::fallback());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_body_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/latest")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let table = provider(format!("{}/latest", server.url())).get_rates().await;
        assert_eq!(table.source(), RateSource::Fallback);
        assert_eq!(table.get("INR"), Some(dec!(83.50)));
    }

    #[tokio::test]
    async fn missing_rates_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/latest")
            .with_status(200)
            .with_body(r#"{"result":"error","error-type":"unsupported-code"}"#)
            .create_async()
            .await;

        let err = provider(format!("{}/latest", server.url()))
            .fetch_live()
            .await
            .unwrap_err();
        assert!(matches!(err, ForexError::EmptyRates));
    }

    #[tokio::test]
    async fn unreachable_service_falls_back() {
        let table = provider("http://127.0.0.1:9/latest".to_string())
            .get_rates()
            .await;
        assert_eq!(table.source(), RateSource::Fallback);
    }

    #[tokio::test]
    async fn fixed_provider_returns_its_table() {
        let table = RateTable::new([("GBP".to_string(), dec!(0.79))], RateSource::Live);
        let provider = FixedRateProvider::new(table.clone());
        assert_eq!(provider.get_rates().await, table);
    }

    #[test]
    fn rate_values_accept_numbers_and_strings() {
        assert_eq!(rate_from_value(&serde_json::json!(83.5)), Some(dec!(83.5)));
        assert_eq!(rate_from_value(&serde_json::json!("3.67")), Some(dec!(3.67)));
        assert_eq!(rate_from_value(&serde_json::json!(null)), None);
    }
}
