//! End-to-end evaluation of one arbitrage request.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::calculator::compute_arbitrage;
use super::fees::FeeSchedule;
use super::report::{format_report, ArbitrageReport, ReportContext};
use crate::config::Config;
use crate::error::ArbitrageError;
use crate::forex::{HttpRateProvider, RateProvider};
use crate::metrics;
use crate::scanner::{scan_venues, successful_quotes};
use crate::venue::VenueRegistry;

/// Largest principal accepted, in local currency units.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);
/// Longest accepted coin symbol.
pub const MAX_COIN_LEN: usize = 15;

/// Values used when a request leaves a parameter out.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    pub amount: Decimal,
    pub currency: String,
    pub forex_fee_pct: Decimal,
}

impl RequestDefaults {
    /// Defaults from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            amount: config.default_amount,
            currency: config.default_currency.clone(),
            forex_fee_pct: config.default_forex_fee,
        }
    }
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// One arbitrage question: how much would `amount` of `currency` make on `coin`?
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrageRequest {
    pub coin: String,
    pub amount: Decimal,
    pub currency: String,
    pub forex_fee_pct: Decimal,
}

fn param(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_decimal(name: &str, raw: &str) -> Result<Decimal, ArbitrageError> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ArbitrageError::InvalidInput(format!("{} must be a number, got '{}'", name, raw)))
}

impl ArbitrageRequest {
    /// Request with explicit values.
    pub fn new(
        coin: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        forex_fee_pct: Decimal,
    ) -> Self {
        Self {
            coin: coin.into(),
            amount,
            currency: currency.into(),
            forex_fee_pct,
        }
    }

    /// Build a request from raw query parameters.
    ///
    /// Absent or empty parameters take their default; present ones must parse.
    pub fn from_params(
        coin: &str,
        amount: Option<&str>,
        currency: Option<&str>,
        forex_fee: Option<&str>,
        defaults: &RequestDefaults,
    ) -> Result<Self, ArbitrageError> {
        let amount = match param(amount) {
            Some(raw) => parse_decimal("amount", raw)?,
            None => defaults.amount,
        };
        let forex_fee_pct = match param(forex_fee) {
            Some(raw) => parse_decimal("forex_fee", raw)?,
            None => defaults.forex_fee_pct,
        };
        let currency = param(currency).unwrap_or(defaults.currency.as_str()).to_string();

        let request = Self::new(coin.trim(), amount, currency, forex_fee_pct).normalized();
        request.validate()?;
        Ok(request)
    }

    /// Upper-case coin and currency.
    pub fn normalized(mut self) -> Self {
        self.coin = self.coin.trim().to_uppercase();
        self.currency = self.currency.trim().to_uppercase();
        self
    }

    /// Reject values the calculation cannot use.
    pub fn validate(&self) -> Result<(), ArbitrageError> {
        if self.coin.is_empty() {
            return Err(ArbitrageError::InvalidInput("coin is required".to_string()));
        }
        if self.coin.len() > MAX_COIN_LEN || !self.coin.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ArbitrageError::InvalidInput(format!(
                "coin must be 1-{} letters or digits, got '{}'",
                MAX_COIN_LEN, self.coin
            )));
        }

        if self.amount <= Decimal::ZERO {
            return Err(ArbitrageError::InvalidInput("amount must be positive".to_string()));
        }
        if self.amount > MAX_AMOUNT {
            return Err(ArbitrageError::InvalidInput(format!(
                "amount must not exceed {}",
                MAX_AMOUNT
            )));
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ArbitrageError::InvalidInput(format!(
                "currency must be a 3-letter code, got '{}'",
                self.currency
            )));
        }

        if self.forex_fee_pct < Decimal::ZERO || self.forex_fee_pct >= Decimal::ONE_HUNDRED {
            return Err(ArbitrageError::InvalidInput(
                "forex_fee must be in [0, 100)".to_string(),
            ));
        }

        Ok(())
    }
}

/// Owns everything one evaluation needs.
#[derive(Clone)]
pub struct ArbitrageEngine {
    registry: VenueRegistry,
    rates: Arc<dyn RateProvider>,
    fees: FeeSchedule,
    quote_asset: String,
    venue_timeout: Duration,
}

impl std::fmt::Debug for ArbitrageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArbitrageEngine")
            .field("registry", &self.registry)
            .field("fees", &self.fees)
            .field("quote_asset", &self.quote_asset)
            .field("venue_timeout", &self.venue_timeout)
            .finish()
    }
}

impl ArbitrageEngine {
    /// Create an engine from its parts.
    pub fn new(
        registry: VenueRegistry,
        rates: Arc<dyn RateProvider>,
        fees: FeeSchedule,
        quote_asset: impl Into<String>,
        venue_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            rates,
            fees,
            quote_asset: quote_asset.into().to_uppercase(),
            venue_timeout,
        }
    }

    /// Production engine: real venue adapters and the HTTP rate service,
    /// sharing one connection pool.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Result<Self, String> {
        let venues = config.venue_list()?;
        let registry = VenueRegistry::from_venues(&venues, http.clone());
        let rates = Arc::new(HttpRateProvider::from_config(config, http));
        let fees = FeeSchedule::from_config(config)?;

        Ok(Self::new(
            registry,
            rates,
            fees,
            config.quote_asset_upper(),
            config.venue_timeout(),
        ))
    }

    /// Venues this engine scans.
    pub fn registry(&self) -> &VenueRegistry {
        &self.registry
    }

    /// Stable asset quoted on every venue.
    pub fn quote_asset(&self) -> &str {
        &self.quote_asset
    }

    /// Validate, fetch rates, scan venues, calculate and format.
    #[instrument(skip(self, request), fields(coin = %request.coin, currency = %request.currency))]
    pub async fn evaluate(&self, request: ArbitrageRequest) -> Result<ArbitrageReport, ArbitrageError> {
        let outcome = self.run(request.normalized()).await;
        let label = match &outcome {
            Ok(_) => "ok",
            Err(ArbitrageError::InvalidInput(_)) => "invalid_input",
            Err(ArbitrageError::InsufficientMarketData { .. }) => "insufficient_data",
            Err(ArbitrageError::Overflow(_)) => "calculation_error",
        };
        metrics::inc_arbitrage_requests(label);
        outcome
    }

    async fn run(&self, request: ArbitrageRequest) -> Result<ArbitrageReport, ArbitrageError> {
        request.validate()?;

        let rates = self.rates.get_rates().await;
        let scan = scan_venues(&self.registry, &request.coin, &self.quote_asset, self.venue_timeout).await;

        let quotes = successful_quotes(scan.clone()).inspect_err(|e| {
            warn!(error = %e, "Not enough venues reported a price");
        })?;

        let result = compute_arbitrage(
            &quotes,
            request.amount,
            &request.currency,
            &rates,
            request.forex_fee_pct,
            &self.fees,
        )?;

        info!(
            buy = %result.buy_venue,
            sell = %result.sell_venue,
            gross_gap_pct = %result.gross_gap_pct.round_dp(4),
            net_profit_local = %result.net_profit_local.round_dp(2),
            forex_source = %rates.source(),
            "Arbitrage evaluated"
        );

        let ctx = ReportContext {
            coin: &request.coin,
            amount: request.amount,
            currency: &request.currency,
            forex_fee_pct: request.forex_fee_pct,
            forex_source: rates.source(),
            quote_asset: &self.quote_asset,
        };
        Ok(format_report(&ctx, &result, &scan))
    }
}
