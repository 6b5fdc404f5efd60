//! Application configuration loaded from environment variables.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::venue::Venue;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    // === Forex ===
    /// Rate service URL returning `{"rates": {...}}` against USD.
    #[serde(default = "default_forex_api_url")]
    pub forex_api_url: String,

    /// Timeout for the rate service call in milliseconds.
    #[serde(default = "default_forex_timeout_ms")]
    pub forex_timeout_ms: u64,

    // === Venues ===
    /// Comma-separated venue ids to scan.
    #[serde(default = "default_venues")]
    pub venues: String,

    /// Stable asset every venue is quoted against.
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,

    /// Per-venue price lookup timeout in milliseconds.
    #[serde(default = "default_venue_timeout_ms")]
    pub venue_timeout_ms: u64,

    // === Request Defaults ===
    /// Principal used when a request omits `amount`.
    #[serde(default = "default_amount")]
    pub default_amount: Decimal,

    /// Local currency used when a request omits `currency`.
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Forex fee percent used when a request omits `forex_fee`.
    #[serde(default = "default_forex_fee")]
    pub default_forex_fee: Decimal,

    /// Extra exit fee per currency, e.g. `INR:1.0,EUR:0.25` (percent).
    #[serde(default = "default_exit_fee_overrides")]
    pub exit_fee_overrides: String,

    // === Rate Limiting ===
    /// Requests allowed per caller per window.
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    /// Rate limit window in seconds.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_port() -> u16 {
    3000
}

fn default_forex_api_url() -> String {
    "https://api.exchangerate-api.com/v4/latest/USD".to_string()
}

fn default_forex_timeout_ms() -> u64 {
    5_000
}

fn default_venues() -> String {
    "binance,bybit,okx,kucoin,gateio".to_string()
}

fn default_quote_asset() -> String {
    "USDT".to_string()
}

fn default_venue_timeout_ms() -> u64 {
    8_000
}

fn default_amount() -> Decimal {
    Decimal::new(100_000, 0)
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_forex_fee() -> Decimal {
    Decimal::new(25, 1) // 2.5%
}

fn default_exit_fee_overrides() -> String {
    "INR:1.0".to_string()
}

fn default_rate_limit_max_requests() -> u32 {
    50
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            forex_api_url: default_forex_api_url(),
            forex_timeout_ms: default_forex_timeout_ms(),
            venues: default_venues(),
            quote_asset: default_quote_asset(),
            venue_timeout_ms: default_venue_timeout_ms(),
            default_amount: default_amount(),
            default_currency: default_currency(),
            default_forex_fee: default_forex_fee(),
            exit_fee_overrides: default_exit_fee_overrides(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.venue_timeout_ms == 0 {
            return Err("VENUE_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.forex_timeout_ms == 0 {
            return Err("FOREX_TIMEOUT_MS must be greater than 0".to_string());
        }

        let venues = self.venue_list()?;
        if venues.len() < 2 {
            return Err("VENUES must list at least two venues".to_string());
        }

        if self.quote_asset.trim().is_empty() {
            return Err("QUOTE_ASSET is required".to_string());
        }

        if self.default_amount <= Decimal::ZERO {
            return Err("DEFAULT_AMOUNT must be positive".to_string());
        }

        if self.default_forex_fee < Decimal::ZERO || self.default_forex_fee >= Decimal::ONE_HUNDRED
        {
            return Err("DEFAULT_FOREX_FEE must be in [0, 100)".to_string());
        }

        if self.rate_limit_max_requests == 0 || self.rate_limit_window_secs == 0 {
            return Err("RATE_LIMIT_MAX_REQUESTS and RATE_LIMIT_WINDOW_SECS must be positive".to_string());
        }

        self.exit_fee_table()?;

        Ok(())
    }

    /// Parse the configured venue list, preserving order and dropping duplicates.
    pub fn venue_list(&self) -> Result<Vec<Venue>, String> {
        let mut venues = Vec::new();
        for raw in self.venues.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let venue = Venue::from_str(raw).map_err(|_| format!("unknown venue in VENUES: {}", raw))?;
            if !venues.contains(&venue) {
                venues.push(venue);
            }
        }
        Ok(venues)
    }

    /// Parse `EXIT_FEE_OVERRIDES` into a currency → percent table.
    pub fn exit_fee_table(&self) -> Result<HashMap<String, Decimal>, String> {
        let mut table = HashMap::new();
        for entry in self
            .exit_fee_overrides
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let (currency, pct) = entry
                .split_once(':')
                .ok_or_else(|| format!("EXIT_FEE_OVERRIDES entry must be CODE:PCT, got {}", entry))?;
            let pct = Decimal::from_str(pct.trim())
                .map_err(|_| format!("invalid exit fee percent for {}: {}", currency, pct))?;
            if pct < Decimal::ZERO || pct >= Decimal::ONE_HUNDRED {
                return Err(format!("exit fee for {} must be in [0, 100)", currency));
            }
            table.insert(currency.trim().to_uppercase(), pct);
        }
        Ok(table)
    }

    /// Per-venue lookup timeout.
    pub fn venue_timeout(&self) -> Duration {
        Duration::from_millis(self.venue_timeout_ms)
    }

    /// Rate service timeout.
    pub fn forex_timeout(&self) -> Duration {
        Duration::from_millis(self.forex_timeout_ms)
    }

    /// Rate limit window.
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// Quote asset, upper-cased.
    pub fn quote_asset_upper(&self) -> String {
        self.quote_asset.trim().to_uppercase()
    }
}
