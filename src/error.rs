//! Unified error types for the arbitrage calculator.

use thiserror::Error;

/// Unified error type for the arbitrage calculator.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Venue lookup error.
    #[error("venue error: {0}")]
    Venue(#[from] VenueError),

    /// Forex rate lookup error.
    #[error("forex error: {0}")]
    Forex(#[from] ForexError),

    /// Arbitrage calculation error.
    #[error("arbitrage error: {0}")]
    Arbitrage(#[from] ArbitrageError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while fetching a price from a single venue.
///
/// These never leave the quote fetcher: a failing venue is simply excluded
/// from the scan.
#[derive(Error, Debug)]
pub enum VenueError {
    /// Transport-level failure talking to the venue.
    #[error("{venue} network error: {source}")]
    Network {
        /// Venue identifier.
        venue: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Venue answered but reported an error.
    #[error("{venue} exchange error: {reason}")]
    Exchange {
        /// Venue identifier.
        venue: String,
        /// Error reported by the venue.
        reason: String,
    },

    /// Venue response could not be interpreted.
    #[error("{venue} returned malformed data: {reason}")]
    Parse {
        /// Venue identifier.
        venue: String,
        /// What was wrong with the payload.
        reason: String,
    },

    /// Price lookup did not finish in time.
    #[error("{venue} timed out after {after_ms}ms")]
    Timeout {
        /// Venue identifier.
        venue: String,
        /// Elapsed budget in milliseconds.
        after_ms: u64,
    },

    /// Symbol rejected before any request was made.
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),
}

impl VenueError {
    /// Short label used for metrics and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            VenueError::Network { .. } => "network",
            VenueError::Exchange { .. } => "exchange",
            VenueError::Parse { .. } => "parse",
            VenueError::Timeout { .. } => "timeout",
            VenueError::InvalidSymbol(_) => "invalid_symbol",
        }
    }
}

/// Forex rate provider errors. Always absorbed by the fallback table.
#[derive(Error, Debug)]
pub enum ForexError {
    /// HTTP request failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate service answered with a non-success status.
    #[error("rate service returned status {0}")]
    Status(u16),

    /// Payload had no usable rates.
    #[error("rate service returned no usable rates")]
    EmptyRates,
}

/// Arbitrage input and calculation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbitrageError {
    /// Fewer venues responded than a buy/sell pair requires.
    #[error("Not enough market data: {available} of {required} required venues reported a price")]
    InsufficientMarketData {
        /// Venues that reported a price.
        available: usize,
        /// Minimum venues needed.
        required: usize,
    },

    /// Request parameters were rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Decimal arithmetic overflowed.
    #[error("calculation overflow while computing {0}")]
    Overflow(&'static str),
}

impl ArbitrageError {
    /// Whether the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ArbitrageError::InvalidInput(_))
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
