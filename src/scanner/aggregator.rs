//! Concurrent fan-out over every registered venue.

use std::time::Duration;

use futures::future::join_all;
use tracing::{info, instrument};

use super::fetcher::fetch_quote;
use crate::error::ArbitrageError;
use crate::metrics;
use crate::venue::{VenueQuote, VenueRegistry};

/// Minimum number of priced venues needed to pick a distinct buy and sell side.
pub const MIN_VENUES: usize = 2;

/// Query every venue concurrently and return one quote per venue, in
/// registry order.
///
/// Each lookup is bounded by `timeout`, so the whole scan finishes in
/// roughly `timeout` regardless of how many venues hang.
#[instrument(skip(registry), fields(venues = registry.len()))]
pub async fn scan_venues(
    registry: &VenueRegistry,
    base: &str,
    quote: &str,
    timeout: Duration,
) -> Vec<VenueQuote> {
    let timer = metrics::timer_scan();

    let quotes = join_all(
        registry
            .sources()
            .iter()
            .map(|source| fetch_quote(source.as_ref(), base, quote, timeout)),
    )
    .await;

    let ok = quotes.iter().filter(|q| q.is_success()).count();
    info!(
        ok,
        failed = quotes.len() - ok,
        elapsed_ms = timer.elapsed_ms() as u64,
        "Venue scan complete"
    );

    quotes
}

/// Keep only successful quotes, failing when fewer than [`MIN_VENUES`] remain.
pub fn successful_quotes(quotes: Vec<VenueQuote>) -> Result<Vec<VenueQuote>, ArbitrageError> {
    let ok: Vec<VenueQuote> = quotes.into_iter().filter(VenueQuote::is_success).collect();
    if ok.len() < MIN_VENUES {
        return Err(ArbitrageError::InsufficientMarketData {
            available: ok.len(),
            required: MIN_VENUES,
        });
    }
    Ok(ok)
}

/// Scan every venue and return only those that produced a price.
pub async fn scan_all(
    registry: &VenueRegistry,
    base: &str,
    quote: &str,
    timeout: Duration,
) -> Result<Vec<VenueQuote>, ArbitrageError> {
    successful_quotes(scan_venues(registry, base, quote, timeout).await)
}
