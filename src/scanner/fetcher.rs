//! Single-venue quote fetch bounded by a timeout.

use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::error::VenueError;
use crate::metrics;
use crate::venue::{PriceSource, VenueQuote};

/// Fetch the last traded price from one venue, never failing.
///
/// The lookup races `timeout`. If the timer wins, the lookup future is
/// dropped, which aborts its in-flight request. Errors and timeouts come
/// back as an `Error` quote with no price.
#[instrument(skip(source), fields(venue = %source.venue_id()))]
pub async fn fetch_quote(
    source: &dyn PriceSource,
    base: &str,
    quote: &str,
    timeout: Duration,
) -> VenueQuote {
    let venue = source.venue_id().to_string();
    let start = Instant::now();

    let outcome = match tokio::time::timeout(timeout, source.last_price(base, quote)).await {
        Ok(result) => result,
        Err(_) => Err(VenueError::Timeout {
            venue: venue.clone(),
            after_ms: timeout.as_millis() as u64,
        }),
    };

    let latency_ms = start.elapsed().as_millis() as u64;
    metrics::record_venue_quote_latency(start, &venue);

    match outcome {
        Ok(price) if price > Decimal::ZERO => {
            debug!(price = %price, latency_ms, "Quote received");
            VenueQuote::success(venue, price, latency_ms)
        }
        Ok(price) => {
            warn!(price = %price, "Venue reported a non-positive price");
            metrics::inc_venue_failures(&venue, "parse");
            VenueQuote::failed(venue, format!("non-positive price: {}", price), latency_ms)
        }
        Err(e) => {
            warn!(error = %e, kind = e.kind(), latency_ms, "Quote failed, excluding venue");
            metrics::inc_venue_failures(&venue, e.kind());
            VenueQuote::failed(venue, e.to_string(), latency_ms)
        }
    }
}
