//! Prometheus metrics for scan latency and venue health.
//!
//! This module provides metrics for:
//! - Overall venue scan latency
//! - Per-venue quote latency and failures
//! - Forex fallbacks
//! - API requests and rate limiting

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Full venue scan latency metric name.
pub const METRIC_SCAN_LATENCY: &str = "venue_scan_latency_ms";
/// Single venue quote latency metric name.
pub const METRIC_VENUE_QUOTE_LATENCY: &str = "venue_quote_latency_ms";
/// Venue quote failures counter metric name.
pub const METRIC_VENUE_FAILURES: &str = "venue_quote_failures_total";
/// Forex fallback counter metric name.
pub const METRIC_FOREX_FALLBACKS: &str = "forex_fallbacks_total";
/// Arbitrage requests counter metric name.
pub const METRIC_ARBITRAGE_REQUESTS: &str = "arbitrage_requests_total";
/// Rate-limited requests counter metric name.
pub const METRIC_RATE_LIMITED: &str = "rate_limited_requests_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_SCAN_LATENCY,
        "Time to collect quotes from every venue in milliseconds"
    );
    describe_histogram!(
        METRIC_VENUE_QUOTE_LATENCY,
        "Single venue quote latency in milliseconds"
    );

    describe_counter!(
        METRIC_VENUE_FAILURES,
        "Total number of venue quotes that failed or timed out"
    );
    describe_counter!(
        METRIC_FOREX_FALLBACKS,
        "Total number of times the static forex table was used"
    );
    describe_counter!(
        METRIC_ARBITRAGE_REQUESTS,
        "Total number of arbitrage evaluations by outcome"
    );
    describe_counter!(
        METRIC_RATE_LIMITED,
        "Total number of requests rejected by the rate limiter"
    );

    debug!("Metrics initialized");
}

/// Record one venue's quote latency.
pub fn record_venue_quote_latency(start: Instant, venue: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_VENUE_QUOTE_LATENCY, "venue" => venue.to_string()).record(latency_ms);
}

/// Increment venue failure counter.
pub fn inc_venue_failures(venue: &str, kind: &'static str) {
    counter!(METRIC_VENUE_FAILURES, "venue" => venue.to_string(), "kind" => kind).increment(1);
}

/// Increment forex fallback counter.
pub fn inc_forex_fallbacks() {
    counter!(METRIC_FOREX_FALLBACKS).increment(1);
}

/// Increment arbitrage request counter.
pub fn inc_arbitrage_requests(outcome: &'static str) {
    counter!(METRIC_ARBITRAGE_REQUESTS, "outcome" => outcome).increment(1);
}

/// Increment rate-limited counter.
pub fn inc_rate_limited() {
    counter!(METRIC_RATE_LIMITED).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for a full venue scan.
pub fn timer_scan() -> LatencyTimer {
    LatencyTimer::new(METRIC_SCAN_LATENCY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn latency_timer_measures_time() {
        let timer = LatencyTimer::new("test_metric");
        sleep(Duration::from_millis(10));
        let elapsed = timer.elapsed_ms();
        assert!(elapsed >= 9.0); // Allow some tolerance
    }

    #[test]
    fn helpers_work_without_recorder() {
        init_metrics();
        inc_venue_failures("binance", "timeout");
        inc_forex_fallbacks();
        inc_arbitrage_requests("ok");
        record_venue_quote_latency(Instant::now(), "okx");
    }
}
