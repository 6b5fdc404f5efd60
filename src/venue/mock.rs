//! Mock price source for unit testing.
//!
//! This module provides a venue that can be used in tests
//! without making real network requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::PriceSource;
use crate::error::VenueError;

/// What the mock venue does when asked for a price.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Report this price.
    Price(Decimal),
    /// Fail with an exchange error.
    Fail(String),
    /// Never answer.
    Hang,
}

/// Mock venue for testing.
#[derive(Debug, Clone)]
pub struct MockPriceSource {
    /// Venue identifier.
    venue_id: String,
    /// Response behavior.
    behavior: MockBehavior,
    /// Simulated latency before answering.
    latency: Duration,
    /// Number of lookups started.
    calls: Arc<AtomicUsize>,
    /// Number of lookups dropped before they finished.
    cancelled: Arc<AtomicUsize>,
}

impl MockPriceSource {
    /// Create a mock with the given behavior.
    pub fn new(venue_id: impl Into<String>, behavior: MockBehavior) -> Self {
        Self {
            venue_id: venue_id.into(),
            behavior,
            latency: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            cancelled: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Mock that reports a fixed price.
    pub fn with_price(venue_id: impl Into<String>, price: Decimal) -> Self {
        Self::new(venue_id, MockBehavior::Price(price))
    }

    /// Mock that always errors.
    pub fn failing(venue_id: impl Into<String>) -> Self {
        Self::new(venue_id, MockBehavior::Fail("Mock venue failure".to_string()))
    }

    /// Mock that never answers.
    pub fn hanging(venue_id: impl Into<String>) -> Self {
        Self::new(venue_id, MockBehavior::Hang)
    }

    /// Add simulated latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of lookups started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of lookups abandoned mid-flight.
    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Counts a lookup as cancelled if dropped before `finish`.
struct InFlight {
    cancelled: Arc<AtomicUsize>,
    finished: bool,
}

impl InFlight {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.finished {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    fn venue_id(&self) -> &str {
        &self.venue_id
    }

    async fn last_price(&self, _base: &str, _quote: &str) -> Result<Decimal, VenueError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight {
            cancelled: self.cancelled.clone(),
            finished: false,
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let result = match &self.behavior {
            MockBehavior::Price(price) => Ok(*price),
            MockBehavior::Fail(reason) => Err(VenueError::Exchange {
                venue: self.venue_id.clone(),
                reason: reason.clone(),
            }),
            MockBehavior::Hang => std::future::pending().await,
        };

        guard.finish();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn mock_returns_configured_price() {
        let mock = MockPriceSource::with_price("binance", dec!(100.5));
        assert_eq!(mock.last_price("BTC", "USDT").await.unwrap(), dec!(100.5));
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.cancelled(), 0);
    }

    #[tokio::test]
    async fn mock_failure_is_exchange_error() {
        let mock = MockPriceSource::failing("okx");
        let err = mock.last_price("BTC", "USDT").await.unwrap_err();
        assert_eq!(err.kind(), "exchange");
    }

    #[tokio::test]
    async fn dropped_lookup_counts_as_cancelled() {
        let mock = MockPriceSource::hanging("kucoin");
        let result =
            tokio::time::timeout(Duration::from_millis(20), mock.last_price("BTC", "USDT")).await;
        assert!(result.is_err());
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.cancelled(), 1);
    }
}
