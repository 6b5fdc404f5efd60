//! Venue scanning: time-boxed quote fetches fanned out over the registry.
//!
//! - [`fetcher`]: one venue, one price, bounded by a timeout
//! - [`aggregator`]: all venues concurrently, successes only

pub mod aggregator;
pub mod fetcher;

pub use aggregator::{scan_all, scan_venues, successful_quotes, MIN_VENUES};
pub use fetcher::fetch_quote;
