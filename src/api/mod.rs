//! HTTP API module for arbitrage, health and metrics endpoints.

pub mod handlers;
pub mod rate_limit;
pub mod routes;

pub use handlers::{ApiError, AppState};
pub use rate_limit::{RateLimiter, RATE_LIMIT_MESSAGE};
pub use routes::create_router;
