//! Cross-exchange crypto arbitrage calculator.
//!
//! Converts a local-currency investment into a stablecoin, scans several
//! exchanges for the widest spread on a coin, and reports the projected
//! profit after fees.
//!
//! ```text
//! 100000 INR  / 83.50 * (1 - 2.5%)     = 1167.66 USDT
//! buy  on BINANCE @ 64000.00
//! sell on OKX     @ 64320.50           gross gap 0.50%
//! USDT out = in / buy * sell * (1 - 0.6%)
//! INR  out = USDT out * 83.50 * (1 - exit fee)
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`forex`]: Currency rates with a static fallback
//! - [`venue`]: Exchange adapters and the venue registry
//! - [`scanner`]: Time-boxed concurrent price scan
//! - [`arbitrage`]: Venue selection, profit math and reports
//! - [`api`]: HTTP API with rate limiting, health and metrics
//! - [`metrics`]: Prometheus metric names and helpers
//! - [`utils`]: Utility functions

pub mod api;
pub mod arbitrage;
pub mod config;
pub mod error;
pub mod forex;
pub mod metrics;
pub mod scanner;
pub mod utils;
pub mod venue;

pub use config::Config;
pub use error::{AppError, Result};
