//! Arbitrage module: venue selection, profit math and the report.
//!
//! This module handles:
//! - Fee constants and per-currency exit fees
//! - Buy/sell venue selection and profit calculations
//! - Request validation and end-to-end evaluation
//! - Report formatting

pub mod calculator;
pub mod engine;
pub mod fees;
pub mod report;

pub use calculator::{compute_arbitrage, convert_to_stable, select_venues, ArbitrageResult};
pub use engine::{ArbitrageEngine, ArbitrageRequest, RequestDefaults};
pub use fees::{FeeSchedule, CRYPTO_FEE_RATE};
pub use report::{format_report, ArbitrageReport, ReportContext};
