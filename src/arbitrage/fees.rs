//! Trading and exit fees.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::config::Config;

/// Combined trading and network fee on the crypto leg (0.6%).
pub const CRYPTO_FEE_RATE: Decimal = Decimal::from_parts(6, 0, 0, false, 3);

/// Per-currency extra exit fees, in percent, on top of the forex fee.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeeSchedule {
    extra_exit_fee_pct: HashMap<String, Decimal>,
}

impl FeeSchedule {
    /// Build a schedule from a currency → percent table.
    pub fn new(extra_exit_fee_pct: impl IntoIterator<Item = (String, Decimal)>) -> Self {
        Self {
            extra_exit_fee_pct: extra_exit_fee_pct
                .into_iter()
                .map(|(code, pct)| (code.to_uppercase(), pct))
                .collect(),
        }
    }

    /// Build the schedule from `EXIT_FEE_OVERRIDES`.
    pub fn from_config(config: &Config) -> Result<Self, String> {
        Ok(Self::new(config.exit_fee_table()?))
    }

    /// Default schedule: 1% withholding on INR exits.
    pub fn standard() -> Self {
        Self::new([("INR".to_string(), Decimal::ONE)])
    }

    /// Extra exit fee for a currency, zero when none is configured.
    pub fn extra_exit_fee_pct(&self, currency: &str) -> Decimal {
        self.extra_exit_fee_pct
            .get(&currency.to_uppercase())
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}
