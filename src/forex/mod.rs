//! Forex rates used to move between the local currency and USD.

pub mod provider;

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use strum::Display;

pub use provider::{FixedRateProvider, HttpRateProvider, RateProvider};

/// Where a rate table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RateSource {
    /// Fetched from the rate service during this request.
    Live,
    /// Static table used because the rate service failed.
    Fallback,
}

/// Currency code → units of that currency per USD.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, Decimal>,
    source: RateSource,
}

impl RateTable {
    /// Build a table, upper-casing codes and dropping non-positive rates.
    pub fn new(rates: impl IntoIterator<Item = (String, Decimal)>, source: RateSource) -> Self {
        let rates = rates
            .into_iter()
            .filter(|(_, rate)| *rate > Decimal::ZERO)
            .map(|(code, rate)| (code.to_uppercase(), rate))
            .collect();
        Self { rates, source }
    }

    /// Static table used whenever the rate service is unavailable.
    pub fn fallback() -> Self {
        Self::new(
            [
                ("INR".to_string(), Decimal::new(8350, 2)),
                ("AED".to_string(), Decimal::new(367, 2)),
                ("USD".to_string(), Decimal::ONE),
            ],
            RateSource::Fallback,
        )
    }

    /// Rate for a currency, if known.
    pub fn get(&self, currency: &str) -> Option<Decimal> {
        self.rates.get(&currency.to_uppercase()).copied()
    }

    /// Rate for a currency; unknown currencies are treated as USD-equivalent.
    pub fn rate_for(&self, currency: &str) -> Decimal {
        self.get(currency).unwrap_or(Decimal::ONE)
    }

    /// Where the rates came from.
    pub fn source(&self) -> RateSource {
        self.source
    }

    /// Number of currencies in the table.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fallback_table_values() {
        let table = RateTable::fallback();
        assert_eq!(table.get("INR"), Some(dec!(83.50)));
        assert_eq!(table.get("AED"), Some(dec!(3.67)));
        assert_eq!(table.get("USD"), Some(dec!(1)));
        assert_eq!(table.source(), RateSource::Fallback);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn unknown_currency_defaults_to_one() {
        let table = RateTable::fallback();
        assert_eq!(table.get("XYZ"), None);
        assert_eq!(table.rate_for("XYZ"), Decimal::ONE);
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let table = RateTable::new([("eur".to_string(), dec!(0.92))], RateSource::Live);
        assert_eq!(table.rate_for("EUR"), dec!(0.92));
        assert_eq!(table.rate_for("eur"), dec!(0.92));
    }

    #[test]
    fn non_positive_rates_are_dropped() {
        let table = RateTable::new(
            [
                ("AAA".to_string(), dec!(0)),
                ("BBB".to_string(), dec!(-1)),
                ("CCC".to_string(), dec!(2)),
            ],
            RateSource::Live,
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.rate_for("AAA"), Decimal::ONE);
    }
}
