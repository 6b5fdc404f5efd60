//! Profit and cost calculations for a single buy/sell venue pair.

use rust_decimal::Decimal;

use super::fees::{FeeSchedule, CRYPTO_FEE_RATE};
use crate::error::ArbitrageError;
use crate::forex::RateTable;
use crate::scanner::MIN_VENUES;
use crate::venue::VenueQuote;

/// Best buy/sell pair and the money flowing through it.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrageResult {
    /// Venue with the lowest price.
    pub buy_venue: String,
    /// Venue with the highest price.
    pub sell_venue: String,
    /// Price paid on the buy venue.
    pub buy_price: Decimal,
    /// Price received on the sell venue.
    pub sell_price: Decimal,
    /// Raw spread between the two venues, in percent of the buy price.
    pub gross_gap_pct: Decimal,
    /// Stablecoin bought with the principal after the forex fee.
    pub stable_in: Decimal,
    /// Stablecoin held after the round trip and crypto fees.
    pub stable_out: Decimal,
    /// `stable_out - stable_in`.
    pub net_profit_stable: Decimal,
    /// Local currency received after exit fees.
    pub final_local: Decimal,
    /// `final_local - principal`.
    pub net_profit_local: Decimal,
    /// Return on the principal, in percent.
    pub roi_pct: Decimal,
    /// Total exit fee applied, in percent.
    pub exit_fee_pct: Decimal,
    /// Currency-specific part of the exit fee, in percent.
    pub extra_exit_fee_pct: Decimal,
}

impl ArbitrageResult {
    /// Whether the round trip ends with more local currency than it started.
    pub fn is_profitable(&self) -> bool {
        self.net_profit_local > Decimal::ZERO
    }
}

fn pct_to_rate(pct: Decimal) -> Result<Decimal, ArbitrageError> {
    pct.checked_div(Decimal::ONE_HUNDRED)
        .ok_or(ArbitrageError::Overflow("percent conversion"))
}

/// Convert a local principal into stablecoin, net of the forex fee.
///
/// `stable = principal / rate * (1 - forex_fee_pct / 100)`.
pub fn convert_to_stable(
    principal: Decimal,
    rate: Decimal,
    forex_fee_pct: Decimal,
) -> Result<Decimal, ArbitrageError> {
    let keep = Decimal::ONE - pct_to_rate(forex_fee_pct)?;
    principal
        .checked_div(rate)
        .and_then(|usd| usd.checked_mul(keep))
        .ok_or(ArbitrageError::Overflow("principal conversion"))
}

/// Pick the cheapest venue to buy on and the dearest to sell on.
///
/// Candidates are ordered by (price, venue id); buy is the first and sell
/// the last, so the two are always distinct venues.
pub fn select_venues(quotes: &[VenueQuote]) -> Result<(&VenueQuote, &VenueQuote), ArbitrageError> {
    let mut priced: Vec<(&VenueQuote, Decimal)> = quotes
        .iter()
        .filter_map(|q| q.price.filter(|_| q.is_success()).map(|p| (q, p)))
        .collect();

    if priced.len() < MIN_VENUES {
        return Err(ArbitrageError::InsufficientMarketData {
            available: priced.len(),
            required: MIN_VENUES,
        });
    }

    priced.sort_by(|(qa, pa), (qb, pb)| pa.cmp(pb).then_with(|| qa.venue_id.cmp(&qb.venue_id)));

    match (priced.first(), priced.last()) {
        (Some((buy, _)), Some((sell, _))) => Ok((*buy, *sell)),
        _ => Err(ArbitrageError::InsufficientMarketData {
            available: 0,
            required: MIN_VENUES,
        }),
    }
}

/// Compute the best round trip for `principal` units of `currency`.
pub fn compute_arbitrage(
    quotes: &[VenueQuote],
    principal: Decimal,
    currency: &str,
    rates: &RateTable,
    forex_fee_pct: Decimal,
    fees: &FeeSchedule,
) -> Result<ArbitrageResult, ArbitrageError> {
    let (buy, sell) = select_venues(quotes)?;
    let buy_price = buy.price.unwrap_or_default();
    let sell_price = sell.price.unwrap_or_default();

    let rate = rates.rate_for(currency);
    let stable_in = convert_to_stable(principal, rate, forex_fee_pct)?;

    let stable_out = stable_in
        .checked_div(buy_price)
        .and_then(|coins| coins.checked_mul(sell_price))
        .and_then(|gross| gross.checked_mul(Decimal::ONE - CRYPTO_FEE_RATE))
        .ok_or(ArbitrageError::Overflow("crypto leg"))?;

    let extra_exit_fee_pct = fees.extra_exit_fee_pct(currency);
    let exit_fee_pct = forex_fee_pct + extra_exit_fee_pct;
    let keep_on_exit = Decimal::ONE - pct_to_rate(exit_fee_pct)?;

    let final_local = stable_out
        .checked_mul(rate)
        .and_then(|local| local.checked_mul(keep_on_exit))
        .ok_or(ArbitrageError::Overflow("exit conversion"))?;

    let net_profit_local = final_local - principal;
    let roi_pct = net_profit_local
        .checked_div(principal)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(ArbitrageError::Overflow("roi"))?;

    let gross_gap_pct = (sell_price - buy_price)
        .checked_div(buy_price)
        .and_then(|g| g.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(ArbitrageError::Overflow("gross gap"))?;

    Ok(ArbitrageResult {
        buy_venue: buy.venue_id.clone(),
        sell_venue: sell.venue_id.clone(),
        buy_price,
        sell_price,
        gross_gap_pct,
        stable_in,
        stable_out,
        net_profit_stable: stable_out - stable_in,
        final_local,
        net_profit_local,
        roi_pct,
        exit_fee_pct,
        extra_exit_fee_pct,
    })
}
