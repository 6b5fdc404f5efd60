//! JSON report returned for one arbitrage evaluation.

use rust_decimal::Decimal;
use serde::Serialize;

use super::calculator::ArbitrageResult;
use crate::forex::RateSource;
use crate::utils::{fmt2, fmt_pct, fmt_plain};
use crate::venue::{QuoteStatus, VenueQuote};

/// Full report, serialized as the API response body.
#[derive(Debug, Clone, Serialize)]
pub struct ArbitrageReport {
    pub config: ReportConfig,
    pub input_summary: InputSummary,
    pub arbitrage_deal: ArbitrageDeal,
    pub profit_loss_report: ProfitLossReport,
    pub execution_checklist: Vec<String>,
    pub market_scan: Vec<MarketScanEntry>,
}

/// Request parameters as applied.
#[derive(Debug, Clone, Serialize)]
pub struct ReportConfig {
    pub coin: String,
    /// e.g. `100000 INR`.
    pub investment: String,
    /// e.g. `2.5%`.
    pub applied_forex_fee: String,
    pub forex_source: RateSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputSummary {
    pub initial_investment: String,
    /// e.g. `1167.66 USDT`.
    pub converted_to_usdt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArbitrageDeal {
    /// e.g. `Buy on BINANCE ➔ Sell on OKX`.
    pub route: String,
    pub buy_price: String,
    pub sell_price: String,
    pub gross_gap: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfitLossReport {
    pub net_usdt_profit: String,
    pub net_local_profit: String,
    pub roi_percentage: String,
}

/// One venue's outcome in the scan.
#[derive(Debug, Clone, Serialize)]
pub struct MarketScanEntry {
    pub venue: String,
    pub status: QuoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&VenueQuote> for MarketScanEntry {
    fn from(quote: &VenueQuote) -> Self {
        Self {
            venue: quote.venue_id.clone(),
            status: quote.status,
            price: quote.price.map(fmt_plain),
            latency_ms: quote.latency_ms,
            error: quote.error.clone(),
        }
    }
}

/// Request-side values the report echoes back.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub coin: &'a str,
    pub amount: Decimal,
    pub currency: &'a str,
    pub forex_fee_pct: Decimal,
    pub forex_source: RateSource,
    pub quote_asset: &'a str,
}

/// Shape a calculation and its scan into the report.
pub fn format_report(
    ctx: &ReportContext<'_>,
    result: &ArbitrageResult,
    scan: &[VenueQuote],
) -> ArbitrageReport {
    let investment = format!("{} {}", fmt_plain(ctx.amount), ctx.currency);
    let forex_fee = fmt_plain(ctx.forex_fee_pct);

    let exit_note = if result.extra_exit_fee_pct > Decimal::ZERO {
        format!(
            "Note: {}% withholding tax is included in local profit calculation.",
            fmt_plain(result.extra_exit_fee_pct)
        )
    } else {
        "Note: Standard exit fees applied.".to_string()
    };

    ArbitrageReport {
        config: ReportConfig {
            coin: ctx.coin.to_string(),
            investment: investment.clone(),
            applied_forex_fee: format!("{}%", forex_fee),
            forex_source: ctx.forex_source,
        },
        input_summary: InputSummary {
            initial_investment: investment,
            converted_to_usdt: format!("{} {}", fmt2(result.stable_in), ctx.quote_asset),
        },
        arbitrage_deal: ArbitrageDeal {
            route: format!(
                "Buy on {} ➔ Sell on {}",
                result.buy_venue.to_uppercase(),
                result.sell_venue.to_uppercase()
            ),
            buy_price: format!("${}", fmt_plain(result.buy_price)),
            sell_price: format!("${}", fmt_plain(result.sell_price)),
            gross_gap: fmt_pct(result.gross_gap_pct),
        },
        profit_loss_report: ProfitLossReport {
            net_usdt_profit: format!("{} {}", fmt2(result.net_profit_stable), ctx.quote_asset),
            net_local_profit: format!("{} {}", fmt2(result.net_profit_local), ctx.currency),
            roi_percentage: fmt_pct(result.roi_pct),
        },
        execution_checklist: vec![
            format!(
                "1. Buy {} using your local bank (Est. {}% fee applied)",
                ctx.quote_asset, forex_fee
            ),
            format!("2. Transfer {} to {}", ctx.quote_asset, result.buy_venue),
            format!("3. Execute trade and transfer to {}", result.sell_venue),
            "4. Convert back to local currency and withdraw".to_string(),
            exit_note,
        ],
        market_scan: scan.iter().map(MarketScanEntry::from).collect(),
    }
}
