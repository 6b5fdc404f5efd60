//! Shared helpers: shutdown handling and display formatting for money.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::info;

/// Resolve when the process receives Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

/// Round to 2 decimal places, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // avoid "-0.00"
    if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    }
}

/// Format with exactly 2 decimal places.
pub fn fmt2(value: Decimal) -> String {
    format!("{:.2}", round2(value))
}

/// Format a percentage with 2 decimal places, e.g. `1.25%`.
pub fn fmt_pct(value: Decimal) -> String {
    format!("{}%", fmt2(value))
}

/// Format a user-supplied number without trailing zeros, e.g. `2.50` → `2.5`.
pub fn fmt_plain(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn round2_is_half_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round2(dec!(1167.66467)), dec!(1167.66));
    }

    #[test]
    fn fmt2_pads_and_rounds() {
        assert_eq!(fmt2(dec!(3)), "3.00");
        assert_eq!(fmt2(dec!(-12.3456)), "-12.35");
        assert_eq!(fmt2(dec!(-0.001)), "0.00");
    }

    #[test]
    fn fmt_pct_appends_sign() {
        assert_eq!(fmt_pct(dec!(0.15625)), "0.16%");
    }

    #[test]
    fn fmt_plain_trims_zeros() {
        assert_eq!(fmt_plain(dec!(2.50)), "2.5");
        assert_eq!(fmt_plain(dec!(100000)), "100000");
        assert_eq!(fmt_plain(dec!(64000.01000000)), "64000.01");
    }
}
