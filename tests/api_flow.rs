//! End-to-end tests through the HTTP router with in-process venues.
//!
//! No network access: venues are mocks and forex rates come from a fixed table.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use crypto_arb::api::{create_router, AppState, RateLimiter, RATE_LIMIT_MESSAGE};
use crypto_arb::arbitrage::{ArbitrageEngine, FeeSchedule, RequestDefaults};
use crypto_arb::forex::{FixedRateProvider, RateSource, RateTable};
use crypto_arb::venue::{MockPriceSource, VenueRegistry};

fn app(registry: VenueRegistry, max_requests: u32) -> Router {
    let engine = ArbitrageEngine::new(
        registry,
        Arc::new(FixedRateProvider::fallback()),
        FeeSchedule::standard(),
        "USDT",
        Duration::from_millis(250),
    );
    let state = AppState::new(
        engine,
        RequestDefaults::default(),
        RateLimiter::new(max_requests, Duration::from_secs(60)),
    );
    create_router(state)
}

fn five_venues() -> VenueRegistry {
    VenueRegistry::new()
        .with_source(MockPriceSource::with_price("binance", dec!(64010.00)))
        .with_source(MockPriceSource::with_price("bybit", dec!(64100.00)))
        .with_source(MockPriceSource::with_price("okx", dec!(63950.00)))
        .with_source(MockPriceSource::failing("kucoin"))
        .with_source(MockPriceSource::hanging("gateio"))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn full_report_with_partial_venue_failures() {
    let start = Instant::now();
    let (status, body) = get(
        app(five_venues(), 50),
        "/api/v1/arbitrage/btc?amount=100000&currency=inr&forex_fee=2.5",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // hanging venue is cut off at the timeout
    assert!(start.elapsed() < Duration::from_secs(2));

    assert_eq!(
        body["config"],
        json!({
            "coin": "BTC",
            "investment": "100000 INR",
            "applied_forex_fee": "2.5%",
            "forex_source": "fallback",
        })
    );
    assert_eq!(
        body["input_summary"],
        json!({
            "initial_investment": "100000 INR",
            "converted_to_usdt": "1167.66 USDT",
        })
    );
    assert_eq!(
        body["arbitrage_deal"],
        json!({
            "route": "Buy on OKX ➔ Sell on BYBIT",
            "buy_price": "$63950",
            "sell_price": "$64100",
            "gross_gap": "0.23%",
        })
    );
    assert_eq!(
        body["execution_checklist"],
        json!([
            "1. Buy USDT using your local bank (Est. 2.5% fee applied)",
            "2. Transfer USDT to okx",
            "3. Execute trade and transfer to bybit",
            "4. Convert back to local currency and withdraw",
            "Note: 1% withholding tax is included in local profit calculation.",
        ])
    );

    let scan = body["market_scan"].as_array().unwrap();
    let statuses: Vec<&str> = scan.iter().map(|e| e["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["success", "success", "success", "error", "error"]);
    assert!(scan[4]["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn defaults_apply_when_query_is_missing() {
    let (status, body) = get(app(five_venues(), 50), "/api/v1/arbitrage/ETH").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["coin"], "ETH");
    assert_eq!(body["config"]["investment"], "100000 INR");
    assert_eq!(body["config"]["applied_forex_fee"], "2.5%");
}

#[tokio::test]
async fn standard_exit_note_for_currency_without_extra_fee() {
    let (status, body) = get(
        app(five_venues(), 50),
        "/api/v1/arbitrage/BTC?amount=5000&currency=AED&forex_fee=1",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["execution_checklist"][4], "Note: Standard exit fees applied.");
    assert!(body["profit_loss_report"]["net_local_profit"]
        .as_str()
        .unwrap()
        .ends_with(" AED"));
}

#[tokio::test]
async fn insufficient_market_data_is_500() {
    let registry = VenueRegistry::new()
        .with_source(MockPriceSource::with_price("binance", dec!(1)))
        .with_source(MockPriceSource::failing("bybit"))
        .with_source(MockPriceSource::hanging("okx"));

    let (status, body) = get(app(registry, 50), "/api/v1/arbitrage/NOPE").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Not enough market data"));
}

#[tokio::test]
async fn invalid_inputs_are_400() {
    for uri in [
        "/api/v1/arbitrage/BTC?amount=-10",
        "/api/v1/arbitrage/BTC?amount=abc",
        "/api/v1/arbitrage/BTC?currency=EURO",
        "/api/v1/arbitrage/BTC?forex_fee=150",
        "/api/v1/arbitrage/B%24C",
    ] {
        let (status, body) = get(app(five_venues(), 50), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{}", uri);
    }
}

#[tokio::test]
async fn rate_limit_returns_429_with_retry_after() {
    let registry = VenueRegistry::new()
        .with_source(MockPriceSource::with_price("binance", dec!(10)))
        .with_source(MockPriceSource::with_price("okx", dec!(11)));
    let app = app(registry, 2);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/arbitrage/BTC")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/arbitrage/BTC")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": RATE_LIMIT_MESSAGE }));

    // health stays reachable
    let (status, _) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn live_rate_table_is_reported() {
    let engine = ArbitrageEngine::new(
        VenueRegistry::new()
            .with_source(MockPriceSource::with_price("binance", dec!(100)))
            .with_source(MockPriceSource::with_price("okx", dec!(102))),
        Arc::new(FixedRateProvider::new(RateTable::new(
            [("EUR".to_string(), dec!(0.92))],
            RateSource::Live,
        ))),
        FeeSchedule::standard(),
        "USDT",
        Duration::from_millis(250),
    );
    let state = AppState::new(
        engine,
        RequestDefaults::default(),
        RateLimiter::new(50, Duration::from_secs(60)),
    );

    let (status, body) = get(
        create_router(state),
        "/api/v1/arbitrage/BTC?amount=920&currency=EUR&forex_fee=0",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["forex_source"], "live");
    assert_eq!(body["input_summary"]["converted_to_usdt"], "1000.00 USDT");
    assert_eq!(body["arbitrage_deal"]["gross_gap"], "2.00%");
}
