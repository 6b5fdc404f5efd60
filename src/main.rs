//! Cross-exchange crypto arbitrage calculator entry point.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::Decimal;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crypto_arb::api::{create_router, AppState, RateLimiter};
use crypto_arb::arbitrage::{ArbitrageEngine, ArbitrageRequest, RequestDefaults};
use crypto_arb::config::Config;
use crypto_arb::metrics;
use crypto_arb::scanner::scan_venues;
use crypto_arb::utils::shutdown_signal;

/// Cross-exchange crypto arbitrage calculator.
#[derive(Parser, Debug)]
#[command(name = "crypto-arb")]
#[command(about = "Scans exchanges for the best buy/sell spread and reports projected profit")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Evaluate one coin from the command line and print the report.
    Scan {
        /// Coin symbol, e.g. BTC.
        coin: String,

        /// Principal in local currency.
        #[arg(short, long)]
        amount: Option<Decimal>,

        /// Local currency code.
        #[arg(short, long)]
        currency: Option<String>,

        /// Forex fee in percent.
        #[arg(short, long)]
        forex_fee: Option<Decimal>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Ask every configured venue for a price and print the results.
    CheckVenues {
        /// Coin symbol to price.
        #[arg(default_value = "BTC")]
        coin: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("crypto_arb=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Handle subcommands
    match args.command {
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        Some(Command::Scan {
            coin,
            amount,
            currency,
            forex_fee,
        }) => cmd_scan(coin, amount, currency, forex_fee).await,
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::CheckVenues { coin }) => cmd_check_venues(coin).await,
        None => cmd_serve(args.port).await,
    }
}

fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("crypto-arb/", env!("CARGO_PKG_VERSION")))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()?)
}

fn build_engine(config: &Config) -> anyhow::Result<ArbitrageEngine> {
    ArbitrageEngine::from_config(config, http_client()?).map_err(|e| anyhow::anyhow!(e))
}

async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = load_config()?;
    if let Some(port) = port_override {
        config.port = port;
    }

    // Initialize metrics
    let prometheus = PrometheusBuilder::new().install_recorder()?;
    metrics::init_metrics();

    let engine = build_engine(&config)?;
    info!("Configuration loaded successfully");
    info!("Venues: {}", engine.registry().ids().join(", "));
    info!("Quote asset: {}", engine.quote_asset());
    info!("Venue timeout: {}ms", config.venue_timeout_ms);
    info!(
        "Rate limit: {} requests / {}s",
        config.rate_limit_max_requests, config.rate_limit_window_secs
    );

    let limiter = RateLimiter::from_config(&config);
    let app_state = AppState::new(engine, RequestDefaults::from_config(&config), limiter.clone())
        .with_metrics(prometheus);

    // Expire idle rate-limit windows
    let cleanup_every = limiter.window();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_every);
        loop {
            interval.tick().await;
            limiter.cleanup();
        }
    });

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    info!(
        "Try: http://localhost:{}/api/v1/arbitrage/BTC?amount=100000&currency=INR&forex_fee=2",
        config.port
    );

    let router = create_router(app_state);
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn cmd_scan(
    coin: String,
    amount: Option<Decimal>,
    currency: Option<String>,
    forex_fee: Option<Decimal>,
) -> anyhow::Result<()> {
    let config = load_config()?;
    let defaults = RequestDefaults::from_config(&config);
    let engine = build_engine(&config)?;

    let request = ArbitrageRequest::new(
        coin,
        amount.unwrap_or(defaults.amount),
        currency.unwrap_or(defaults.currency),
        forex_fee.unwrap_or(defaults.forex_fee_pct),
    );

    let report = engine.evaluate(request).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CRYPTO ARB - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    let venues = config.venue_list().map_err(|e| anyhow::anyhow!(e))?;
    let exit_fees = config.exit_fee_table().map_err(|e| anyhow::anyhow!(e))?;

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Port: {}", config.port);
    println!(
        "  Venues: {}",
        venues.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
    );
    println!("  Quote Asset: {}", config.quote_asset_upper());
    println!("  Venue Timeout: {}ms", config.venue_timeout_ms);
    println!("  Forex API: {}", config.forex_api_url);
    println!("  Forex Timeout: {}ms", config.forex_timeout_ms);
    println!("  Default Amount: {}", config.default_amount);
    println!("  Default Currency: {}", config.default_currency);
    println!("  Default Forex Fee: {}%", config.default_forex_fee);
    let mut exit_fees: Vec<_> = exit_fees.into_iter().collect();
    exit_fees.sort();
    for (currency, pct) in exit_fees {
        println!("  Extra Exit Fee: {} {}%", currency, pct);
    }
    println!(
        "  Rate Limit: {} requests / {}s",
        config.rate_limit_max_requests, config.rate_limit_window_secs
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

async fn cmd_check_venues(coin: String) -> anyhow::Result<()> {
    let config = load_config()?;
    let engine = build_engine(&config)?;
    let coin = coin.trim().to_uppercase();

    println!("======================================================================");
    println!("CRYPTO ARB - VENUE CHECK ({}/{})", coin, engine.quote_asset());
    println!("======================================================================");

    let quotes = scan_venues(
        engine.registry(),
        &coin,
        engine.quote_asset(),
        config.venue_timeout(),
    )
    .await;

    let mut healthy = 0;
    for quote in &quotes {
        match quote.price {
            Some(price) if quote.is_success() => {
                healthy += 1;
                println!("  {:<10} OK      {:>16}  ({}ms)", quote.venue_id, price, quote.latency_ms);
            }
            _ => {
                println!(
                    "  {:<10} FAILED  {}  ({}ms)",
                    quote.venue_id,
                    quote.error.as_deref().unwrap_or("unknown error"),
                    quote.latency_ms
                );
            }
        }
    }

    println!("----------------------------------------------------------------------");
    println!("{} of {} venues reported a price", healthy, quotes.len());
    println!("======================================================================");

    if healthy < 2 {
        warn!("Fewer than two venues are reachable; arbitrage requests will fail");
    }

    Ok(())
}
