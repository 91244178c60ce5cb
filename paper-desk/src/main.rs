mod catalog;

use anyhow::Result;
use clap::Parser;
use paper_engine::engine::Engine;
use paper_engine::feed::PriceFeed;
use paper_engine::models::{Command, InstrumentId, OrderKind, Side};
use paper_engine::service::{TradingHandle, TradingService};
use paper_engine::session::MarketCalendar;
use paper_engine::store::StateStore;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Durable per-user state file
    #[arg(long, default_value = "paper-state.json")]
    state_file: PathBuf,

    /// Starting cash for a fresh account
    #[arg(long, default_value_t = 1_000_000.0)]
    initial_cash: f64,

    /// Seconds between simulated price ticks
    #[arg(long, default_value_t = 3)]
    tick_secs: u64,

    /// Trade only during NSE hours (09:15-15:30 IST, Mon-Fri) instead
    /// of the always-open demo session
    #[arg(long)]
    ist_hours: bool,

    /// Seed for a reproducible price walk
    #[arg(long)]
    seed: Option<u64>,

    /// Run a small scripted order flow on a fresh account
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    log::info!("=== Paper Desk Starting ===");

    let calendar = if args.ist_hours {
        MarketCalendar::IstEquity
    } else {
        MarketCalendar::AlwaysOpen
    };
    let feed = match args.seed {
        Some(seed) => PriceFeed::seeded(seed),
        None => PriceFeed::new(),
    };

    let store = StateStore::new(&args.state_file);
    let saved = store.load()?;
    let fresh = saved.is_none();
    let engine = match saved {
        Some(snapshot) => {
            log::info!("restored state from {}", args.state_file.display());
            Engine::restore(snapshot, calendar, Box::new(feed), args.initial_cash)
        }
        None => {
            log::info!(
                "fresh account: \u{20b9}{:.2} cash, {} instruments",
                args.initial_cash,
                catalog::default_market().len()
            );
            Engine::new(
                catalog::default_market(),
                calendar,
                Box::new(feed),
                args.initial_cash,
            )
        }
    };

    let handle = TradingService::spawn(engine, store, Some(Duration::from_secs(args.tick_secs)));

    let mut notifications = handle.subscribe();
    tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(n) => log::info!("[{:?}] {} - {}", n.severity, n.title, n.description),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    log::warn!("notification printer lagged; {} dropped", missed)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    if args.demo && fresh {
        run_demo(&handle).await?;
    }

    log::info!("session running; Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    log::info!("shutting down");
    Ok(())
}

/// A fresh-account walkthrough: watch a symbol, buy at market, then
/// work a sell just above the current price for the ticks to chase.
async fn run_demo(handle: &TradingHandle) -> Result<()> {
    let reliance = InstrumentId::new("reliance");

    handle
        .command(Command::AddToWatchlist {
            instrument_id: reliance.clone(),
        })
        .await?;

    match handle
        .place_order(Side::Buy, OrderKind::Market, reliance.clone(), 10)
        .await?
    {
        Ok(order) => log::info!("demo buy admitted as {}", order.id()),
        Err(reason) => {
            log::warn!("demo buy rejected: {}", reason);
            return Ok(());
        }
    }

    let snapshot = handle.snapshot().await?;
    if let Some(quote) = snapshot.market.quote(&reliance) {
        let limit = (quote.current_price * 1.01 * 100.0).round() / 100.0;
        let placed = handle
            .place_order(Side::Sell, OrderKind::Limit { price: limit }, reliance, 5)
            .await?;
        if let Ok(order) = placed {
            log::info!("demo sell working at \u{20b9}{:.2} as {}", limit, order.id());
        }
    }
    Ok(())
}
