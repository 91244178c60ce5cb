use super::*;
use crate::feed::{apply_price, PriceFeed, TickSource};
use crate::models::{Instrument, MarketEntry, OrderStatus, Quote, Severity};
use std::collections::VecDeque;

/// Replays a fixed script of price moves, one step per tick. Steps are
/// (instrument id, new price) pairs; quotes move exactly the way the
/// random feed moves them.
struct ScriptedFeed {
    steps: VecDeque<Vec<(String, f64)>>,
}

impl ScriptedFeed {
    fn new(steps: Vec<Vec<(&str, f64)>>) -> Self {
        Self {
            steps: steps
                .into_iter()
                .map(|step| {
                    step.into_iter()
                        .map(|(id, price)| (id.to_string(), price))
                        .collect()
                })
                .collect(),
        }
    }
}

impl TickSource for ScriptedFeed {
    fn apply_tick(&mut self, board: &mut MarketBoard) {
        let Some(step) = self.steps.pop_front() else {
            return;
        };
        for (id, price) in step {
            let id = InstrumentId::new(id);
            if let Some(entry) = board
                .entries_mut()
                .iter_mut()
                .find(|e| *e.instrument.id() == id)
            {
                apply_price(&mut entry.quote, price);
            }
        }
    }
}

fn entry(id: &str, price: f64) -> MarketEntry {
    MarketEntry {
        instrument: Instrument::new(
            id,
            id.to_uppercase(),
            "NSE",
            format!("{} Ltd", id.to_uppercase()),
            "Diversified",
        ),
        quote: Quote::opening(price, price, 1_000_000),
    }
}

fn board(prices: &[(&str, f64)]) -> MarketBoard {
    MarketBoard::new(prices.iter().map(|(id, p)| entry(id, *p)).collect())
}

fn create_test_engine(prices: &[(&str, f64)], cash: f64) -> Engine {
    Engine::new(
        board(prices),
        MarketCalendar::AlwaysOpen,
        Box::new(PriceFeed::seeded(0)),
        cash,
    )
}

fn scripted_engine(prices: &[(&str, f64)], cash: f64, steps: Vec<Vec<(&str, f64)>>) -> Engine {
    Engine::new(
        board(prices),
        MarketCalendar::AlwaysOpen,
        Box::new(ScriptedFeed::new(steps)),
        cash,
    )
}

fn id(s: &str) -> InstrumentId {
    InstrumentId::new(s)
}

#[test]
fn test_market_buy_fills_on_matching_pass() {
    let mut engine = create_test_engine(&[("reliance", 100.0)], 1_000_000.0);

    let placed = engine
        .place_order(Side::Buy, OrderKind::Market, id("reliance"), 10)
        .expect("order should be admitted");
    // The placement result is the admitted (pending) order.
    assert!(placed.is_pending());

    // The matching pass right after placement filled it.
    assert_eq!(engine.cash(), 999_000.0);
    let holding = engine.ledger().holding(&id("reliance")).unwrap();
    assert_eq!(holding.quantity(), 10);
    assert!((holding.average_buy_price() - 100.0).abs() < 1e-9);
    assert!((holding.invested_amount() - 1_000.0).abs() < 1e-9);

    assert_eq!(engine.transactions().len(), 1);
    let txn = engine.transactions().recent().next().unwrap();
    assert_eq!(txn.side, Side::Buy);
    assert_eq!(txn.quantity, 10);
    assert!((txn.price - 100.0).abs() < 1e-9);
    assert!((txn.total - 1_000.0).abs() < 1e-9);

    let executed = engine.orders().get(placed.id()).unwrap();
    assert_eq!(executed.status(), OrderStatus::Executed);
    assert_eq!(executed.executed_price(), Some(100.0));
    assert!(executed.executed_at().is_some());
}

#[test]
fn test_sell_limit_waits_for_trigger_and_fills_at_live_price() {
    let mut engine = scripted_engine(
        &[("reliance", 100.0)],
        1_000_000.0,
        vec![vec![("reliance", 105.0)], vec![("reliance", 112.0)]],
    );

    engine
        .place_order(Side::Buy, OrderKind::Market, id("reliance"), 10)
        .unwrap();
    let cash_after_buy = engine.cash();

    let sell = engine
        .place_order(
            Side::Sell,
            OrderKind::Limit { price: 110.0 },
            id("reliance"),
            5,
        )
        .unwrap();
    assert!(engine.orders().get(sell.id()).unwrap().is_pending());

    // 105 < 110: the sell trigger (price >= limit) fails.
    engine.on_tick();
    assert!(engine.orders().get(sell.id()).unwrap().is_pending());

    // 112 >= 110: fills, and at the live 112, never at the limit 110.
    engine.on_tick();
    let filled = engine.orders().get(sell.id()).unwrap();
    assert_eq!(filled.status(), OrderStatus::Executed);
    assert_eq!(filled.executed_price(), Some(112.0));

    let holding = engine.ledger().holding(&id("reliance")).unwrap();
    assert_eq!(holding.quantity(), 5);
    assert!((holding.average_buy_price() - 100.0).abs() < 1e-9);
    assert!((holding.invested_amount() - 500.0).abs() < 1e-9);
    assert!((engine.cash() - (cash_after_buy + 560.0)).abs() < 1e-9);
}

#[test]
fn test_buy_rejected_on_insufficient_funds() {
    let mut engine = create_test_engine(&[("sbin", 50.0)], 100.0);

    let result = engine.place_order(Side::Buy, OrderKind::Market, id("sbin"), 10);
    assert_eq!(
        result,
        Err(OrderRejected::InsufficientFunds {
            required: 500.0,
            available: 100.0,
        })
    );
    // Rejected orders leave no record behind.
    assert!(engine.orders().is_empty());
    assert_eq!(engine.cash(), 100.0);
}

#[test]
fn test_sell_rejected_without_holding() {
    let mut engine = create_test_engine(&[("sbin", 50.0)], 10_000.0);

    let result = engine.place_order(Side::Sell, OrderKind::Market, id("sbin"), 5);
    assert_eq!(
        result,
        Err(OrderRejected::InsufficientShares {
            held: 0,
            requested: 5,
        })
    );
    assert!(engine.orders().is_empty());
}

#[test]
fn test_cancel_before_tick_keeps_ledger_untouched() {
    let mut engine = scripted_engine(
        &[("reliance", 100.0)],
        1_000_000.0,
        vec![vec![("reliance", 85.0)]],
    );

    // Pending at 100: the buy trigger (price <= 90) fails.
    let order = engine
        .place_order(
            Side::Buy,
            OrderKind::Limit { price: 90.0 },
            id("reliance"),
            10,
        )
        .unwrap();

    engine.cancel_order(order.id()).expect("cancel should land");
    assert_eq!(
        engine.orders().get(order.id()).unwrap().status(),
        OrderStatus::Canceled
    );

    // The tick moves the price through the old trigger; a canceled
    // order must never come back to life.
    engine.on_tick();
    assert_eq!(
        engine.orders().get(order.id()).unwrap().status(),
        OrderStatus::Canceled
    );
    assert_eq!(engine.cash(), 1_000_000.0);
    assert!(engine.ledger().holdings().is_empty());
    assert!(engine.transactions().is_empty());
}

#[test]
fn test_admission_validations() {
    let mut engine = create_test_engine(&[("tcs", 3500.0)], 1_000_000.0);

    assert_eq!(
        engine.place_order(Side::Buy, OrderKind::Market, id("nope"), 1),
        Err(OrderRejected::UnknownInstrument)
    );
    assert_eq!(
        engine.place_order(Side::Buy, OrderKind::Market, id("tcs"), 0),
        Err(OrderRejected::InvalidQuantity)
    );
    assert_eq!(
        engine.place_order(Side::Buy, OrderKind::Limit { price: 0.0 }, id("tcs"), 1),
        Err(OrderRejected::InvalidLimitPrice)
    );
    assert_eq!(
        engine.place_order(
            Side::Buy,
            OrderKind::Limit { price: f64::NAN },
            id("tcs"),
            1
        ),
        Err(OrderRejected::InvalidLimitPrice)
    );
    assert!(engine.orders().is_empty());
}

#[test]
fn test_market_order_rejected_while_session_closed() {
    let mut engine = Engine::new(
        board(&[("tcs", 3500.0)]),
        MarketCalendar::AlwaysClosed,
        Box::new(PriceFeed::seeded(0)),
        1_000_000.0,
    );

    assert_eq!(
        engine.place_order(Side::Buy, OrderKind::Market, id("tcs"), 1),
        Err(OrderRejected::MarketClosed)
    );
    assert!(engine.orders().is_empty());
}

#[test]
fn test_limit_order_queues_across_closed_session() {
    let mut engine = Engine::new(
        board(&[("tcs", 100.0)]),
        MarketCalendar::AlwaysClosed,
        Box::new(ScriptedFeed::new(vec![vec![("tcs", 100.0)]])),
        1_000_000.0,
    );

    // Triggerable on paper (100 <= 150), but the session is closed:
    // admitted, withheld from matching.
    let order = engine
        .place_order(Side::Buy, OrderKind::Limit { price: 150.0 }, id("tcs"), 2)
        .unwrap();
    assert!(engine.orders().get(order.id()).unwrap().is_pending());

    // Ticks are suppressed entirely while closed.
    engine.on_tick();
    assert!(engine.orders().get(order.id()).unwrap().is_pending());
    assert!((engine.market().quote(&id("tcs")).unwrap().current_price - 100.0).abs() < 1e-9);

    // Session opens; the queued order fills on the next tick.
    engine.set_calendar(MarketCalendar::AlwaysOpen);
    engine.on_tick();
    assert_eq!(
        engine.orders().get(order.id()).unwrap().status(),
        OrderStatus::Executed
    );
}

#[test]
fn test_pending_orders_fill_in_creation_order() {
    let mut engine = scripted_engine(
        &[("sbin", 100.0)],
        10_000.0,
        vec![vec![("sbin", 90.0)]],
    );

    // Two buy limits sharing one trigger; distinct quantities so the
    // fill order is visible in the log.
    engine
        .place_order(Side::Buy, OrderKind::Limit { price: 95.0 }, id("sbin"), 3)
        .unwrap();
    engine
        .place_order(Side::Buy, OrderKind::Limit { price: 95.0 }, id("sbin"), 7)
        .unwrap();

    engine.on_tick();

    let recent: Vec<u64> = engine.transactions().recent().map(|t| t.quantity).collect();
    // Newest first: the qty-7 order filled second.
    assert_eq!(recent, vec![7, 3]);
}

#[test]
fn test_cancel_is_idempotent_and_terminal_states_absorb() {
    let mut engine = create_test_engine(&[("tcs", 100.0)], 1_000_000.0);

    let order = engine
        .place_order(Side::Buy, OrderKind::Limit { price: 50.0 }, id("tcs"), 1)
        .unwrap();

    assert!(engine.cancel_order(order.id()).is_ok());
    // Second cancel: same terminal state, reported as such.
    assert_eq!(
        engine.cancel_order(order.id()),
        Err(OrderNotCancelable::AlreadyTerminal(OrderStatus::Canceled))
    );
    assert_eq!(
        engine.orders().get(order.id()).unwrap().status(),
        OrderStatus::Canceled
    );

    // Executed orders are just as absorbing.
    let executed = engine
        .place_order(Side::Buy, OrderKind::Market, id("tcs"), 1)
        .unwrap();
    assert_eq!(
        engine.cancel_order(executed.id()),
        Err(OrderNotCancelable::AlreadyTerminal(OrderStatus::Executed))
    );

    assert_eq!(
        engine.cancel_order(Uuid::new_v4()),
        Err(OrderNotCancelable::UnknownOrder)
    );
}

#[test]
fn test_oversell_at_execution_is_skipped_not_clamped() {
    // Doctored snapshot: a pending sell for 10 against a holding of 5.
    // Admission can't produce this; the matching pass must survive it.
    let mut ledger = Ledger::new(1_000.0);
    ledger.apply_buy(&id("sbin"), "SBIN", 5, 100.0);
    let cash_before = ledger.cash();

    let mut orders = OrderBook::default();
    orders.admit(Order::new(
        Side::Sell,
        OrderKind::Market,
        id("sbin"),
        "SBIN",
        10,
        Utc::now(),
    ));
    let bad_id = orders.pending_ids()[0];

    let snapshot = StateSnapshot {
        ledger,
        orders,
        transactions: TransactionLog::default(),
        watchlist: Watchlist::default(),
        alerts: AlertBook::default(),
        market: board(&[("sbin", 100.0)]),
        session_open: true,
    };
    let mut engine = Engine::restore(
        snapshot,
        MarketCalendar::AlwaysOpen,
        Box::new(ScriptedFeed::new(vec![vec![("sbin", 100.0)]])),
        1_000.0,
    );

    engine.on_tick();

    // The violation was skipped: order still pending, ledger untouched.
    assert!(engine.orders().get(bad_id).unwrap().is_pending());
    assert_eq!(engine.ledger().held_quantity(&id("sbin")), 5);
    assert!((engine.cash() - cash_before).abs() < 1e-9);
    assert!(engine.transactions().is_empty());

    // Later orders still process past the bad one.
    let good = engine
        .place_order(Side::Buy, OrderKind::Market, id("sbin"), 1)
        .unwrap();
    assert_eq!(
        engine.orders().get(good.id()).unwrap().status(),
        OrderStatus::Executed
    );
}

#[test]
fn test_weighted_average_blends_buys_and_survives_sells() {
    let mut engine = scripted_engine(
        &[("tcs", 100.0)],
        1_000_000.0,
        vec![vec![("tcs", 200.0)], vec![("tcs", 150.0)]],
    );

    engine
        .place_order(Side::Buy, OrderKind::Market, id("tcs"), 10)
        .unwrap();
    engine.on_tick(); // 200
    engine
        .place_order(Side::Buy, OrderKind::Market, id("tcs"), 10)
        .unwrap();

    let holding = engine.ledger().holding(&id("tcs")).unwrap();
    assert_eq!(holding.quantity(), 20);
    assert!((holding.invested_amount() - 3_000.0).abs() < 1e-9);
    assert!((holding.average_buy_price() - 150.0).abs() < 1e-9);
    // The defining identity of the weighted-average method.
    assert!(
        (holding.average_buy_price() - holding.invested_amount() / holding.quantity() as f64)
            .abs()
            < 1e-9
    );

    engine.on_tick(); // 150
    let cash_before = engine.cash();
    engine
        .place_order(Side::Sell, OrderKind::Market, id("tcs"), 5)
        .unwrap();

    let holding = engine.ledger().holding(&id("tcs")).unwrap();
    assert_eq!(holding.quantity(), 15);
    // Basis scales with remaining shares; the average is untouched.
    assert!((holding.invested_amount() - 2_250.0).abs() < 1e-9);
    assert!((holding.average_buy_price() - 150.0).abs() < 1e-9);
    assert!((engine.cash() - (cash_before + 750.0)).abs() < 1e-9);
}

#[test]
fn test_holding_is_removed_at_zero_quantity() {
    let mut engine = create_test_engine(&[("sbin", 50.0)], 10_000.0);

    engine
        .place_order(Side::Buy, OrderKind::Market, id("sbin"), 10)
        .unwrap();
    engine
        .place_order(Side::Sell, OrderKind::Market, id("sbin"), 10)
        .unwrap();

    assert!(engine.ledger().holdings().is_empty());
    assert_eq!(engine.cash(), 10_000.0);
    assert_eq!(engine.transactions().len(), 2);
}

#[test]
fn test_every_executed_order_has_exactly_one_transaction() {
    let mut engine = scripted_engine(
        &[("sbin", 100.0), ("tcs", 3_500.0)],
        1_000_000.0,
        vec![vec![("sbin", 99.0), ("tcs", 3_510.0)]],
    );

    engine
        .place_order(Side::Buy, OrderKind::Market, id("sbin"), 10)
        .unwrap();
    engine
        .place_order(Side::Buy, OrderKind::Market, id("tcs"), 2)
        .unwrap();
    engine
        .place_order(Side::Buy, OrderKind::Limit { price: 50.0 }, id("sbin"), 1)
        .unwrap();
    engine.on_tick();

    let executed: Vec<_> = engine
        .orders()
        .iter()
        .filter(|o| o.status() == OrderStatus::Executed)
        .collect();
    assert_eq!(executed.len(), 2);
    assert_eq!(engine.transactions().len(), executed.len());
    for order in executed {
        let matches = engine
            .transactions()
            .for_instrument(order.instrument_id())
            .filter(|t| {
                t.quantity == order.quantity()
                    && (t.price - order.executed_price().unwrap()).abs() < 1e-9
            })
            .count();
        assert_eq!(matches, 1, "one fill per executed order");
    }
}

#[test]
fn test_reset_portfolio_cancels_pending_and_keeps_history_of_executions() {
    let mut engine = create_test_engine(&[("tcs", 100.0)], 1_000_000.0);

    let executed = engine
        .place_order(Side::Buy, OrderKind::Market, id("tcs"), 10)
        .unwrap();
    let pending = engine
        .place_order(Side::Buy, OrderKind::Limit { price: 50.0 }, id("tcs"), 5)
        .unwrap();
    engine.process(EngineEvent::Command(Command::AddToWatchlist {
        instrument_id: id("tcs"),
    }));

    engine.reset_portfolio();

    assert_eq!(engine.cash(), 1_000_000.0);
    assert!(engine.ledger().holdings().is_empty());
    assert!(engine.transactions().is_empty());
    assert_eq!(
        engine.orders().get(pending.id()).unwrap().status(),
        OrderStatus::Canceled
    );
    // Executed orders keep their record; only pending ones are swept.
    assert_eq!(
        engine.orders().get(executed.id()).unwrap().status(),
        OrderStatus::Executed
    );
    // The watchlist survives a portfolio reset.
    assert!(engine.watchlist().contains(&id("tcs")));
}

#[test]
fn test_watchlist_add_remove_are_idempotent_and_validated() {
    let mut engine = create_test_engine(&[("tcs", 100.0)], 1_000.0);

    assert!(matches!(
        engine.process(EngineEvent::Command(Command::AddToWatchlist {
            instrument_id: id("tcs"),
        })),
        Some(CommandReply::WatchlistChanged(true))
    ));
    assert!(matches!(
        engine.process(EngineEvent::Command(Command::AddToWatchlist {
            instrument_id: id("tcs"),
        })),
        Some(CommandReply::WatchlistChanged(false))
    ));
    // Unknown ids are a no-op.
    assert!(matches!(
        engine.process(EngineEvent::Command(Command::AddToWatchlist {
            instrument_id: id("ghost"),
        })),
        Some(CommandReply::WatchlistChanged(false))
    ));
    assert_eq!(engine.watchlist().len(), 1);

    assert!(matches!(
        engine.process(EngineEvent::Command(Command::RemoveFromWatchlist {
            instrument_id: id("tcs"),
        })),
        Some(CommandReply::WatchlistChanged(true))
    ));
    assert!(engine.watchlist().is_empty());
}

#[test]
fn test_price_alert_fires_once_then_deactivates() {
    let mut engine = scripted_engine(
        &[("sbin", 100.0)],
        1_000.0,
        vec![vec![("sbin", 111.0)], vec![("sbin", 120.0)]],
    );

    let reply = engine.process(EngineEvent::Command(Command::SetAlert {
        instrument_id: id("sbin"),
        threshold: 110.0,
        condition: AlertCondition::Above,
    }));
    let Some(CommandReply::AlertSet(Some(alert))) = reply else {
        panic!("alert should be stored");
    };
    engine.take_notifications();

    engine.on_tick(); // 111 >= 110: fires
    let fired: Vec<_> = engine
        .take_notifications()
        .into_iter()
        .filter(|n| n.title.starts_with("Price Alert"))
        .collect();
    assert_eq!(fired.len(), 1);
    assert!(!engine.alerts().get(alert.id()).unwrap().is_active());

    engine.on_tick(); // still above, but the alert is spent
    let fired_again = engine
        .take_notifications()
        .into_iter()
        .filter(|n| n.title.starts_with("Price Alert"))
        .count();
    assert_eq!(fired_again, 0);
}

#[test]
fn test_invalid_alert_requests_store_nothing() {
    let mut engine = create_test_engine(&[("sbin", 100.0)], 1_000.0);

    assert!(matches!(
        engine.process(EngineEvent::Command(Command::SetAlert {
            instrument_id: id("sbin"),
            threshold: -5.0,
            condition: AlertCondition::Below,
        })),
        Some(CommandReply::AlertSet(None))
    ));
    assert!(matches!(
        engine.process(EngineEvent::Command(Command::SetAlert {
            instrument_id: id("ghost"),
            threshold: 50.0,
            condition: AlertCondition::Below,
        })),
        Some(CommandReply::AlertSet(None))
    ));
    assert!(engine.alerts().is_empty());
}

#[test]
fn test_rejections_notify_with_reason_specific_text() {
    let mut engine = create_test_engine(&[("sbin", 50.0)], 100.0);
    engine.take_notifications();

    let reason = engine
        .place_order(Side::Buy, OrderKind::Market, id("sbin"), 10)
        .unwrap_err();
    let notifications = engine.take_notifications();

    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "Order Failed");
    assert_eq!(notifications[0].severity, Severity::Error);
    // The reason enum maps 1:1 onto the user-facing description.
    assert_eq!(notifications[0].description, reason.to_string());

    let sell_reason = engine
        .place_order(Side::Sell, OrderKind::Market, id("sbin"), 1)
        .unwrap_err();
    assert_ne!(reason.to_string(), sell_reason.to_string());
}

#[test]
fn test_placement_and_fill_each_notify() {
    let mut engine = create_test_engine(&[("sbin", 50.0)], 10_000.0);
    engine.take_notifications();

    engine
        .place_order(Side::Buy, OrderKind::Market, id("sbin"), 10)
        .unwrap();
    let titles: Vec<String> = engine
        .take_notifications()
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(titles, vec!["Order Placed", "Order Executed"]);
}
