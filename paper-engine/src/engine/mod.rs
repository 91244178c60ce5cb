use crate::error::{ConsistencyViolation, OrderNotCancelable, OrderRejected};
use crate::feed::TickSource;
use crate::models::{
    AlertBook, AlertCondition, Command, CommandReply, EngineEvent, InstrumentId, Ledger,
    MarketBoard, Notification, Order, OrderBook, OrderKind, PriceAlert, Side, StateSnapshot,
    Transaction, TransactionLog, Watchlist,
};
use crate::session::MarketCalendar;
use chrono::{DateTime, Utc};
use log::{error, info};
use uuid::Uuid;

/// The whole trading state bundle plus the state machine that mutates
/// it. Single writer: every mutation enters through `process`, one
/// event at a time, so no two transitions ever interleave.
pub struct Engine {
    market: MarketBoard,
    calendar: MarketCalendar,
    feed: Box<dyn TickSource>,
    ledger: Ledger,
    orders: OrderBook,
    transactions: TransactionLog,
    watchlist: Watchlist,
    alerts: AlertBook,
    initial_cash: f64,
    outbox: Vec<Notification>,
}

impl Engine {
    pub fn new(
        market: MarketBoard,
        calendar: MarketCalendar,
        feed: Box<dyn TickSource>,
        initial_cash: f64,
    ) -> Self {
        Self {
            market,
            calendar,
            feed,
            ledger: Ledger::new(initial_cash),
            orders: OrderBook::default(),
            transactions: TransactionLog::default(),
            watchlist: Watchlist::default(),
            alerts: AlertBook::default(),
            initial_cash,
            outbox: Vec::new(),
        }
    }

    /// Rehydrates an engine from a persisted snapshot. The snapshot's
    /// derived session flag is ignored; the calendar is authoritative.
    pub fn restore(
        snapshot: StateSnapshot,
        calendar: MarketCalendar,
        feed: Box<dyn TickSource>,
        initial_cash: f64,
    ) -> Self {
        Self {
            market: snapshot.market,
            calendar,
            feed,
            ledger: snapshot.ledger,
            orders: snapshot.orders,
            transactions: snapshot.transactions,
            watchlist: snapshot.watchlist,
            alerts: snapshot.alerts,
            initial_cash,
            outbox: Vec::new(),
        }
    }

    // --- queries -----------------------------------------------------

    pub fn cash(&self) -> f64 {
        self.ledger.cash()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn orders(&self) -> &OrderBook {
        &self.orders
    }

    pub fn transactions(&self) -> &TransactionLog {
        &self.transactions
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    pub fn alerts(&self) -> &AlertBook {
        &self.alerts
    }

    pub fn market(&self) -> &MarketBoard {
        &self.market
    }

    pub fn is_session_open(&self) -> bool {
        self.calendar.is_open(Utc::now())
    }

    /// Clones the full state bundle for queries and persistence.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            ledger: self.ledger.clone(),
            orders: self.orders.clone(),
            transactions: self.transactions.clone(),
            watchlist: self.watchlist.clone(),
            alerts: self.alerts.clone(),
            market: self.market.clone(),
            session_open: self.is_session_open(),
        }
    }

    /// Swaps the session rule at runtime (demo toggle).
    pub fn set_calendar(&mut self, calendar: MarketCalendar) {
        self.calendar = calendar;
    }

    /// Drains the notifications produced since the last drain.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    // --- event processing --------------------------------------------

    /// Applies one item of the serialized event sequence.
    pub fn process(&mut self, event: EngineEvent) -> Option<CommandReply> {
        match event {
            EngineEvent::Tick => {
                self.on_tick();
                None
            }
            EngineEvent::Command(command) => Some(self.apply(command)),
        }
    }

    /// One price tick: advance every quote, re-run matching, then check
    /// alerts against the new prices. Suppressed entirely while the
    /// session is closed.
    pub fn on_tick(&mut self) {
        let now = Utc::now();
        if !self.calendar.is_open(now) {
            return;
        }

        self.feed.apply_tick(&mut self.market);
        self.run_matching(now);

        for alert in self.alerts.evaluate(&self.market) {
            let direction = match alert.condition() {
                AlertCondition::Above => "above",
                AlertCondition::Below => "below",
            };
            self.outbox.push(Notification::info(
                format!("Price Alert: {}", alert.symbol()),
                format!(
                    "{} is now {} \u{20b9}{:.2}",
                    alert.symbol(),
                    direction,
                    alert.threshold()
                ),
            ));
        }
    }

    fn apply(&mut self, command: Command) -> CommandReply {
        match command {
            Command::PlaceOrder {
                side,
                kind,
                instrument_id,
                quantity,
            } => CommandReply::OrderPlaced(self.place_order(side, kind, instrument_id, quantity)),
            Command::CancelOrder { order_id } => {
                CommandReply::OrderCanceled(self.cancel_order(order_id))
            }
            Command::AddToWatchlist { instrument_id } => {
                CommandReply::WatchlistChanged(self.add_to_watchlist(&instrument_id))
            }
            Command::RemoveFromWatchlist { instrument_id } => {
                CommandReply::WatchlistChanged(self.remove_from_watchlist(&instrument_id))
            }
            Command::SetAlert {
                instrument_id,
                threshold,
                condition,
            } => CommandReply::AlertSet(self.set_alert(&instrument_id, threshold, condition)),
            Command::RemoveAlert { alert_id } => {
                CommandReply::AlertRemoved(self.alerts.remove(alert_id))
            }
            Command::ToggleAlert { alert_id } => {
                CommandReply::AlertToggled(self.alerts.toggle(alert_id))
            }
            Command::ResetPortfolio => {
                self.reset_portfolio();
                CommandReply::PortfolioReset
            }
        }
    }

    // --- order lifecycle ---------------------------------------------

    /// Admission control plus append. Never executes synchronously,
    /// even for market orders: execution belongs to the matching pass,
    /// which runs right after admission while the session is open.
    pub fn place_order(
        &mut self,
        side: Side,
        kind: OrderKind,
        instrument_id: InstrumentId,
        quantity: u64,
    ) -> Result<Order, OrderRejected> {
        let now = Utc::now();
        match self.admit_order(side, kind, &instrument_id, quantity, now) {
            Ok(order) => {
                let priced_at = match kind {
                    OrderKind::Market => "market price".to_string(),
                    OrderKind::Limit { price } => format!("\u{20b9}{:.2}", price),
                };
                self.outbox.push(Notification::success(
                    "Order Placed",
                    format!("{} {} {} at {}", side, quantity, order.symbol(), priced_at),
                ));
                if self.calendar.is_open(now) {
                    self.run_matching(now);
                }
                Ok(order)
            }
            Err(reason) => {
                self.outbox
                    .push(Notification::error("Order Failed", reason.to_string()));
                Err(reason)
            }
        }
    }

    fn admit_order(
        &mut self,
        side: Side,
        kind: OrderKind,
        instrument_id: &InstrumentId,
        quantity: u64,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderRejected> {
        let entry = self
            .market
            .get(instrument_id)
            .ok_or(OrderRejected::UnknownInstrument)?;

        if quantity == 0 {
            return Err(OrderRejected::InvalidQuantity);
        }

        if let OrderKind::Limit { price } = kind {
            if !price.is_finite() || price <= 0.0 {
                return Err(OrderRejected::InvalidLimitPrice);
            }
        }

        // A market order with no live session would sit un-executable;
        // limit orders are allowed to queue across the close.
        if matches!(kind, OrderKind::Market) && !self.calendar.is_open(now) {
            return Err(OrderRejected::MarketClosed);
        }

        match side {
            Side::Sell => {
                let held = self.ledger.held_quantity(instrument_id);
                if held < quantity {
                    return Err(OrderRejected::InsufficientShares {
                        held,
                        requested: quantity,
                    });
                }
            }
            Side::Buy => {
                // Estimate only; the price may move before execution.
                let required = quantity as f64 * entry.quote.current_price;
                if required > self.ledger.cash() {
                    return Err(OrderRejected::InsufficientFunds {
                        required,
                        available: self.ledger.cash(),
                    });
                }
            }
        }

        let order = Order::new(
            side,
            kind,
            instrument_id.clone(),
            entry.instrument.symbol(),
            quantity,
            now,
        );
        self.orders.admit(order.clone());
        info!("admitted order {} ({} {} {})", order.id(), side, quantity, order.symbol());
        Ok(order)
    }

    /// Pending -> Canceled. Terminal orders stay exactly as they are;
    /// the caller just learns why.
    pub fn cancel_order(&mut self, order_id: Uuid) -> Result<Order, OrderNotCancelable> {
        let result = match self.orders.get_mut(order_id) {
            None => Err(OrderNotCancelable::UnknownOrder),
            Some(order) => {
                if order.mark_canceled() {
                    Ok(order.clone())
                } else {
                    Err(OrderNotCancelable::AlreadyTerminal(order.status()))
                }
            }
        };

        match &result {
            Ok(order) => {
                self.outbox.push(Notification::info(
                    "Order Canceled",
                    format!(
                        "{} order for {} {} has been canceled",
                        order.side(),
                        order.quantity(),
                        order.symbol()
                    ),
                ));
            }
            Err(reason) => {
                self.outbox
                    .push(Notification::warning("Order Not Canceled", reason.to_string()));
            }
        }
        result
    }

    /// Walks pending orders oldest-first and fills whatever the current
    /// prices trigger. Execution prices are always the live quote; a
    /// limit price only gates the fill, it never sets it.
    fn run_matching(&mut self, now: DateTime<Utc>) {
        if !self.calendar.is_open(now) {
            return;
        }

        for order_id in self.orders.pending_ids() {
            let (side, kind, instrument_id, symbol, quantity) = {
                let order = self
                    .orders
                    .get(order_id)
                    .expect("pending ids come from the book");
                (
                    order.side(),
                    order.kind(),
                    order.instrument_id().clone(),
                    order.symbol().to_string(),
                    order.quantity(),
                )
            };

            let Some(quote) = self.market.quote(&instrument_id) else {
                error!(
                    "matching pass: {}",
                    ConsistencyViolation::MissingInstrument(instrument_id)
                );
                continue;
            };
            let price = quote.current_price;

            let triggered = match kind {
                OrderKind::Market => true,
                OrderKind::Limit { price: limit } => match side {
                    Side::Buy => price <= limit,
                    Side::Sell => price >= limit,
                },
            };
            if !triggered {
                continue;
            }

            match side {
                Side::Buy => self.ledger.apply_buy(&instrument_id, &symbol, quantity, price),
                Side::Sell => {
                    // Admission already checked the position; a breach
                    // here means shared state went inconsistent. Skip
                    // the order and leave the ledger alone.
                    if let Err(violation) = self.ledger.apply_sell(&instrument_id, quantity, price)
                    {
                        error!("matching pass: {}", violation);
                        continue;
                    }
                }
            }

            let order = self
                .orders
                .get_mut(order_id)
                .expect("pending ids come from the book");
            order.mark_executed(now, price);

            self.transactions.record(Transaction::new(
                side,
                instrument_id,
                symbol.clone(),
                quantity,
                price,
                now,
            ));

            let title = match kind {
                OrderKind::Market => "Order Executed",
                OrderKind::Limit { .. } => "Limit Order Executed",
            };
            self.outbox.push(Notification::success(
                title,
                format!("{} {} {} at \u{20b9}{:.2}", side, quantity, symbol, price),
            ));
        }
    }

    // --- watchlist ---------------------------------------------------

    fn add_to_watchlist(&mut self, instrument_id: &InstrumentId) -> bool {
        // Unknown ids are a no-op, not an error.
        let Some(instrument) = self.market.instrument(instrument_id) else {
            return false;
        };
        let name = instrument.name().to_string();
        let symbol = instrument.symbol().to_string();

        let added = self.watchlist.add(instrument_id.clone());
        if added {
            self.outbox.push(Notification::success(
                "Added to Watchlist",
                format!("{} ({}) added to your watchlist", name, symbol),
            ));
        }
        added
    }

    fn remove_from_watchlist(&mut self, instrument_id: &InstrumentId) -> bool {
        let removed = self.watchlist.remove(instrument_id);
        if removed {
            if let Some(instrument) = self.market.instrument(instrument_id) {
                self.outbox.push(Notification::info(
                    "Removed from Watchlist",
                    format!(
                        "{} ({}) removed from your watchlist",
                        instrument.name(),
                        instrument.symbol()
                    ),
                ));
            }
        }
        removed
    }

    // --- alerts ------------------------------------------------------

    fn set_alert(
        &mut self,
        instrument_id: &InstrumentId,
        threshold: f64,
        condition: AlertCondition,
    ) -> Option<PriceAlert> {
        if !threshold.is_finite() || threshold <= 0.0 {
            self.outbox.push(Notification::error(
                "Invalid Price",
                "Please enter a valid price value.",
            ));
            return None;
        }
        let Some(instrument) = self.market.instrument(instrument_id) else {
            self.outbox
                .push(Notification::error("Alert Failed", "instrument not found"));
            return None;
        };

        let alert = PriceAlert::new(
            instrument_id.clone(),
            instrument.symbol(),
            threshold,
            condition,
            Utc::now(),
        );
        let direction = match condition {
            AlertCondition::Above => "above",
            AlertCondition::Below => "below",
        };
        self.outbox.push(Notification::success(
            "Alert Created",
            format!(
                "You'll be notified when {} price goes {} \u{20b9}{:.2}",
                alert.symbol(),
                direction,
                threshold
            ),
        ));
        self.alerts.set(alert.clone());
        Some(alert)
    }

    // --- reset -------------------------------------------------------

    /// Initial cash back, holdings and history cleared, pending orders
    /// canceled. Executed and canceled orders keep their records.
    pub fn reset_portfolio(&mut self) {
        self.ledger.reset(self.initial_cash);
        self.transactions.clear();
        let canceled = self.orders.cancel_pending();
        info!("portfolio reset; {} pending orders canceled", canceled);

        self.outbox.push(Notification::info(
            "Portfolio Reset",
            format!(
                "Cash restored to \u{20b9}{:.2}; holdings and history cleared",
                self.initial_cash
            ),
        ));
    }
}

#[cfg(test)]
mod tests;
