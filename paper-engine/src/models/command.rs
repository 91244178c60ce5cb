use super::alert::{AlertCondition, PriceAlert};
use super::ids::InstrumentId;
use super::order::{Order, OrderKind, Side};
use crate::error::{OrderNotCancelable, OrderRejected};
use uuid::Uuid;

/// The full external command surface. Everything the presentation layer
/// can ask for goes through here and is matched exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PlaceOrder {
        side: Side,
        kind: OrderKind,
        instrument_id: InstrumentId,
        quantity: u64,
    },
    CancelOrder {
        order_id: Uuid,
    },
    AddToWatchlist {
        instrument_id: InstrumentId,
    },
    RemoveFromWatchlist {
        instrument_id: InstrumentId,
    },
    SetAlert {
        instrument_id: InstrumentId,
        threshold: f64,
        condition: AlertCondition,
    },
    RemoveAlert {
        alert_id: Uuid,
    },
    ToggleAlert {
        alert_id: Uuid,
    },
    ResetPortfolio,
}

/// One item in the serialized event sequence: either a price tick or a
/// user command. Nothing mutates engine state except through this.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Tick,
    Command(Command),
}

/// Typed result of applying one command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    OrderPlaced(Result<Order, OrderRejected>),
    OrderCanceled(Result<Order, OrderNotCancelable>),
    /// true if membership actually changed.
    WatchlistChanged(bool),
    /// None when the alert request was invalid (unknown instrument or
    /// non-positive threshold) and nothing was stored.
    AlertSet(Option<PriceAlert>),
    AlertRemoved(bool),
    /// New active state, None for unknown ids.
    AlertToggled(Option<bool>),
    PortfolioReset,
}
