use super::ids::InstrumentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// A limit price is a trigger threshold, never the fill price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    Limit { price: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Executed,
    Canceled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Executed => write!(f, "executed"),
            OrderStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// An instruction to buy or sell an instrument. Lifecycle is one-way:
/// Pending -> Executed or Pending -> Canceled, nothing comes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: Uuid,
    side: Side,
    kind: OrderKind,
    instrument_id: InstrumentId,
    symbol: String,
    quantity: u64,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    executed_at: Option<DateTime<Utc>>,
    executed_price: Option<f64>,
}

impl Order {
    pub fn new(
        side: Side,
        kind: OrderKind,
        instrument_id: InstrumentId,
        symbol: impl Into<String>,
        quantity: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            side,
            kind,
            instrument_id,
            symbol: symbol.into(),
            quantity,
            status: OrderStatus::Pending,
            created_at,
            executed_at: None,
            executed_price: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn instrument_id(&self) -> &InstrumentId {
        &self.instrument_id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.executed_at
    }

    pub fn executed_price(&self) -> Option<f64> {
        self.executed_price
    }

    pub fn limit_price(&self) -> Option<f64> {
        match self.kind {
            OrderKind::Market => None,
            OrderKind::Limit { price } => Some(price),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Pending -> Executed. Returns false (and leaves the order alone)
    /// if the order is already terminal.
    pub(crate) fn mark_executed(&mut self, at: DateTime<Utc>, price: f64) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = OrderStatus::Executed;
        self.executed_at = Some(at);
        self.executed_price = Some(price);
        true
    }

    /// Pending -> Canceled. Returns false if already terminal.
    pub(crate) fn mark_canceled(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = OrderStatus::Canceled;
        true
    }
}

/// All orders ever admitted, in creation order. The matching pass walks
/// pending orders oldest-first, so insertion order doubles as the FIFO
/// fairness rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderBook {
    orders: Vec<Order>,
}

impl OrderBook {
    pub fn admit(&mut self, order: Order) {
        self.orders.push(order);
    }

    pub fn get(&self, id: Uuid) -> Option<&Order> {
        self.orders.iter().find(|o| o.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: Uuid) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id() == id)
    }

    /// Ids of pending orders, oldest first.
    pub fn pending_ids(&self) -> Vec<Uuid> {
        self.orders
            .iter()
            .filter(|o| o.is_pending())
            .map(|o| o.id())
            .collect()
    }

    /// Cancels every pending order, returning how many were affected.
    pub(crate) fn cancel_pending(&mut self) -> usize {
        let mut canceled = 0;
        for order in self.orders.iter_mut().filter(|o| o.is_pending()) {
            if order.mark_canceled() {
                canceled += 1;
            }
        }
        canceled
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Order> {
        self.orders.iter()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
