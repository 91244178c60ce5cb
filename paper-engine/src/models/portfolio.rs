use super::ids::InstrumentId;
use crate::error::ConsistencyViolation;
use serde::{Deserialize, Serialize};

/// A position in one instrument with weighted-average cost basis.
/// Exists only while quantity is positive; the ledger removes it at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    instrument_id: InstrumentId,
    symbol: String,
    quantity: u64,
    average_buy_price: f64,
    invested_amount: f64,
}

impl Holding {
    fn opened(instrument_id: InstrumentId, symbol: String, quantity: u64, price: f64) -> Self {
        Self {
            instrument_id,
            symbol,
            quantity,
            average_buy_price: price,
            invested_amount: quantity as f64 * price,
        }
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

    pub fn average_buy_price(&self) -> f64 {
        self.average_buy_price
    }

    pub fn invested_amount(&self) -> f64 {
        self.invested_amount
    }

    /// Blends a buy fill into the position: quantities and invested
    /// amounts add, the average is recomputed from the new totals.
    fn blend_buy(&mut self, quantity: u64, price: f64) {
        let total = quantity as f64 * price;
        self.quantity += quantity;
        self.invested_amount += total;
        self.average_buy_price = self.invested_amount / self.quantity as f64;
    }

    /// Reduces the position by a sell fill. Invested amount scales with
    /// the remaining share count; the average buy price is a
    /// sell-invariant under weighted-average accounting.
    fn reduce_sell(&mut self, quantity: u64) {
        let remaining = self.quantity - quantity;
        self.invested_amount *= remaining as f64 / self.quantity as f64;
        self.quantity = remaining;
    }
}

/// Cash plus holdings. Mutated only from order execution; commands never
/// reach in here directly, which is what keeps the matching pass the
/// single writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    cash: f64,
    holdings: Vec<Holding>,
}

impl Ledger {
    pub fn new(cash: f64) -> Self {
        Self {
            cash,
            holdings: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn holding(&self, id: &InstrumentId) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.instrument_id() == id)
    }

    /// Quantity held in an instrument, zero if there is no position.
    pub fn held_quantity(&self, id: &InstrumentId) -> u64 {
        self.holding(id).map(|h| h.quantity()).unwrap_or(0)
    }

    /// Applies a buy fill: cash out, basis blended in.
    pub fn apply_buy(&mut self, id: &InstrumentId, symbol: &str, quantity: u64, price: f64) {
        let total = quantity as f64 * price;
        self.cash -= total;

        match self.holdings.iter_mut().find(|h| h.instrument_id() == id) {
            Some(holding) => holding.blend_buy(quantity, price),
            None => self.holdings.push(Holding::opened(
                id.clone(),
                symbol.to_string(),
                quantity,
                price,
            )),
        }
    }

    /// Applies a sell fill: cash in, basis reduced proportionally, the
    /// holding deleted once empty. Selling more than is held is an
    /// invariant breach, never a clamp.
    pub fn apply_sell(
        &mut self,
        id: &InstrumentId,
        quantity: u64,
        price: f64,
    ) -> Result<(), ConsistencyViolation> {
        let held = self.held_quantity(id);
        if held < quantity {
            return Err(ConsistencyViolation::Oversell {
                instrument: id.clone(),
                requested: quantity,
                held,
            });
        }

        self.cash += quantity as f64 * price;

        let holding = self
            .holdings
            .iter_mut()
            .find(|h| h.instrument_id() == id)
            .expect("held quantity was checked above");
        holding.reduce_sell(quantity);

        if holding.quantity() == 0 {
            self.holdings.retain(|h| h.instrument_id() != id);
        }
        Ok(())
    }

    /// Back to a fresh account: initial cash, no positions.
    pub fn reset(&mut self, initial_cash: f64) {
        self.cash = initial_cash;
        self.holdings.clear();
    }
}
