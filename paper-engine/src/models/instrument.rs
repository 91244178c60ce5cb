use super::ids::InstrumentId;
use serde::{Deserialize, Serialize};

/// Immutable identity of a simulated security. Market data lives in the
/// sibling `Quote`; nothing outside the tick handler may touch that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    id: InstrumentId,
    symbol: String,
    exchange: String,
    name: String,
    sector: String,
}

impl Instrument {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        exchange: impl Into<String>,
        name: impl Into<String>,
        sector: impl Into<String>,
    ) -> Self {
        Self {
            id: InstrumentId::new(id),
            symbol: symbol.into(),
            exchange: exchange.into(),
            name: name.into(),
            sector: sector.into(),
        }
    }

    pub fn id(&self) -> &InstrumentId {
        &self.id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sector(&self) -> &str {
        &self.sector
    }
}

/// Simulated market fields for one instrument. Mutated only by price
/// ticks; everything else reads a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub current_price: f64,
    pub previous_close: f64,
    pub open: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub volume: u64,
    pub change: f64,
    pub change_percent: f64,
}

impl Quote {
    /// Starts a session flat: open/high/low at the given price, change
    /// measured against the supplied previous close.
    pub fn opening(price: f64, previous_close: f64, volume: u64) -> Self {
        let change = price - previous_close;
        Self {
            current_price: price,
            previous_close,
            open: price,
            day_high: price,
            day_low: price,
            volume,
            change,
            change_percent: change / previous_close * 100.0,
        }
    }
}
