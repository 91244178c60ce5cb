use super::ids::InstrumentId;
use super::order::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The record of one fill. Immutable once created; exactly one exists
/// per executed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub side: Side,
    pub instrument_id: InstrumentId,
    pub symbol: String,
    pub quantity: u64,
    pub price: f64,
    pub total: f64,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        side: Side,
        instrument_id: InstrumentId,
        symbol: impl Into<String>,
        quantity: u64,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            side,
            instrument_id,
            symbol: symbol.into(),
            quantity,
            price,
            total: quantity as f64 * price,
            timestamp,
        }
    }
}

/// Append-only fill history. Entries are stored oldest-first; readers
/// get them newest-first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionLog {
    entries: Vec<Transaction>,
}

impl TransactionLog {
    pub fn record(&mut self, transaction: Transaction) {
        self.entries.push(transaction);
    }

    /// Most-recent-first view.
    pub fn recent(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter().rev()
    }

    /// Most-recent-first, restricted to one instrument.
    pub fn for_instrument<'a>(
        &'a self,
        id: &'a InstrumentId,
    ) -> impl Iterator<Item = &'a Transaction> {
        self.recent().filter(move |t| &t.instrument_id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
