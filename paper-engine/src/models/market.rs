use super::ids::InstrumentId;
use super::instrument::{Instrument, Quote};
use serde::{Deserialize, Serialize};

/// One catalog row: identity plus live market data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEntry {
    pub instrument: Instrument,
    pub quote: Quote,
}

/// The instrument table. Catalog order is preserved so listings are
/// stable across snapshots. Lookups are linear; the catalog is small.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketBoard {
    entries: Vec<MarketEntry>,
}

impl MarketBoard {
    pub fn new(entries: Vec<MarketEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, id: &InstrumentId) -> Option<&MarketEntry> {
        self.entries.iter().find(|e| e.instrument.id() == id)
    }

    pub fn instrument(&self, id: &InstrumentId) -> Option<&Instrument> {
        self.get(id).map(|e| &e.instrument)
    }

    pub fn quote(&self, id: &InstrumentId) -> Option<&Quote> {
        self.get(id).map(|e| &e.quote)
    }

    pub fn contains(&self, id: &InstrumentId) -> bool {
        self.get(id).is_some()
    }

    pub fn entries(&self) -> &[MarketEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [MarketEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
