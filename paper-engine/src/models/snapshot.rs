use super::alert::AlertBook;
use super::market::MarketBoard;
use super::order::OrderBook;
use super::portfolio::Ledger;
use super::transaction::TransactionLog;
use super::watchlist::Watchlist;
use serde::{Deserialize, Serialize};

/// The whole durable state bundle. This exact shape is what the store
/// writes after every mutation and what rehydrates the engine at
/// startup; timestamps and numbers must round-trip losslessly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub ledger: Ledger,
    pub orders: OrderBook,
    pub transactions: TransactionLog,
    pub watchlist: Watchlist,
    pub alerts: AlertBook,
    pub market: MarketBoard,
    /// Derived from the session calendar at snapshot time; informational
    /// for readers, ignored on restore.
    pub session_open: bool,
}
