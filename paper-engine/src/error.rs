use crate::models::{InstrumentId, OrderStatus};
use thiserror::Error;

/// Admission failures. Every variant maps to its own user-facing text;
/// a rejected order is never admitted into the book.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderRejected {
    #[error("instrument not found")]
    UnknownInstrument,

    #[error("quantity must be a positive whole number of shares")]
    InvalidQuantity,

    #[error("limit price must be a positive amount")]
    InvalidLimitPrice,

    #[error("market is closed; a market order needs a live session")]
    MarketClosed,

    #[error("not enough shares to sell ({held} held, {requested} requested)")]
    InsufficientShares { held: u64, requested: u64 },

    #[error("insufficient funds (need {required:.2}, have {available:.2})")]
    InsufficientFunds { required: f64, available: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderNotCancelable {
    #[error("order is already {0}")]
    AlreadyTerminal(OrderStatus),

    #[error("no such order")]
    UnknownOrder,
}

/// Execution-time invariant breach. Not user-actionable: the offending
/// matching iteration is logged and skipped, the order stays pending,
/// and the ledger is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyViolation {
    #[error("no market entry for {0}; execution skipped")]
    MissingInstrument(InstrumentId),

    #[error("sell of {requested} {instrument} exceeds held quantity {held}")]
    Oversell {
        instrument: InstrumentId,
        requested: u64,
        held: u64,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("state encoding: {0}")]
    Codec(#[from] serde_json::Error),
}
