pub mod alert;
pub mod command;
pub mod ids;
pub mod instrument;
pub mod market;
pub mod notification;
pub mod order;
pub mod portfolio;
pub mod snapshot;
pub mod transaction;
pub mod watchlist;

pub use alert::*;
pub use command::*;
pub use ids::*;
pub use instrument::*;
pub use market::*;
pub use notification::*;
pub use order::*;
pub use portfolio::*;
pub use snapshot::*;
pub use transaction::*;
pub use watchlist::*;
