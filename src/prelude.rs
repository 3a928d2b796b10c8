//! Convenience re-exports for the common surface of the crate.
//!
//! ```
//! use itembook::prelude::*;
//! ```

pub use crate::orderbook::custody::{
    CoinLedger, FixedRoyaltyOracle, InMemoryCoinLedger, InMemoryItemCustody, ItemCustody,
    NoRoyalty, RoyaltyOracle, TransferError,
};
pub use crate::orderbook::events::{MarketEvent, MarketEventListener};
pub use crate::orderbook::types::{
    AccountId, Fill, ItemConfig, ItemId, LevelNode, LimitOrder, OrderId, OrderOutcome, OrderView,
    Side,
};
pub use crate::orderbook::{
    FeeSchedule, FeeTake, Market, MarketError, MarketSnapshot, OrderKey, SnapshotPackage,
};
