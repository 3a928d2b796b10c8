//! # Item Market Order Book Engine
//!
//! A price-time priority limit order book and matching engine for
//! marketplaces that pair fungible coins against multi-instance
//! semi-fungible items. Every item id trades in its own independent book;
//! makers rest price-capped limit orders, takers consume them at
//! acceptable prices, and proceeds accumulate per order id until the
//! maker pulls them with a claim.
//!
//! ## Key Features
//!
//! - **Packed price levels**: each price level stores its orders in
//!   256-bit segments of four `(quantity:u24 | id:u40)` slots, with a
//!   per-level tombstone offset that retires fully consumed segments in
//!   O(1) without shifting memory.
//! - **Skiplist price index**: both sides of every book are ordered maps
//!   with O(log N) insert/remove and O(1) best-price lookup, so matching
//!   walks levels in price priority without ever sorting.
//! - **Strict priority discipline**: price priority across levels, time
//!   priority within a level, and monotone order ids as the tie-break and
//!   as the binary-search key for cancellation.
//! - **Overflow to the next tick**: a full price level pushes new resting
//!   orders one tick away from the spread instead of rejecting them.
//! - **Pull-based settlement**: matching credits per-order claimable
//!   accumulators; makers sweep coins or items whenever they choose, with
//!   the fee split applied at the rates current at claim time.
//! - **Pluggable collaborators**: coin ledger, item custody and royalty
//!   oracle are traits; in-memory implementations back the test suite.
//! - **Snapshots**: JSON dumps with a SHA-256 integrity checksum, restorable
//!   into an observably equivalent market.
//!
//! ## Example
//!
//! ```
//! use itembook::prelude::*;
//! use std::sync::Arc;
//!
//! let coins = Arc::new(InMemoryCoinLedger::new());
//! let items = Arc::new(InMemoryItemCustody::new());
//! let market = Market::new(coins.clone(), items.clone(), Arc::new(NoRoyalty));
//!
//! let item = ItemId(1);
//! market
//!     .set_item_configs(&[item], &[ItemConfig { tick: 1, min_quantity: 1 }])
//!     .unwrap();
//!
//! let maker = AccountId(1);
//! coins.mint(maker, 1_000);
//! market
//!     .limit_orders(
//!         maker,
//!         &[LimitOrder { side: Side::Buy, item_id: item, price: 100, quantity: 10 }],
//!     )
//!     .unwrap();
//! assert_eq!(market.highest_bid(item), Some(100));
//! ```
//!
//! ## Execution model
//!
//! The engine is strictly serial: every mutating entry point runs under a
//! single command gate and completes before the next command observes
//! state. External collaborators are invoked only after all book
//! mutations for the command are done, so a read-only callback during a
//! transfer sees a consistent book. Queries never take the gate.

pub mod orderbook;
pub mod prelude;
mod utils;

pub use orderbook::custody::{
    CoinLedger, FixedRoyaltyOracle, InMemoryCoinLedger, InMemoryItemCustody, ItemCustody,
    NoRoyalty, RoyaltyOracle, TransferError,
};
pub use orderbook::events::{MarketEvent, MarketEventListener};
pub use orderbook::types::{
    AccountId, BASIS_POINTS, Fill, ItemConfig, ItemId, LevelNode, LimitOrder, MAX_CLAIM_ORDERS,
    MAX_MATCHES_PER_CALL, MAX_ORDER_ID, MAX_SLOT_QUANTITY, OrderId, OrderOutcome, OrderView,
    SLOTS_PER_SEGMENT, Side,
};
pub use orderbook::{
    BookSnapshot, DEFAULT_MAX_ORDERS_PER_PRICE, FeeSchedule, FeeTake, LevelSnapshot,
    MARKET_SNAPSHOT_FORMAT_VERSION, Market, MarketError, MarketSnapshot, OrderKey, Segment,
    SnapshotPackage,
};
pub use utils::current_time_millis;
