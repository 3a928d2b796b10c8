//! Observable market events.
//!
//! A host registers a [`MarketEventListener`] to mirror book activity into
//! its own systems (UI, analytics, downstream settlement). Events are
//! emitted after the engine's state mutations for the command are
//! complete, one batch of events per public entry point, all stamped with
//! the same transaction id.

use crate::orderbook::types::{AccountId, Fill, ItemId, OrderId, Side};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Everything observable about one engine command.
#[derive(Debug, Clone, Serialize)]
pub enum MarketEvent {
    /// A taker consumed resting maker orders.
    OrdersMatched {
        /// Id shared by every event of the emitting command.
        transaction_id: Uuid,
        /// The account whose incoming order matched.
        taker: AccountId,
        /// Side of the incoming order.
        side: Side,
        /// Book the match happened on.
        item_id: ItemId,
        /// Maker orders consumed, in price-time order.
        fills: Vec<Fill>,
    },

    /// A residual came to rest on the book.
    AddedToBook {
        /// Id shared by every event of the emitting command.
        transaction_id: Uuid,
        /// Owner of the new resting order.
        maker: AccountId,
        /// Id assigned to the resting order.
        order_id: OrderId,
        /// Side it rests on.
        side: Side,
        /// Book it rests in.
        item_id: ItemId,
        /// Price it actually landed on (may differ from the requested
        /// price when full levels forced a tick walk).
        price: u64,
        /// Resting quantity.
        quantity: u32,
    },

    /// A residual could not rest and was handed back.
    ///
    /// Emitted when the remainder is below the item's minimum quantity or
    /// the overflow walk ran off the price range. The matched portion of
    /// the same order stands.
    FailedToAddToBook {
        /// Id shared by every event of the emitting command.
        transaction_id: Uuid,
        /// The account whose remainder was rejected.
        maker: AccountId,
        /// Side of the rejected remainder.
        side: Side,
        /// Book it targeted.
        item_id: ItemId,
        /// Requested price.
        price: u64,
        /// Rejected quantity.
        quantity: u32,
    },

    /// Resting orders were cancelled and their economics refunded.
    OrdersCancelled {
        /// Id shared by every event of the emitting command.
        transaction_id: Uuid,
        /// Owner of the cancelled orders.
        maker: AccountId,
        /// The cancelled ids.
        order_ids: Vec<OrderId>,
    },

    /// Coin proceeds were claimed.
    ClaimedCoins {
        /// Id shared by every event of the emitting command.
        transaction_id: Uuid,
        /// The claiming maker.
        maker: AccountId,
        /// Orders swept by the claim.
        order_ids: Vec<OrderId>,
        /// Gross proceeds before fees.
        gross: u128,
        /// Fees taken at the current rates.
        fees: u128,
    },

    /// Item proceeds were claimed.
    ClaimedItems {
        /// Id shared by every event of the emitting command.
        transaction_id: Uuid,
        /// The claiming maker.
        maker: AccountId,
        /// `(order, item, amount)` per swept entry.
        claims: Vec<(OrderId, ItemId, u64)>,
    },
}

/// Callback invoked once per emitted event.
pub type MarketEventListener = Arc<dyn Fn(&MarketEvent) + Send + Sync>;
