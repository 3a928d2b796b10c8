//! The take-from-book loop.
//!
//! An incoming limit order walks the opposite side in price priority: a
//! buy taker consumes asks from the lowest price up to its limit, a sell
//! taker consumes bids from the highest price down to its limit. Within a
//! level, consumption runs in slot scan order, which is time order because
//! ids are assigned monotonically and appended in sequence.

use crate::orderbook::book::OrderBook;
use crate::orderbook::error::MarketError;
use crate::orderbook::types::{Fill, MAX_MATCHES_PER_CALL, Side};
use tracing::trace;

/// Aggregate result of one taker walk.
#[derive(Debug, Default)]
pub(crate) struct TakeOutcome {
    /// Maker orders consumed, best price first, time order within a price.
    pub fills: Vec<Fill>,
    /// Σ quantity × level price over `fills`.
    pub cost: u128,
    /// Total quantity taken from the book.
    pub taken: u32,
}

impl OrderBook {
    /// Match `quantity` against the side opposite to `taker_side`, never
    /// crossing `limit_price`.
    ///
    /// Per level: the packed segments are consumed from the front, whole
    /// consumed segments retire through the tombstone offset, and a level
    /// eaten to the end is removed from the price index entirely. The walk
    /// stops at the price limit, at full fill, or when the book side runs
    /// dry.
    ///
    /// # Errors
    /// [`MarketError::TooManyOrdersHit`] once the walk has consumed
    /// [`MAX_MATCHES_PER_CALL`] maker orders; the caller is expected to
    /// abandon the whole command.
    pub fn take_from_book(
        &self,
        taker_side: Side,
        limit_price: u64,
        quantity: u32,
    ) -> Result<TakeOutcome, MarketError> {
        let levels = self.side_levels(taker_side.opposite());
        let mut outcome = TakeOutcome::default();
        let mut remaining = quantity;

        while remaining > 0 {
            let entry = match taker_side {
                Side::Buy => levels.iter().next(),
                Side::Sell => levels.iter().next_back(),
            };
            let Some(entry) = entry else {
                break;
            };
            let price = *entry.key();
            let crossed = match taker_side {
                Side::Buy => price <= limit_price,
                Side::Sell => price >= limit_price,
            };
            if !crossed {
                break;
            }

            let level = entry.value().clone();
            let take = level.take_up_to(remaining);
            remaining -= take.taken;
            outcome.cost += take.cost;
            outcome.fills.extend(take.fills);
            if take.taken > 0 {
                self.record_trade_price(price);
            }

            if take.exhausted {
                levels.remove(&price);
                trace!(item = %self.item_id(), %taker_side, price, "level consumed and removed");
            } else {
                level.advance_tombstone(take.segments_consumed);
            }

            if outcome.fills.len() >= MAX_MATCHES_PER_CALL {
                return Err(MarketError::TooManyOrdersHit {
                    limit: MAX_MATCHES_PER_CALL,
                });
            }
        }

        outcome.taken = quantity - remaining;
        Ok(outcome)
    }
}
