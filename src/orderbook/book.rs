//! Per-item order book: two skiplist-indexed sides of packed price levels.
//!
//! The skiplist is the ordered price index: `iter().next()` is the lowest
//! ask, `iter().next_back()` the highest bid, and insert/remove are
//! O(log N). Each entry holds a [`PriceLevel`] whose tombstone offset is
//! mutable in place, so retiring consumed segments never touches the index.

use crate::orderbook::level::PriceLevel;
use crate::orderbook::segment::Segment;
use crate::orderbook::types::{ItemId, LevelNode, OrderId, Side};
use crossbeam::atomic::AtomicCell;
use crossbeam_skiplist::SkipMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// Both sides of the book for one item id.
pub(crate) struct OrderBook {
    item_id: ItemId,
    bids: SkipMap<u64, Arc<PriceLevel>>,
    asks: SkipMap<u64, Arc<PriceLevel>>,
    last_trade_price: AtomicCell<u64>,
    has_traded: AtomicBool,
}

impl OrderBook {
    pub fn new(item_id: ItemId) -> Self {
        OrderBook {
            item_id,
            bids: SkipMap::new(),
            asks: SkipMap::new(),
            last_trade_price: AtomicCell::new(0),
            has_traded: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub(crate) fn side_levels(&self, side: Side) -> &SkipMap<u64, Arc<PriceLevel>> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Best bid price, if any. The skiplist keeps prices sorted, so the
    /// highest bid is the last entry.
    pub fn highest_bid(&self) -> Option<u64> {
        self.bids.iter().next_back().map(|entry| *entry.key())
    }

    /// Best ask price, if any (first entry of the ask side).
    pub fn lowest_ask(&self) -> Option<u64> {
        self.asks.iter().next().map(|entry| *entry.key())
    }

    /// Best ask minus best bid.
    pub fn spread(&self) -> Option<u64> {
        match (self.highest_bid(), self.lowest_ask()) {
            (Some(bid), Some(ask)) => Some(ask.saturating_sub(bid)),
            _ => None,
        }
    }

    /// Average of best bid and best ask.
    pub fn mid_price(&self) -> Option<f64> {
        match (self.highest_bid(), self.lowest_ask()) {
            (Some(bid), Some(ask)) => Some((bid as f64 + ask as f64) / 2.0),
            _ => None,
        }
    }

    /// Price of the most recent match on this book.
    pub fn last_trade_price(&self) -> Option<u64> {
        if self.has_traded.load(Ordering::Relaxed) {
            Some(self.last_trade_price.load())
        } else {
            None
        }
    }

    pub(crate) fn record_trade_price(&self, price: u64) {
        self.last_trade_price.store(price);
        self.has_traded.store(true, Ordering::Relaxed);
    }

    /// Tombstone offset and segment count for a present price level.
    pub fn node(&self, side: Side, price: u64) -> Option<LevelNode> {
        self.side_levels(side).get(&price).map(|entry| {
            let level = entry.value();
            LevelNode {
                tombstone_offset: level.tombstone_offset(),
                segment_count: level.segment_count(),
            }
        })
    }

    /// Live `(id, quantity)` pairs at a price, in time order.
    pub fn orders_at_price(&self, side: Side, price: u64) -> Vec<(OrderId, u32)> {
        self.side_levels(side)
            .get(&price)
            .map(|entry| entry.value().resting_orders())
            .unwrap_or_default()
    }

    /// Resolve the price a resting order will actually land on.
    ///
    /// Starting from the requested price, full levels are skipped by
    /// stepping one tick away from the spread (down for bids, up for asks)
    /// until an absent or non-full price is found. Returns `None` when the
    /// walk runs off the price range, in which case the remainder cannot
    /// rest and is rejected like any failed add.
    pub fn resolve_insert_price(
        &self,
        side: Side,
        price: u64,
        tick: u64,
        max_orders_per_price: u32,
    ) -> Option<u64> {
        let levels = self.side_levels(side);
        let mut candidate = price;
        loop {
            match levels.get(&candidate) {
                None => return Some(candidate),
                Some(entry) if !entry.value().is_full(max_orders_per_price) => {
                    return Some(candidate);
                }
                Some(_) => {
                    trace!(
                        item = %self.item_id,
                        %side,
                        price = candidate,
                        "price level full, stepping one tick"
                    );
                    candidate = match side {
                        Side::Buy => candidate.checked_sub(tick).filter(|p| *p > 0)?,
                        Side::Sell => candidate.checked_add(tick)?,
                    };
                }
            }
        }
    }

    /// Place a resting order at a price previously resolved with
    /// [`Self::resolve_insert_price`]. Creates the level when absent.
    pub fn place_resting(&self, side: Side, price: u64, id: OrderId, quantity: u32) {
        let levels = self.side_levels(side);
        if let Some(entry) = levels.get(&price) {
            entry.value().push(id, quantity);
        } else {
            levels.insert(price, Arc::new(PriceLevel::new(price, id, quantity)));
        }
    }

    /// Install a level from previously captured segments (restore path).
    pub(crate) fn install_level(&self, side: Side, price: u64, segments: Vec<Segment>) {
        self.side_levels(side)
            .insert(price, Arc::new(PriceLevel::from_segments(price, segments)));
    }

    /// Remove one resting order from a price level.
    ///
    /// Returns the cancelled quantity. `Err(true)` means the price level is
    /// not in the index at all; `Err(false)` means the level exists but
    /// does not hold the order.
    pub fn cancel_resting(&self, side: Side, price: u64, id: OrderId) -> Result<u32, bool> {
        let levels = self.side_levels(side);
        let entry = levels.get(&price).ok_or(true)?;
        let (quantity, exhausted) = entry.value().cancel(id).ok_or(false)?;
        if exhausted {
            levels.remove(&price);
        }
        Ok(quantity)
    }
}
