//! A single price level: a tombstone skip counter plus packed segments.
//!
//! Segments before the tombstone offset are fully consumed and never read
//! again; all logic operates on the active window `[tombstone, len)`. The
//! tombstone lets the matcher retire whole segments in O(1) without
//! shifting memory or touching the price index.

use crate::orderbook::segment::Segment;
use crate::orderbook::types::{Fill, OrderId, SLOTS_PER_SEGMENT};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

/// Outcome of [`PriceLevel::take_up_to`].
#[derive(Debug, Default)]
pub(crate) struct LevelTake {
    /// Maker orders consumed, in time order.
    pub fills: Vec<Fill>,
    /// Σ quantity × this level's price over `fills`.
    pub cost: u128,
    /// Total quantity taken.
    pub taken: u32,
    /// Leading active segments that were fully consumed.
    pub segments_consumed: u32,
    /// Whether the whole active window was consumed. The caller removes
    /// the level from the price index instead of advancing the tombstone.
    pub exhausted: bool,
}

/// One active price with its packed order storage.
pub(crate) struct PriceLevel {
    price: u64,
    tombstone: AtomicU32,
    segments: RwLock<Vec<Segment>>,
}

impl PriceLevel {
    /// Fresh level carrying a single order. Tombstone starts at zero.
    pub fn new(price: u64, id: OrderId, quantity: u32) -> Self {
        PriceLevel {
            price,
            tombstone: AtomicU32::new(0),
            segments: RwLock::new(vec![Segment::with_order(id, quantity)]),
        }
    }

    /// Rebuild a level from previously captured segments (restore path).
    /// The tombstone starts at zero; the segments become the active window.
    pub fn from_segments(price: u64, segments: Vec<Segment>) -> Self {
        PriceLevel {
            price,
            tombstone: AtomicU32::new(0),
            segments: RwLock::new(segments),
        }
    }

    #[inline]
    pub fn tombstone_offset(&self) -> u32 {
        self.tombstone.load(Ordering::Acquire)
    }

    /// Advance the skip counter past `delta` fully-consumed segments.
    pub fn advance_tombstone(&self, delta: u32) {
        if delta > 0 {
            self.tombstone.fetch_add(delta, Ordering::AcqRel);
        }
    }

    /// Total allocated segments, tombstoned ones included.
    pub fn segment_count(&self) -> u32 {
        self.segments.read().expect("level lock poisoned").len() as u32
    }

    /// Exact number of live orders in the active window.
    #[allow(dead_code)]
    pub fn order_count(&self) -> u32 {
        let segments = self.segments.read().expect("level lock poisoned");
        let tomb = (self.tombstone_offset() as usize).min(segments.len());
        segments[tomb..]
            .iter()
            .map(|seg| seg.live_slots() as u32)
            .sum()
    }

    /// Whether an insert must overflow to the next tick.
    ///
    /// The level is full when the active window's slot capacity has reached
    /// `max_orders` and the final segment has no trailing room.
    pub fn is_full(&self, max_orders: u32) -> bool {
        let segments = self.segments.read().expect("level lock poisoned");
        let tomb = (self.tombstone_offset() as usize).min(segments.len());
        let active = (segments.len() - tomb) as u32;
        let capacity_used = active * SLOTS_PER_SEGMENT as u32;
        capacity_used >= max_orders && segments.last().is_some_and(Segment::is_full)
    }

    /// Append an order: first empty slot of the final segment, or a new
    /// segment when the final one is full.
    pub fn push(&self, id: OrderId, quantity: u32) {
        let mut segments = self.segments.write().expect("level lock poisoned");
        let appended = segments.last_mut().and_then(|seg| {
            let slot = seg.first_empty_slot()?;
            seg.set_slot(slot, id, quantity);
            Some(())
        });
        if appended.is_none() {
            segments.push(Segment::with_order(id, quantity));
        }
    }

    /// Live `(id, quantity)` pairs in scan order, skipping tombstones.
    pub fn resting_orders(&self) -> Vec<(OrderId, u32)> {
        let segments = self.segments.read().expect("level lock poisoned");
        let tomb = (self.tombstone_offset() as usize).min(segments.len());
        let mut out = Vec::new();
        for seg in &segments[tomb..] {
            for slot in 0..SLOTS_PER_SEGMENT {
                match seg.slot(slot) {
                    Some(pair) => out.push(pair),
                    None => break,
                }
            }
        }
        out
    }

    /// Consume up to `want` units from the front of the level.
    ///
    /// Fully consumed slots are zeroed; a partially consumed slot keeps its
    /// id with the reduced quantity. When a strict prefix of a segment is
    /// eaten the survivors are shifted left so density holds. The tombstone
    /// is NOT advanced here; the matcher either advances it by
    /// `segments_consumed` or, on exhaustion, removes the level.
    pub fn take_up_to(&self, want: u32) -> LevelTake {
        let mut take = LevelTake::default();
        if want == 0 {
            return take;
        }
        let mut remaining = want;
        let mut segments = self.segments.write().expect("level lock poisoned");
        let tomb = (self.tombstone_offset() as usize).min(segments.len());

        for seg in segments[tomb..].iter_mut() {
            let live_before = seg.live_slots();
            let mut consumed_in_seg = 0usize;
            for slot in 0..SLOTS_PER_SEGMENT {
                let Some((id, quantity)) = seg.slot(slot) else {
                    break;
                };
                if remaining >= quantity {
                    remaining -= quantity;
                    take.fills.push(Fill {
                        order_id: id,
                        quantity,
                        price: self.price,
                    });
                    take.cost += u128::from(quantity) * u128::from(self.price);
                    seg.clear_slot(slot);
                    consumed_in_seg += 1;
                    if remaining == 0 {
                        break;
                    }
                } else {
                    seg.set_quantity(slot, quantity - remaining);
                    take.fills.push(Fill {
                        order_id: id,
                        quantity: remaining,
                        price: self.price,
                    });
                    take.cost += u128::from(remaining) * u128::from(self.price);
                    remaining = 0;
                    break;
                }
            }
            if consumed_in_seg == live_before {
                take.segments_consumed += 1;
            } else if consumed_in_seg > 0 {
                seg.drop_prefix(consumed_in_seg);
            }
            if remaining == 0 {
                break;
            }
        }

        take.taken = want - remaining;
        take.exhausted = tomb + take.segments_consumed as usize == segments.len();
        take
    }

    /// Surgically remove one resting order.
    ///
    /// Segments are binary-searched on their slot-0 id: ids are assigned
    /// monotonically and appended in order, so they are strictly increasing
    /// across the active window. Returns the cancelled quantity and whether
    /// the level is now empty (caller must then drop it from the index).
    pub fn cancel(&self, id: OrderId) -> Option<(u32, bool)> {
        let mut segments = self.segments.write().expect("level lock poisoned");
        let tomb = (self.tombstone_offset() as usize).min(segments.len());
        let active = &segments[tomb..];
        if active.is_empty() {
            return None;
        }

        let after = active.partition_point(|seg| seg.slot_id(0).get() <= id.get());
        if after == 0 {
            return None;
        }
        let index = tomb + after - 1;
        let slot = segments[index].position_of(id)?;
        let (_, quantity) = segments[index].slot(slot)?;

        if slot == 0 && segments[index].live_slots() == 1 {
            // Sole occupant: drop the whole segment.
            segments.remove(index);
            let exhausted = segments.len() == tomb;
            Some((quantity, exhausted))
        } else {
            segments[index].shift_left_from(slot);
            Some((quantity, false))
        }
    }

    /// Copy of the active segments, for snapshots.
    pub fn active_segments(&self) -> Vec<Segment> {
        let segments = self.segments.read().expect("level lock poisoned");
        let tomb = (self.tombstone_offset() as usize).min(segments.len());
        segments[tomb..].to_vec()
    }
}
