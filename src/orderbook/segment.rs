//! Packed per-price order storage.
//!
//! A [`Segment`] is one 256-bit word holding up to four order slots. Each
//! slot is a 64-bit value with the quantity in the upper 24 bits and the
//! order id in the lower 40. Slots are kept dense from the left: no empty
//! slot ever precedes a live one inside a segment.

use crate::orderbook::types::{MAX_ORDER_ID, ORDER_ID_BITS, OrderId, SLOTS_PER_SEGMENT};

const ID_MASK: u64 = MAX_ORDER_ID;

#[inline]
fn pack(id: OrderId, quantity: u32) -> u64 {
    (u64::from(quantity) << ORDER_ID_BITS) | id.get()
}

/// Four packed `(quantity:u24 | order_id:u40)` slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment([u64; SLOTS_PER_SEGMENT]);

impl Segment {
    /// A segment with every slot empty.
    #[must_use]
    pub fn empty() -> Self {
        Segment([0; SLOTS_PER_SEGMENT])
    }

    /// A fresh segment carrying a single order in slot 0.
    #[must_use]
    pub fn with_order(id: OrderId, quantity: u32) -> Self {
        let mut seg = Segment::empty();
        seg.0[0] = pack(id, quantity);
        seg
    }

    /// Order id stored in `slot`, `OrderId::EMPTY` when unused.
    #[must_use]
    #[inline]
    pub fn slot_id(&self, slot: usize) -> OrderId {
        OrderId::new(self.0[slot] & ID_MASK).unwrap_or(OrderId::EMPTY)
    }

    /// `(id, quantity)` stored in `slot`, `None` when the slot is empty.
    #[must_use]
    #[inline]
    pub fn slot(&self, slot: usize) -> Option<(OrderId, u32)> {
        let word = self.0[slot];
        if word & ID_MASK == 0 {
            return None;
        }
        let id = OrderId::new(word & ID_MASK)?;
        Some((id, (word >> ORDER_ID_BITS) as u32))
    }

    /// Write `(id, quantity)` into `slot`, replacing whatever was there.
    #[inline]
    pub fn set_slot(&mut self, slot: usize, id: OrderId, quantity: u32) {
        self.0[slot] = pack(id, quantity);
    }

    /// Rewrite only the quantity of a live slot.
    #[inline]
    pub fn set_quantity(&mut self, slot: usize, quantity: u32) {
        self.0[slot] = (u64::from(quantity) << ORDER_ID_BITS) | (self.0[slot] & ID_MASK);
    }

    /// Zero out `slot`.
    #[inline]
    pub fn clear_slot(&mut self, slot: usize) {
        self.0[slot] = 0;
    }

    /// Index of the first empty slot, `None` when all four are live.
    #[must_use]
    pub fn first_empty_slot(&self) -> Option<usize> {
        (0..SLOTS_PER_SEGMENT).find(|&i| self.0[i] & ID_MASK == 0)
    }

    /// Number of live slots. Density makes this the first-empty index.
    #[must_use]
    pub fn live_slots(&self) -> usize {
        self.first_empty_slot().unwrap_or(SLOTS_PER_SEGMENT)
    }

    /// Whether no slot is live.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0[0] & ID_MASK == 0
    }

    /// Whether the last slot is live, i.e. the segment has no room left.
    #[must_use]
    #[inline]
    pub fn is_full(&self) -> bool {
        self.0[SLOTS_PER_SEGMENT - 1] & ID_MASK != 0
    }

    /// Slot index holding `id`, scanning the live prefix.
    #[must_use]
    pub fn position_of(&self, id: OrderId) -> Option<usize> {
        (0..SLOTS_PER_SEGMENT).find(|&i| self.0[i] & ID_MASK == id.get() && !id.is_empty())
    }

    /// Remove `slot` and shift every later slot one position left, zeroing
    /// the vacated tail slot.
    pub fn shift_left_from(&mut self, slot: usize) {
        for i in slot..SLOTS_PER_SEGMENT - 1 {
            self.0[i] = self.0[i + 1];
        }
        self.0[SLOTS_PER_SEGMENT - 1] = 0;
    }

    /// Drop the first `consumed` slots and move the survivors to the front.
    ///
    /// Used after a taker eats a strict prefix of the segment.
    pub fn drop_prefix(&mut self, consumed: usize) {
        if consumed == 0 {
            return;
        }
        for i in 0..SLOTS_PER_SEGMENT {
            let src = i + consumed;
            self.0[i] = if src < SLOTS_PER_SEGMENT { self.0[src] } else { 0 };
        }
    }

    /// The segment as one little-endian 32-byte word.
    #[must_use]
    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (i, word) in self.0.iter().enumerate() {
            out[i * 8..(i + 1) * 8].copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Rebuild a segment from its little-endian 32-byte encoding.
    #[must_use]
    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        let mut words = [0u64; SLOTS_PER_SEGMENT];
        for (i, word) in words.iter_mut().enumerate() {
            let mut chunk = [0u8; 8];
            chunk.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            *word = u64::from_le_bytes(chunk);
        }
        Segment(words)
    }
}
