//! Per-order claimable proceeds.
//!
//! Makers pull their proceeds by order id: coins for orders that sold,
//! items for orders that bought. Amounts only grow between claims and a
//! claim zeroes its entry, so an order "exists" while it rests on the book
//! or while either accumulator is non-zero.

use crate::orderbook::types::{ItemId, OrderId};
use dashmap::DashMap;

/// Coins- and items-claimable accumulators, keyed by order id.
#[derive(Debug, Default)]
pub(crate) struct ClaimableLedger {
    coins: DashMap<OrderId, u128>,
    items: DashMap<(OrderId, ItemId), u64>,
}

impl ClaimableLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add gross sale proceeds to a resting sell order.
    pub fn credit_coins(&self, order_id: OrderId, amount: u128) {
        if amount > 0 {
            *self.coins.entry(order_id).or_insert(0) += amount;
        }
    }

    /// Add delivered items to a resting buy order.
    pub fn credit_items(&self, order_id: OrderId, item_id: ItemId, amount: u64) {
        if amount > 0 {
            *self.items.entry((order_id, item_id)).or_insert(0) += amount;
        }
    }

    /// Coins currently claimable by an order.
    pub fn coins_of(&self, order_id: OrderId) -> u128 {
        self.coins.get(&order_id).map(|v| *v).unwrap_or(0)
    }

    /// Items of one id currently claimable by an order.
    pub fn items_of(&self, order_id: OrderId, item_id: ItemId) -> u64 {
        self.items.get(&(order_id, item_id)).map(|v| *v).unwrap_or(0)
    }

    /// Zero the coin accumulator, returning what it held.
    pub fn take_coins(&self, order_id: OrderId) -> u128 {
        self.coins.remove(&order_id).map(|(_, v)| v).unwrap_or(0)
    }

    /// Zero one item accumulator, returning what it held.
    pub fn take_items(&self, order_id: OrderId, item_id: ItemId) -> u64 {
        self.items
            .remove(&(order_id, item_id))
            .map(|(_, v)| v)
            .unwrap_or(0)
    }

    /// All non-zero coin entries, for snapshots and conservation checks.
    pub fn coin_entries(&self) -> Vec<(OrderId, u128)> {
        self.coins.iter().map(|e| (*e.key(), *e.value())).collect()
    }

    /// All non-zero item entries, for snapshots and conservation checks.
    pub fn item_entries(&self) -> Vec<(OrderId, ItemId, u64)> {
        self.items
            .iter()
            .map(|e| (e.key().0, e.key().1, *e.value()))
            .collect()
    }
}
