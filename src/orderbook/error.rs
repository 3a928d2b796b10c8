//! Market error types

use crate::orderbook::custody::TransferError;
use crate::orderbook::types::{AccountId, ItemId, OrderId, Side};
use std::fmt;

/// Errors that can occur within the market engine.
///
/// Every validation error aborts the whole call; the only non-fatal
/// per-order condition (a residual below the item's minimum quantity) is
/// reported through the event stream instead of this enum.
#[derive(Debug)]
#[non_exhaustive]
pub enum MarketError {
    /// Order quantity is zero
    NoQuantity,

    /// Order price is zero
    PriceZero,

    /// Order quantity does not fit in a 24-bit slot
    QuantityTooLarge {
        /// The offending quantity
        quantity: u32,
    },

    /// The item has no tick configured (`tick == 0`)
    ItemNotListed {
        /// The item that was referenced
        item_id: ItemId,
    },

    /// Order price is not a multiple of the item's tick
    PriceNotMultipleOfTick {
        /// The order price that failed validation
        price: u64,
        /// The configured tick
        tick: u64,
    },

    /// Parallel input arrays differ in length
    LengthMismatch {
        /// Length of the first array
        left: usize,
        /// Length of the second array
        right: usize,
    },

    /// A taker walk consumed too many maker orders
    TooManyOrdersHit {
        /// The per-call match cap
        limit: usize,
    },

    /// A claim call referenced too many order ids
    TooManyClaims {
        /// The per-call claim cap
        limit: usize,
    },

    /// Cancel referenced a price level absent from the index
    OrderNotFoundInTree {
        /// Side of the missing level
        side: Side,
        /// Price of the missing level
        price: u64,
    },

    /// The order id is not present at its claimed price level
    OrderNotFound {
        /// The order that was referenced
        order_id: OrderId,
    },

    /// Caller does not own the order
    NotMaker {
        /// The order that was referenced
        order_id: OrderId,
        /// The caller that was rejected
        caller: AccountId,
    },

    /// Claim referenced an order with nothing accrued
    NothingToClaim {
        /// The order that was referenced
        order_id: OrderId,
    },

    /// Admin attempted to change a non-zero tick
    TickCannotBeChanged {
        /// The item whose tick is frozen
        item_id: ItemId,
    },

    /// `max_orders_per_price` must be a multiple of the segment slot count
    MaxOrdersNotMultipleOfSlots {
        /// The rejected value
        value: u32,
    },

    /// Dev fee rate does not fit the schedule
    DevFeeTooHigh {
        /// The rejected rate in basis points
        rate: u16,
    },

    /// Dev recipient set while the dev rate is zero
    DevFeeNotSet,

    /// Dev rate set while the recipient is the zero identity
    ZeroRecipient,

    /// An external transfer failed
    Transfer(TransferError),

    /// Error while serializing snapshot data
    SerializationError {
        /// Underlying error message
        message: String,
    },

    /// Error while deserializing snapshot data
    DeserializationError {
        /// Underlying error message
        message: String,
    },

    /// Snapshot integrity check failed
    ChecksumMismatch {
        /// Expected checksum value
        expected: String,
        /// Actual checksum value
        actual: String,
    },

    /// Snapshot was produced by an unsupported format version
    UnsupportedSnapshotVersion {
        /// Version found in the package
        found: u32,
        /// Version this build understands
        expected: u32,
    },
}

impl fmt::Display for MarketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketError::NoQuantity => write!(f, "order quantity is zero"),
            MarketError::PriceZero => write!(f, "order price is zero"),
            MarketError::QuantityTooLarge { quantity } => {
                write!(f, "quantity {quantity} does not fit in a 24-bit slot")
            }
            MarketError::ItemNotListed { item_id } => {
                write!(f, "{item_id} is not listed (tick is zero)")
            }
            MarketError::PriceNotMultipleOfTick { price, tick } => {
                write!(f, "price {price} is not a multiple of tick {tick}")
            }
            MarketError::LengthMismatch { left, right } => {
                write!(f, "parallel arrays differ in length: {left} vs {right}")
            }
            MarketError::TooManyOrdersHit { limit } => {
                write!(f, "taker hit more than {limit} resting orders")
            }
            MarketError::TooManyClaims { limit } => {
                write!(f, "claim references more than {limit} orders")
            }
            MarketError::OrderNotFoundInTree { side, price } => {
                write!(f, "no {side} price level at {price}")
            }
            MarketError::OrderNotFound { order_id } => {
                write!(f, "order {order_id} not found at its price level")
            }
            MarketError::NotMaker { order_id, caller } => {
                write!(f, "{caller} is not the maker of order {order_id}")
            }
            MarketError::NothingToClaim { order_id } => {
                write!(f, "order {order_id} has nothing to claim")
            }
            MarketError::TickCannotBeChanged { item_id } => {
                write!(f, "tick for {item_id} is set and cannot be changed")
            }
            MarketError::MaxOrdersNotMultipleOfSlots { value } => {
                write!(
                    f,
                    "max orders per price {value} is not a multiple of the segment slot count"
                )
            }
            MarketError::DevFeeTooHigh { rate } => {
                write!(f, "dev fee rate {rate} bps is too high")
            }
            MarketError::DevFeeNotSet => {
                write!(f, "dev recipient set but the dev rate is zero")
            }
            MarketError::ZeroRecipient => {
                write!(f, "dev rate set but the recipient is the zero identity")
            }
            MarketError::Transfer(err) => write!(f, "transfer failed: {err}"),
            MarketError::SerializationError { message } => {
                write!(f, "serialization error: {message}")
            }
            MarketError::DeserializationError { message } => {
                write!(f, "deserialization error: {message}")
            }
            MarketError::ChecksumMismatch { expected, actual } => {
                write!(
                    f,
                    "checksum mismatch: expected {expected}, but computed {actual}"
                )
            }
            MarketError::UnsupportedSnapshotVersion { found, expected } => {
                write!(
                    f,
                    "unsupported snapshot version {found} (expected {expected})"
                )
            }
        }
    }
}

impl std::error::Error for MarketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MarketError::Transfer(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransferError> for MarketError {
    fn from(err: TransferError) -> Self {
        MarketError::Transfer(err)
    }
}
