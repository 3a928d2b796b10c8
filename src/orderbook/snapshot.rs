//! Market snapshot with integrity checking.
//!
//! A snapshot is a JSON-serializable dump of everything a market would
//! need to come back observably equivalent: each level's active segments
//! as packed little-endian words (tombstoned segments normalized away),
//! the maker table, claimable accumulators, item configs, fee schedule
//! and counters. The package wrapper adds a format version and a SHA-256
//! checksum so a corrupted or truncated dump is rejected instead of
//! restored.

use crate::orderbook::custody::{CoinLedger, ItemCustody, RoyaltyOracle};
use crate::orderbook::error::MarketError;
use crate::orderbook::fees::FeeSchedule;
use crate::orderbook::market::Market;
use crate::orderbook::segment::Segment;
use crate::orderbook::types::{AccountId, ItemConfig, ItemId, OrderId, Side};
use crate::utils::current_time_millis;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Bumped whenever the snapshot layout changes incompatibly.
pub const MARKET_SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// One price level's active segments, each a 256-bit little-endian word
/// of four packed `(quantity:u24 | id:u40)` slots, as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    /// The level's price.
    pub price: u64,
    /// Active segments in scan order, tombstoned ones dropped.
    pub segments: Vec<String>,
}

fn encode_segment(segment: &Segment) -> String {
    segment
        .to_le_bytes()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn decode_segment(hex: &str) -> Result<Segment, MarketError> {
    let malformed = || MarketError::DeserializationError {
        message: format!("malformed segment word: {hex:?}"),
    };
    if hex.len() != 64 || !hex.is_ascii() {
        return Err(malformed());
    }
    let mut bytes = [0u8; 32];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| malformed())?;
    }
    Ok(Segment::from_le_bytes(bytes))
}

/// Both sides of one item's book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// The item this book trades.
    pub item_id: ItemId,
    /// Bid levels, ascending by price.
    pub bids: Vec<LevelSnapshot>,
    /// Ask levels, ascending by price.
    pub asks: Vec<LevelSnapshot>,
}

/// Full dump of a market's observable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Milliseconds since the epoch at capture time.
    pub timestamp: u64,
    /// The id the next resting order will receive.
    pub next_order_id: u64,
    /// Per-level resting order cap.
    pub max_orders_per_price: u32,
    /// Fee schedule, royalty cache included.
    pub fees: FeeSchedule,
    /// Item configurations, sorted by item id.
    pub item_configs: Vec<(ItemId, ItemConfig)>,
    /// Per-item books, sorted by item id.
    pub books: Vec<BookSnapshot>,
    /// Maker table, sorted by order id.
    pub makers: Vec<(OrderId, AccountId)>,
    /// Coins-claimable entries, sorted by order id.
    pub coins_claimable: Vec<(OrderId, u128)>,
    /// Items-claimable entries, sorted by `(order, item)`.
    pub items_claimable: Vec<(OrderId, ItemId, u64)>,
}

/// Versioned, checksummed envelope around a [`MarketSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPackage {
    /// Format version of the contained snapshot.
    pub version: u32,
    /// The snapshot itself.
    pub snapshot: MarketSnapshot,
    /// SHA-256 of the snapshot's JSON encoding, lowercase hex.
    pub checksum: String,
}

impl SnapshotPackage {
    /// Wrap a snapshot, computing its checksum.
    pub fn new(snapshot: MarketSnapshot) -> Result<Self, MarketError> {
        let checksum = Self::compute_checksum(&snapshot)?;
        Ok(SnapshotPackage {
            version: MARKET_SNAPSHOT_FORMAT_VERSION,
            snapshot,
            checksum,
        })
    }

    /// Serialize the package to JSON.
    pub fn to_json(&self) -> Result<String, MarketError> {
        serde_json::to_string(self).map_err(|error| MarketError::SerializationError {
            message: error.to_string(),
        })
    }

    /// Deserialize a package from JSON. Integrity is not checked here;
    /// call [`Self::validate`] or [`Self::into_snapshot`].
    pub fn from_json(data: &str) -> Result<Self, MarketError> {
        serde_json::from_str(data).map_err(|error| MarketError::DeserializationError {
            message: error.to_string(),
        })
    }

    /// Verify version and checksum.
    pub fn validate(&self) -> Result<(), MarketError> {
        if self.version != MARKET_SNAPSHOT_FORMAT_VERSION {
            return Err(MarketError::UnsupportedSnapshotVersion {
                found: self.version,
                expected: MARKET_SNAPSHOT_FORMAT_VERSION,
            });
        }
        let computed = Self::compute_checksum(&self.snapshot)?;
        if computed != self.checksum {
            return Err(MarketError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual: computed,
            });
        }
        Ok(())
    }

    /// Consume the package, returning the validated snapshot.
    pub fn into_snapshot(self) -> Result<MarketSnapshot, MarketError> {
        self.validate()?;
        Ok(self.snapshot)
    }

    fn compute_checksum(snapshot: &MarketSnapshot) -> Result<String, MarketError> {
        let payload =
            serde_json::to_vec(snapshot).map_err(|error| MarketError::SerializationError {
                message: error.to_string(),
            })?;
        let mut hasher = Sha256::new();
        hasher.update(payload);
        let digest = hasher.finalize();
        Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }
}

impl Market {
    /// Capture the market's observable state.
    ///
    /// Collections are sorted so the same state always produces the same
    /// checksum. Tombstoned segments are normalized away: a restored
    /// market holds the same orders in the same priority order, with
    /// fresh segment allocations.
    pub fn snapshot(&self) -> MarketSnapshot {
        let mut books: Vec<BookSnapshot> = self
            .books_iter()
            .into_iter()
            .map(|book| {
                let dump_side = |side: Side| -> Vec<LevelSnapshot> {
                    book.side_levels(side)
                        .iter()
                        .map(|entry| LevelSnapshot {
                            price: *entry.key(),
                            segments: entry
                                .value()
                                .active_segments()
                                .iter()
                                .map(encode_segment)
                                .collect(),
                        })
                        .collect()
                };
                BookSnapshot {
                    item_id: book.item_id(),
                    bids: dump_side(Side::Buy),
                    asks: dump_side(Side::Sell),
                }
            })
            .collect();
        books.sort_by_key(|book| book.item_id);

        let mut item_configs = self.item_config_entries();
        item_configs.sort_by_key(|(item_id, _)| *item_id);
        let mut makers = self.maker_entries();
        makers.sort_by_key(|(order_id, _)| *order_id);
        let mut coins_claimable = self.claims().coin_entries();
        coins_claimable.sort_by_key(|(order_id, _)| *order_id);
        let mut items_claimable = self.claims().item_entries();
        items_claimable.sort_by_key(|(order_id, item_id, _)| (*order_id, *item_id));

        MarketSnapshot {
            timestamp: current_time_millis(),
            next_order_id: self.next_order_id(),
            max_orders_per_price: self.max_orders_per_price(),
            fees: self.fee_schedule(),
            item_configs,
            books,
            makers,
            coins_claimable,
            items_claimable,
        }
    }

    /// Rebuild a market from a snapshot, wired to fresh collaborators.
    pub fn restore(
        snapshot: MarketSnapshot,
        coins: Arc<dyn CoinLedger>,
        items: Arc<dyn ItemCustody>,
        royalties: Arc<dyn RoyaltyOracle>,
    ) -> Result<Market, MarketError> {
        let market = Market::new(coins, items, royalties);
        market.restore_counters(snapshot.next_order_id, snapshot.max_orders_per_price);
        market.restore_fees(snapshot.fees);
        for (item_id, config) in snapshot.item_configs {
            market.restore_item_config(item_id, config);
        }
        for book_snapshot in snapshot.books {
            let book = market.restore_book(book_snapshot.item_id);
            for (side, levels) in [
                (Side::Buy, book_snapshot.bids),
                (Side::Sell, book_snapshot.asks),
            ] {
                for level in levels {
                    let segments = level
                        .segments
                        .iter()
                        .map(|hex| decode_segment(hex))
                        .collect::<Result<Vec<_>, _>>()?;
                    book.install_level(side, level.price, segments);
                }
            }
        }
        for (order_id, maker) in snapshot.makers {
            market.restore_maker(order_id, maker);
        }
        for (order_id, amount) in snapshot.coins_claimable {
            market.claims().credit_coins(order_id, amount);
        }
        for (order_id, item_id, amount) in snapshot.items_claimable {
            market.claims().credit_items(order_id, item_id, amount);
        }
        Ok(market)
    }
}
