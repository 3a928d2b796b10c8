//! Collaborator seams: coin ledger, item custody and royalty oracle.
//!
//! The engine never holds balances itself; it instructs these
//! collaborators after its own book mutations are complete. Hosts plug in
//! real implementations (a chain ledger, a database, a payment rail); the
//! in-memory implementations below back the test suite and double as a
//! reference for the expected semantics. Collaborators are required to be
//! transactional with respect to the engine's state mutation.

use crate::orderbook::types::{AccountId, ItemId};
use dashmap::DashMap;
use thiserror::Error;

/// Failure surfaced by a collaborator during settlement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// A coin movement exceeded the payer's balance.
    #[error("insufficient coins for {account}: need {needed}, have {available}")]
    InsufficientCoins {
        /// The account that could not pay.
        account: AccountId,
        /// Amount the transfer required.
        needed: u128,
        /// Amount actually available.
        available: u128,
    },

    /// An item movement exceeded the holder's balance.
    #[error("insufficient {item_id} for {account}: need {needed}, have {available}")]
    InsufficientItems {
        /// The account that could not deliver.
        account: AccountId,
        /// The item that was short.
        item_id: ItemId,
        /// Amount the transfer required.
        needed: u64,
        /// Amount actually available.
        available: u64,
    },
}

/// Fungible coin movements between accounts and the engine's escrow.
pub trait CoinLedger: Send + Sync {
    /// Move `amount` coins from `from` into the engine's escrow.
    fn transfer_to_core(&self, from: AccountId, amount: u128) -> Result<(), TransferError>;

    /// Move `amount` coins out of escrow to `to`.
    fn transfer_from_core(&self, to: AccountId, amount: u128) -> Result<(), TransferError>;

    /// Destroy `amount` coins held in escrow.
    fn burn(&self, amount: u128) -> Result<(), TransferError>;
}

/// Semi-fungible item movements between accounts and the engine's custody.
pub trait ItemCustody: Send + Sync {
    /// Move a batch of items from `from` into custody.
    fn transfer_batch_to_core(
        &self,
        from: AccountId,
        items: &[(ItemId, u64)],
    ) -> Result<(), TransferError>;

    /// Move a batch of items out of custody to `to`.
    fn transfer_batch_from_core(
        &self,
        to: AccountId,
        items: &[(ItemId, u64)],
    ) -> Result<(), TransferError>;
}

/// Royalty information source, queried by `update_royalty_fee`.
pub trait RoyaltyOracle: Send + Sync {
    /// Recipient and royalty amount for a sale of `gross` on `item_id`,
    /// or `None` when no royalty applies.
    fn royalty_info(&self, item_id: ItemId, gross: u128) -> Option<(AccountId, u128)>;
}

/// Reserved key for coins and items held by the engine itself.
const CORE: AccountId = AccountId(u64::MAX);

/// Coin ledger backed by an in-memory balance table.
#[derive(Debug, Default)]
pub struct InMemoryCoinLedger {
    balances: DashMap<AccountId, u128>,
}

impl InMemoryCoinLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account out of thin air (test setup).
    pub fn mint(&self, account: AccountId, amount: u128) {
        *self.balances.entry(account).or_insert(0) += amount;
    }

    /// Current balance of an account.
    pub fn balance_of(&self, account: AccountId) -> u128 {
        self.balances.get(&account).map(|v| *v).unwrap_or(0)
    }

    /// Coins currently escrowed by the engine.
    pub fn core_balance(&self) -> u128 {
        self.balance_of(CORE)
    }

    fn transfer(&self, from: AccountId, to: AccountId, amount: u128) -> Result<(), TransferError> {
        if amount == 0 {
            return Ok(());
        }
        {
            let mut src = self.balances.entry(from).or_insert(0);
            if *src < amount {
                return Err(TransferError::InsufficientCoins {
                    account: from,
                    needed: amount,
                    available: *src,
                });
            }
            *src -= amount;
        }
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }
}

impl CoinLedger for InMemoryCoinLedger {
    fn transfer_to_core(&self, from: AccountId, amount: u128) -> Result<(), TransferError> {
        self.transfer(from, CORE, amount)
    }

    fn transfer_from_core(&self, to: AccountId, amount: u128) -> Result<(), TransferError> {
        self.transfer(CORE, to, amount)
    }

    fn burn(&self, amount: u128) -> Result<(), TransferError> {
        if amount == 0 {
            return Ok(());
        }
        let mut core = self.balances.entry(CORE).or_insert(0);
        if *core < amount {
            return Err(TransferError::InsufficientCoins {
                account: CORE,
                needed: amount,
                available: *core,
            });
        }
        *core -= amount;
        Ok(())
    }
}

/// Item custody backed by an in-memory balance table.
#[derive(Debug, Default)]
pub struct InMemoryItemCustody {
    balances: DashMap<(AccountId, ItemId), u64>,
}

impl InMemoryItemCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account with items (test setup).
    pub fn mint(&self, account: AccountId, item_id: ItemId, amount: u64) {
        *self.balances.entry((account, item_id)).or_insert(0) += amount;
    }

    /// Current holding of one item by an account.
    pub fn balance_of(&self, account: AccountId, item_id: ItemId) -> u64 {
        self.balances
            .get(&(account, item_id))
            .map(|v| *v)
            .unwrap_or(0)
    }

    /// Items of one id currently in the engine's custody.
    pub fn core_balance(&self, item_id: ItemId) -> u64 {
        self.balance_of(CORE, item_id)
    }

    fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        items: &[(ItemId, u64)],
    ) -> Result<(), TransferError> {
        // Validate the whole batch before moving anything.
        for &(item_id, amount) in items {
            let available = self.balance_of(from, item_id);
            if available < amount {
                return Err(TransferError::InsufficientItems {
                    account: from,
                    item_id,
                    needed: amount,
                    available,
                });
            }
        }
        for &(item_id, amount) in items {
            if amount == 0 {
                continue;
            }
            *self.balances.entry((from, item_id)).or_insert(0) -= amount;
            *self.balances.entry((to, item_id)).or_insert(0) += amount;
        }
        Ok(())
    }
}

impl ItemCustody for InMemoryItemCustody {
    fn transfer_batch_to_core(
        &self,
        from: AccountId,
        items: &[(ItemId, u64)],
    ) -> Result<(), TransferError> {
        self.transfer(from, CORE, items)
    }

    fn transfer_batch_from_core(
        &self,
        to: AccountId,
        items: &[(ItemId, u64)],
    ) -> Result<(), TransferError> {
        self.transfer(CORE, to, items)
    }
}

/// Oracle reporting one fixed recipient and rate for every item.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoyaltyOracle {
    /// Receiver of all royalties.
    pub recipient: AccountId,
    /// Rate in basis points of 10 000.
    pub rate_bps: u16,
}

impl RoyaltyOracle for FixedRoyaltyOracle {
    fn royalty_info(&self, _item_id: ItemId, gross: u128) -> Option<(AccountId, u128)> {
        if self.recipient.is_zero() || self.rate_bps == 0 {
            return None;
        }
        Some((self.recipient, gross * u128::from(self.rate_bps) / 10_000))
    }
}

/// Oracle reporting no royalty for any item.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRoyalty;

impl RoyaltyOracle for NoRoyalty {
    fn royalty_info(&self, _item_id: ItemId, _gross: u128) -> Option<(AccountId, u128)> {
        None
    }
}
