//! Fee schedule applied to sell-side proceeds.
//!
//! Rates are expressed in basis points of 10 000 and come from three
//! sources: the royalty oracle (cached by `update_royalty_fee`), the dev
//! fee and the burn fee. Fees are always charged against the seller's
//! gross proceeds, at match time for sell takers and at claim time (with
//! whatever rates are then current) for resting sell makers.

use crate::orderbook::types::{AccountId, BASIS_POINTS};
use serde::{Deserialize, Serialize};

/// The three fee components taken from one gross amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeTake {
    /// Coins owed to the royalty recipient.
    pub royalty: u128,
    /// Coins owed to the dev recipient.
    pub dev: u128,
    /// Coins removed from supply.
    pub burn: u128,
}

impl FeeTake {
    /// Sum of all three components.
    #[must_use]
    #[inline]
    pub fn total(&self) -> u128 {
        self.royalty + self.dev + self.burn
    }
}

/// Current fee configuration.
///
/// The dev rate is stored in 8 bits; the royalty rate is whatever the
/// oracle last reported, clamped to the basis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Dev fee in basis points (8-bit storage).
    pub dev_rate: u8,
    /// Receiver of the dev fee. Zero only while `dev_rate` is zero.
    pub dev_recipient: AccountId,
    /// Burn fee in basis points.
    pub burn_rate: u16,
    /// Royalty fee in basis points, cached from the oracle.
    pub royalty_rate: u16,
    /// Receiver of the royalty fee.
    pub royalty_recipient: AccountId,
}

impl FeeSchedule {
    /// Split `gross` into its fee components at the current rates.
    ///
    /// Each component floors independently; the remainder after
    /// [`FeeTake::total`] is the net owed to the seller.
    #[must_use]
    pub fn split(&self, gross: u128) -> FeeTake {
        FeeTake {
            royalty: gross * u128::from(self.royalty_rate) / BASIS_POINTS,
            dev: gross * u128::from(self.dev_rate) / BASIS_POINTS,
            burn: gross * u128::from(self.burn_rate) / BASIS_POINTS,
        }
    }

    /// Net amount a seller receives from `gross` at the current rates.
    #[must_use]
    #[inline]
    pub fn net(&self, gross: u128) -> u128 {
        gross.saturating_sub(self.split(gross).total())
    }

    /// Whether no fee component is configured.
    #[must_use]
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.dev_rate == 0 && self.burn_rate == 0 && self.royalty_rate == 0
    }
}
