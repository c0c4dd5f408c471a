//! Fee, share and lockup math shared by the vault and reward ledgers.
//!
//! All functions are pure and use floor division. Callers own the
//! state updates; nothing here touches storage.

use odra::casper_types::{U256, U512};

/// Basis points scale (100% = 10000 bps)
pub const BPS_SCALE: u64 = 10_000;

/// Multiplier of an unboosted lock (1x)
pub const BASE_MULTIPLIER_BPS: u32 = 10_000;

/// Lockup tiers as `(minimum heights, multiplier bps)`, ascending.
pub const LOCKUP_TIERS: [(u64, u32); 4] = [
    (0, 10_000),
    (13_140, 15_000),
    (26_280, 20_000),
    (52_560, 30_000),
];

/// `amount * bps / 10000`, floored.
pub fn apply_bps(amount: U256, bps: u32) -> U256 {
    amount
        .checked_mul(U256::from(bps))
        .map(|v| v / U256::from(BPS_SCALE))
        .unwrap_or_default()
}

/// Proportional fee with a floor, never larger than the amount itself.
pub fn fee_with_floor(amount: U256, bps: u32, min_fee: U256) -> U256 {
    apply_bps(amount, bps).max(min_fee).min(amount)
}

/// Shares minted for `net` assets entering a vault.
///
/// The first depositor gets shares 1:1. Afterwards shares are minted
/// against the current share price, rounding down.
pub fn shares_for_deposit(net: U256, total_shares: U256, total_assets: U256) -> U256 {
    if total_shares.is_zero() || total_assets.is_zero() {
        return net;
    }
    net.checked_mul(total_shares)
        .map(|v| v / total_assets)
        .unwrap_or_default()
}

/// Assets represented by `shares`, rounding down.
pub fn assets_for_shares(shares: U256, total_shares: U256, total_assets: U256) -> U256 {
    if total_shares.is_zero() {
        return U256::zero();
    }
    shares
        .checked_mul(total_assets)
        .map(|v| v / total_shares)
        .unwrap_or_default()
}

/// Share price scaled by `scale` (assets per share).
pub fn share_price(total_assets: U256, total_shares: U256, scale: U256) -> U256 {
    if total_shares.is_zero() {
        return scale;
    }
    total_assets
        .checked_mul(scale)
        .map(|v| v / total_shares)
        .unwrap_or_default()
}

/// Multiplier of the highest tier whose threshold does not exceed `lockup`.
pub fn lockup_multiplier_bps(lockup: u64) -> u32 {
    LOCKUP_TIERS
        .iter()
        .rev()
        .find(|(threshold, _)| lockup >= *threshold)
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(BASE_MULTIPLIER_BPS)
}

/// Principal scaled by a multiplier in bps.
pub fn boosted_amount(principal: U256, multiplier_bps: u32) -> U256 {
    apply_bps(principal, multiplier_bps)
}

/// Projected payout for locking `amount` for `lockup` heights.
pub fn potential_boost(amount: U256, lockup: u64) -> U256 {
    boosted_amount(amount, lockup_multiplier_bps(lockup))
}

/// Convert U512 to U256 (native amounts fit in the lower 256 bits)
pub fn u512_to_u256(value: U512) -> U256 {
    let mut bytes = [0u8; 64];
    value.to_little_endian(&mut bytes);
    U256::from_little_endian(&bytes[..32])
}

/// Convert U256 to U512
pub fn u256_to_u512(value: U256) -> U512 {
    let mut bytes = [0u8; 32];
    value.to_little_endian(&mut bytes);
    U512::from_little_endian(&bytes)
}
