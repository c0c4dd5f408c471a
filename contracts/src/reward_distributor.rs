//! Reward distributor: funded reward pool, claimable balances, boosted
//! locks, referrals, merit scores, epochs and merkle airdrops.
//!
//! ## Pool accounting
//!
//! `total_distributed` counts everything credited to claimable balances
//! and `total_locked` the principal currently sitting in locks. Every
//! credit must fit the pool capacity
//! (`total_funded - total_distributed - total_locked`), so promised
//! rewards never exceed what was funded.
//!
//! Locking moves an amount from distributed to locked. Releasing a lock
//! moves the principal back out and credits the payout, so only the
//! boost (or, for an early unlock, nothing) consumes fresh capacity.
//!
//! Referral bonuses are credited unconditionally and tracked in their own
//! bucket, which also counts against capacity.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::access_control::{AccessControl, ROLE_ADMIN, ROLE_FEE_SOURCE};
use crate::clock::height_at;
use crate::errors::RewardError;
use crate::math::{
    apply_bps, boosted_amount, lockup_multiplier_bps, potential_boost, u256_to_u512,
    u512_to_u256, BPS_SCALE,
};
use crate::merkle::{leaf_hash, verify_proof, Hash};
use crate::types::{
    default_reward_config, LockRecord, LockStatus, MeritScore, PenaltyBasis, ReferralRecord,
    ReferralStats, RewardConfig, RewardEpoch, RewardPoolStats,
};

pub mod events {
    use odra::prelude::*;
    use odra::casper_types::U256;

    #[odra::event]
    pub struct PoolFunded {
        pub from: Address,
        pub amount: U256,
        pub total_funded: U256,
    }

    #[odra::event]
    pub struct RewardsDistributed {
        pub user: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct RewardsClaimed {
        pub user: Address,
        pub net: U256,
        pub fee: U256,
    }

    #[odra::event]
    pub struct RewardsLocked {
        pub user: Address,
        pub lock_id: u64,
        pub amount: U256,
        pub lockup_heights: u64,
        pub multiplier_bps: u32,
    }

    #[odra::event]
    pub struct RewardsUnlocked {
        pub user: Address,
        pub lock_id: u64,
        pub payout: U256,
        pub early: bool,
    }

    #[odra::event]
    pub struct ReferralRegistered {
        pub referrer: Address,
        pub referee: Address,
    }

    #[odra::event]
    pub struct ReferralRewarded {
        pub referrer: Address,
        pub referee: Address,
        pub bonus: U256,
    }

    #[odra::event]
    pub struct MeritScoreUpdated {
        pub user: Address,
        pub total: u64,
    }

    #[odra::event]
    pub struct EpochCreated {
        pub epoch_id: u64,
        pub total_rewards: U256,
        pub duration_heights: u64,
    }

    #[odra::event]
    pub struct EpochRewardsDistributed {
        pub epoch_id: u64,
        pub user: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct MerkleRootSet {
        pub root: [u8; 32],
    }

    #[odra::event]
    pub struct AirdropClaimsReset {
        pub round: u64,
    }

    #[odra::event]
    pub struct AirdropClaimed {
        pub user: Address,
        pub leaf_index: u64,
        pub amount: U256,
    }

    #[odra::event]
    pub struct RewardConfigUpdated {
        pub by: Address,
    }
}

/// Reward distributor contract
#[odra::module(events = [
    events::PoolFunded,
    events::RewardsDistributed,
    events::RewardsClaimed,
    events::RewardsLocked,
    events::RewardsUnlocked,
    events::ReferralRegistered,
    events::ReferralRewarded,
    events::MeritScoreUpdated,
    events::EpochCreated,
    events::EpochRewardsDistributed,
    events::MerkleRootSet,
    events::AirdropClaimsReset,
    events::AirdropClaimed,
    events::RewardConfigUpdated
])]
pub struct RewardDistributor {
    access: SubModule<AccessControl>,
    pool: Var<RewardPoolStats>,
    /// Claimable balance per user
    claimable: Mapping<Address, U256>,
    /// (user, lock id) -> lock
    locks: Mapping<(Address, u64), LockRecord>,
    /// Locks created per user; the next lock id
    lock_counts: Mapping<Address, u64>,
    /// Referee -> referral link
    referrals: Mapping<Address, ReferralRecord>,
    /// Referrer -> stats
    referral_stats: Mapping<Address, ReferralStats>,
    merit_scores: Mapping<Address, MeritScore>,
    /// Epochs by id (ids start at 1)
    epochs: Mapping<u64, RewardEpoch>,
    epoch_count: Var<u64>,
    merkle_root: Var<Option<Hash>>,
    /// Bumped by `reset_airdrop_claims`; claims are tracked per round
    claim_round: Var<u64>,
    /// (round, leaf index) -> claimed
    airdrop_claimed: Mapping<(u64, u64), bool>,
    config: Var<RewardConfig>,
}

#[odra::module]
impl RewardDistributor {
    /// Initialize the distributor. `None` selects the default configuration.
    pub fn init(&mut self, admin: Address, config: Option<RewardConfig>) {
        let config = config.unwrap_or_else(default_reward_config);
        self.validate_config(&config);
        self.access.init(admin);
        self.config.set(config);
        self.pool.set(RewardPoolStats::default());
        self.merkle_root.set(None);
        self.claim_round.set(0);
    }

    // ========== Pool Funding ==========

    /// Fund the reward pool with the attached value (admin only)
    #[odra(payable)]
    pub fn fund_reward_pool(&mut self, amount: U256) -> U256 {
        self.require_admin();
        if amount.is_zero() || u512_to_u256(self.env().attached_value()) != amount {
            self.env().revert(RewardError::InvalidAmount);
        }
        self.add_funding(amount)
    }

    /// Accept protocol fees forwarded by a fee source contract
    #[odra(payable)]
    pub fn receive_protocol_fees(&mut self) -> U256 {
        self.access
            .require_any_role(&[ROLE_FEE_SOURCE, ROLE_ADMIN], RewardError::NotAuthorized);
        let amount = u512_to_u256(self.env().attached_value());
        if amount.is_zero() {
            self.env().revert(RewardError::InvalidAmount);
        }
        self.add_funding(amount)
    }

    /// Credit rewards to a user (admin only). Returns the credited amount.
    pub fn distribute_rewards(&mut self, user: Address, amount: U256) -> U256 {
        self.require_admin();
        if amount.is_zero() {
            self.env().revert(RewardError::InvalidAmount);
        }
        self.credit(user, amount);
        self.env().emit_event(events::RewardsDistributed { user, amount });
        amount
    }

    // ========== Claims ==========

    /// Withdraw the caller's whole claimable balance minus the claim fee.
    /// Returns the net amount transferred.
    pub fn claim_rewards(&mut self) -> U256 {
        let user = self.env().caller();
        let claimable = self.get_user_rewards(user);
        if claimable.is_zero() {
            self.env().revert(RewardError::InsufficientRewards);
        }

        let fee = apply_bps(claimable, self.get_config().claim_fee_bps);
        let net = claimable - fee;
        self.claimable.set(&user, U256::zero());

        let mut pool = self.get_pool_stats();
        pool.total_claimed += claimable;
        pool.claim_fees += fee;
        self.pool.set(pool);

        self.env().transfer_tokens(&user, &u256_to_u512(net));
        self.env().emit_event(events::RewardsClaimed { user, net, fee });
        net
    }

    // ========== Locks ==========

    /// Lock part of the caller's claimable balance for a multiplier.
    /// Returns the lock id (per user, from 0).
    pub fn lock_rewards(&mut self, amount: U256, lockup_heights: u64) -> u64 {
        let user = self.env().caller();
        let claimable = self.get_user_rewards(user);
        if amount.is_zero() || amount > claimable {
            self.env().revert(RewardError::InsufficientRewards);
        }

        self.claimable.set(&user, claimable - amount);
        let mut pool = self.get_pool_stats();
        pool.total_distributed = pool.total_distributed.saturating_sub(amount);
        pool.total_locked += amount;
        self.pool.set(pool);

        let lock_id = self.get_user_lock_count(user);
        let multiplier_bps = lockup_multiplier_bps(lockup_heights);
        self.locks.set(
            &(user, lock_id),
            LockRecord {
                principal: amount,
                lockup_heights,
                multiplier_bps,
                created_at: self.current_height(),
                status: LockStatus::Active,
            },
        );
        self.lock_counts.set(&user, lock_id + 1);

        self.env().emit_event(events::RewardsLocked {
            user,
            lock_id,
            amount,
            lockup_heights,
            multiplier_bps,
        });
        lock_id
    }

    /// Release a matured lock. Credits principal times multiplier.
    pub fn unlock_rewards(&mut self, lock_id: u64) -> U256 {
        let user = self.env().caller();
        let mut lock = self.require_active_lock(user, lock_id);
        if self.current_height() < lock.unlocks_at() {
            self.env().revert(RewardError::StillLocked);
        }

        let payout = boosted_amount(lock.principal, lock.multiplier_bps);
        self.release(user, lock.principal, payout);
        lock.status = LockStatus::Matured;
        self.locks.set(&(user, lock_id), lock);

        self.env().emit_event(events::RewardsUnlocked {
            user,
            lock_id,
            payout,
            early: false,
        });
        payout
    }

    /// Release a lock before maturity with the early unlock penalty.
    pub fn unlock_early(&mut self, lock_id: u64) -> U256 {
        let user = self.env().caller();
        let mut lock = self.require_active_lock(user, lock_id);
        if self.current_height() >= lock.unlocks_at() {
            self.env().revert(RewardError::LockMatured);
        }

        let config = self.get_config();
        let basis = match config.penalty_basis {
            PenaltyBasis::Principal => lock.principal,
            PenaltyBasis::Boosted => boosted_amount(lock.principal, lock.multiplier_bps),
        };
        let payout = basis - apply_bps(basis, config.early_unlock_penalty_bps);
        self.release(user, lock.principal, payout);
        lock.status = LockStatus::EarlyUnlocked;
        self.locks.set(&(user, lock_id), lock);

        self.env().emit_event(events::RewardsUnlocked {
            user,
            lock_id,
            payout,
            early: true,
        });
        payout
    }

    /// Payout for locking `amount` for `lockup_heights`
    pub fn calculate_potential_boost(&self, amount: U256, lockup_heights: u64) -> U256 {
        potential_boost(amount, lockup_heights)
    }

    // ========== Referrals ==========

    /// Link the caller to a referrer. Each account may be referred once.
    pub fn register_referral(&mut self, referrer: Address) -> bool {
        let referee = self.env().caller();
        if referrer == referee {
            self.env().revert(RewardError::NotAuthorized);
        }
        if self.referrals.get(&referee).is_some() {
            self.env().revert(RewardError::ReferralExists);
        }

        self.referrals.set(
            &referee,
            ReferralRecord {
                referrer,
                registered_at: self.current_height(),
            },
        );
        let mut stats = self.referral_stats.get(&referrer).unwrap_or_default();
        stats.referees.push(referee);
        self.referral_stats.set(&referrer, stats);

        self.env().emit_event(events::ReferralRegistered { referrer, referee });
        true
    }

    /// Credit the referrer of `referee` with a share of `fee_amount`.
    /// Open to any caller; the bonus is not bounded by pool capacity.
    /// Returns the bonus.
    pub fn process_referral_reward(&mut self, referee: Address, fee_amount: U256) -> U256 {
        let referrer = self
            .referrals
            .get(&referee)
            .map(|record| record.referrer)
            .unwrap_or_else(|| self.env().revert(RewardError::ReferrerNotFound));

        let bonus = apply_bps(fee_amount, self.get_config().referral_bonus_bps);
        if !bonus.is_zero() {
            let mut pool = self.get_pool_stats();
            pool.referral_bonuses += bonus;
            self.pool.set(pool);
            let balance = self.get_user_rewards(referrer) + bonus;
            self.claimable.set(&referrer, balance);
        }

        let mut stats = self.referral_stats.get(&referrer).unwrap_or_default();
        stats.count += 1;
        stats.total_bonus += bonus;
        self.referral_stats.set(&referrer, stats);

        self.env().emit_event(events::ReferralRewarded {
            referrer,
            referee,
            bonus,
        });
        bonus
    }

    pub fn get_referral_info(&self, referee: Address) -> Option<ReferralRecord> {
        self.referrals.get(&referee)
    }

    /// Referees registered under `referrer`; `count` counts rewarded referrals
    pub fn get_referral_stats(&self, referrer: Address) -> Option<ReferralStats> {
        self.referral_stats.get(&referrer)
    }

    // ========== Merit Scores ==========

    /// Overwrite a user's merit score (admin only). Returns the total.
    pub fn update_merit_score(&mut self, user: Address, tvl: u64, activity: u64, loyalty: u64) -> u64 {
        self.require_admin();
        let total = tvl.saturating_add(activity).saturating_add(loyalty);
        self.merit_scores.set(
            &user,
            MeritScore {
                tvl,
                activity,
                loyalty,
                total,
                updated_at: self.current_height(),
            },
        );
        self.env().emit_event(events::MeritScoreUpdated { user, total });
        total
    }

    pub fn get_merit_score(&self, user: Address) -> Option<MeritScore> {
        self.merit_scores.get(&user)
    }

    // ========== Epochs ==========

    /// Open a reward epoch starting at the current height (admin only)
    pub fn create_reward_epoch(&mut self, total_rewards: U256, duration_heights: u64) -> u64 {
        self.require_admin();
        if total_rewards.is_zero() || duration_heights == 0 {
            self.env().revert(RewardError::InvalidAmount);
        }

        let epoch_id = self.get_epoch_count() + 1;
        self.epochs.set(
            &epoch_id,
            RewardEpoch {
                total_rewards,
                duration_heights,
                start_height: self.current_height(),
                distributed: U256::zero(),
            },
        );
        self.epoch_count.set(epoch_id);

        self.env().emit_event(events::EpochCreated {
            epoch_id,
            total_rewards,
            duration_heights,
        });
        epoch_id
    }

    /// Credit a user from an open epoch's budget (admin only).
    /// Returns what is left of the epoch budget.
    pub fn distribute_epoch_rewards(&mut self, epoch_id: u64, user: Address, amount: U256) -> U256 {
        self.require_admin();
        if amount.is_zero() {
            self.env().revert(RewardError::InvalidAmount);
        }
        let mut epoch = self
            .epochs
            .get(&epoch_id)
            .unwrap_or_else(|| self.env().revert(RewardError::EpochNotFound));
        if !epoch.is_open(self.current_height()) || amount > epoch.remaining() {
            self.env().revert(RewardError::EpochClosed);
        }

        self.credit(user, amount);
        epoch.distributed += amount;
        let remaining = epoch.remaining();
        self.epochs.set(&epoch_id, epoch);

        self.env().emit_event(events::EpochRewardsDistributed {
            epoch_id,
            user,
            amount,
        });
        remaining
    }

    pub fn get_reward_epoch(&self, epoch_id: u64) -> Option<RewardEpoch> {
        self.epochs.get(&epoch_id)
    }

    pub fn get_epoch_count(&self) -> u64 {
        self.epoch_count.get_or_default()
    }

    // ========== Airdrops ==========

    /// Replace the airdrop merkle root (admin only). Claims are kept.
    pub fn set_merkle_root(&mut self, root: [u8; 32]) -> bool {
        self.require_admin();
        self.merkle_root.set(Some(root));
        self.env().emit_event(events::MerkleRootSet { root });
        true
    }

    /// Start a new claim round so every leaf can be claimed again (admin only)
    pub fn reset_airdrop_claims(&mut self) -> u64 {
        self.require_admin();
        let round = self.get_claim_round() + 1;
        self.claim_round.set(round);
        self.env().emit_event(events::AirdropClaimsReset { round });
        round
    }

    /// Claim the airdrop leaf `(caller, amount, leaf_index)` with its proof
    pub fn claim_airdrop(&mut self, leaf_index: u64, amount: U256, proof: Vec<[u8; 32]>) -> U256 {
        let root = self
            .get_merkle_root()
            .unwrap_or_else(|| self.env().revert(RewardError::MerkleRootNotSet));
        let user = self.env().caller();

        let leaf = leaf_hash(&user, amount, leaf_index);
        if !verify_proof(leaf, &proof, &root) {
            self.env().revert(RewardError::InvalidProof);
        }
        let round = self.get_claim_round();
        if self.airdrop_claimed.get(&(round, leaf_index)).unwrap_or(false) {
            self.env().revert(RewardError::AlreadyClaimed);
        }

        self.airdrop_claimed.set(&(round, leaf_index), true);
        if !amount.is_zero() {
            self.credit(user, amount);
        }

        self.env().emit_event(events::AirdropClaimed {
            user,
            leaf_index,
            amount,
        });
        amount
    }

    pub fn get_merkle_root(&self) -> Option<[u8; 32]> {
        self.merkle_root.get().flatten()
    }

    /// Whether a leaf was claimed in the current round
    pub fn is_airdrop_claimed(&self, leaf_index: u64) -> bool {
        self.airdrop_claimed
            .get(&(self.get_claim_round(), leaf_index))
            .unwrap_or(false)
    }

    pub fn get_claim_round(&self) -> u64 {
        self.claim_round.get_or_default()
    }

    // ========== Admin ==========

    /// Replace the reward configuration (admin only)
    pub fn set_config(&mut self, config: RewardConfig) {
        self.require_admin();
        self.validate_config(&config);
        // the height clock is fixed at init
        if config.block_interval != self.get_config().block_interval {
            self.env().revert(RewardError::InvalidConfig);
        }
        self.config.set(config);
        self.env().emit_event(events::RewardConfigUpdated {
            by: self.env().caller(),
        });
    }

    pub fn grant_role(&mut self, role_id: u8, account: Address) {
        self.require_admin();
        self.access.grant(role_id, account);
    }

    pub fn revoke_role(&mut self, role_id: u8, account: Address) {
        self.require_admin();
        self.access.revoke(role_id, account, RewardError::InvalidConfig);
    }

    pub fn has_role(&self, role_id: u8, account: Address) -> bool {
        self.access.has_role(role_id, account)
    }

    // ========== View Functions ==========

    pub fn get_user_rewards(&self, user: Address) -> U256 {
        self.claimable.get(&user).unwrap_or_default()
    }

    pub fn get_locked_rewards(&self, user: Address, lock_id: u64) -> Option<LockRecord> {
        self.locks.get(&(user, lock_id))
    }

    pub fn get_user_lock_count(&self, user: Address) -> u64 {
        self.lock_counts.get(&user).unwrap_or_default()
    }

    /// Total ever funded into the pool
    pub fn get_protocol_reward_pool(&self) -> U256 {
        self.get_pool_stats().total_funded
    }

    pub fn get_total_rewards_distributed(&self) -> U256 {
        self.get_pool_stats().total_distributed
    }

    pub fn get_total_rewards_locked(&self) -> U256 {
        self.get_pool_stats().total_locked
    }

    pub fn get_pool_stats(&self) -> RewardPoolStats {
        self.pool.get().unwrap_or_default()
    }

    pub fn get_config(&self) -> RewardConfig {
        self.config.get().unwrap_or_else(default_reward_config)
    }

    pub fn get_current_height(&self) -> u64 {
        self.current_height()
    }

    // ========== Internal Functions ==========

    fn current_height(&self) -> u64 {
        height_at(self.env().get_block_time(), self.get_config().block_interval)
    }

    fn require_admin(&self) {
        self.access.require_role(ROLE_ADMIN, RewardError::NotAuthorized);
    }

    fn add_funding(&mut self, amount: U256) -> U256 {
        let mut pool = self.get_pool_stats();
        pool.total_funded += amount;
        let total_funded = pool.total_funded;
        self.pool.set(pool);

        self.env().emit_event(events::PoolFunded {
            from: self.env().caller(),
            amount,
            total_funded,
        });
        total_funded
    }

    /// Add `amount` to a claimable balance within pool capacity.
    fn credit(&mut self, user: Address, amount: U256) {
        let mut pool = self.get_pool_stats();
        if amount > pool.capacity() {
            self.env().revert(RewardError::PoolCapacityExceeded);
        }
        pool.total_distributed += amount;
        self.pool.set(pool);

        let balance = self.get_user_rewards(user) + amount;
        self.claimable.set(&user, balance);
    }

    /// Move a lock's principal out of the locked total and credit `payout`.
    fn release(&mut self, user: Address, principal: U256, payout: U256) {
        let mut pool = self.get_pool_stats();
        pool.total_locked = pool.total_locked.saturating_sub(principal);
        self.pool.set(pool);
        self.credit(user, payout);
    }

    fn require_active_lock(&self, user: Address, lock_id: u64) -> LockRecord {
        let lock = self
            .locks
            .get(&(user, lock_id))
            .unwrap_or_else(|| self.env().revert(RewardError::LockNotFound));
        if lock.status != LockStatus::Active {
            self.env().revert(RewardError::AlreadyUnlocked);
        }
        lock
    }

    fn validate_config(&self, config: &RewardConfig) {
        let scale = BPS_SCALE as u32;
        if config.claim_fee_bps > scale
            || config.referral_bonus_bps > scale
            || config.early_unlock_penalty_bps > scale
            || config.block_interval == 0
        {
            self.env().revert(RewardError::InvalidConfig);
        }
    }
}
