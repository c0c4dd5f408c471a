//! Common types used across the yield aggregator contracts.

use odra::prelude::*;
use odra::casper_types::U256;

/// Default ledger height interval in milliseconds (10 minutes).
pub const DEFAULT_BLOCK_INTERVAL_MS: u64 = 600_000;

// ========== Vault Ledger ==========

/// Vault state
#[odra::odra_type]
pub struct VaultInfo {
    /// Vault owner (creator)
    pub owner: Address,
    /// Risk tier (1 = conservative, 2 = balanced, 3 = aggressive)
    pub risk_tier: u8,
    /// Assets backing the shares (net of fees)
    pub total_assets: U256,
    /// Outstanding shares
    pub total_shares: U256,
    /// Per-vault deposit pause flag
    pub paused: bool,
    /// Reported yield waiting for the next compound
    pub pending_yield: U256,
    /// Height of the last compound
    pub last_compound_height: u64,
    /// Height at creation
    pub created_at: u64,
}

/// A user's stake in one vault
#[odra::odra_type]
#[derive(Default)]
pub struct UserPosition {
    pub shares: U256,
    pub total_deposited: U256,
    pub last_deposit_height: u64,
}

/// Strategy descriptor curated by the vault admin
#[odra::odra_type]
pub struct Strategy {
    pub name: String,
    pub manager: Address,
    pub apy_bps: u32,
    pub risk_score: u8,
    pub active: bool,
}

/// Withdrawal projection for a share amount
#[odra::odra_type]
pub struct WithdrawalQuote {
    /// Assets represented by the shares
    pub gross: U256,
    /// Withdrawal fee
    pub fee: U256,
    /// Amount paid out
    pub net: U256,
}

/// Accumulated vault fees
#[odra::odra_type]
#[derive(Default)]
pub struct FeeBreakdown {
    pub deposit: U256,
    pub withdrawal: U256,
    pub performance: U256,
    /// Fees already forwarded to the reward pool
    pub forwarded: U256,
}

impl FeeBreakdown {
    /// Fees collected and not yet forwarded.
    pub fn available(&self) -> U256 {
        (self.deposit + self.withdrawal + self.performance).saturating_sub(self.forwarded)
    }
}

/// Vault ledger configuration
#[odra::odra_type]
pub struct VaultConfig {
    /// Minimum deposit (smallest unit)
    pub min_deposit: U256,
    /// Deposit fee in bps
    pub deposit_fee_bps: u32,
    /// Withdrawal fee in bps
    pub withdrawal_fee_bps: u32,
    /// Performance fee on compounded yield in bps
    pub performance_fee_bps: u32,
    /// Floor applied to deposit and withdrawal fees
    pub min_fee: U256,
    /// Flat fee paid by the compound caller
    pub compound_fee: U256,
    /// Milliseconds per ledger height
    pub block_interval: u64,
}

/// Default vault configuration
pub fn default_vault_config() -> VaultConfig {
    VaultConfig {
        min_deposit: U256::from(100_000_000u64),
        deposit_fee_bps: 30,
        withdrawal_fee_bps: 50,
        performance_fee_bps: 1500,
        min_fee: U256::from(1_000_000u64),
        compound_fee: U256::from(200_000u64),
        block_interval: DEFAULT_BLOCK_INTERVAL_MS,
    }
}

// ========== Strategy Router ==========

/// Registered yield protocol
#[odra::odra_type]
pub struct ProtocolEntry {
    pub name: String,
    /// 1 (safest) ..= 10 (riskiest)
    pub risk_rating: u8,
    pub active: bool,
    pub registered_at: u64,
}

/// Route between two registered protocols
#[odra::odra_type]
pub struct Route {
    pub from: Address,
    pub to: Address,
    pub apy_bps: u32,
    pub gas_cost: U256,
    pub active: bool,
    pub created_at: u64,
}

/// Result of a route simulation
#[odra::odra_type]
pub struct RouteQuote {
    /// Active route for the pair, if any
    pub route_id: Option<u64>,
    /// Routing fee plus route gas cost
    pub fee: U256,
    /// Amount left after the fee
    pub net_amount: U256,
    /// APY of the matched route, 0 without a route
    pub apy_bps: u32,
}

/// Governance proposal status
#[odra::odra_type]
#[derive(Copy, Default)]
pub enum ProposalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Strategy proposal
#[odra::odra_type]
pub struct StrategyProposal {
    pub proposer: Address,
    pub protocol: Address,
    pub description: String,
    pub votes_for: U256,
    pub votes_against: U256,
    pub status: ProposalStatus,
    pub created_at: u64,
    pub voting_ends_at: u64,
}

/// Keeper registration record
#[odra::odra_type]
pub struct KeeperInfo {
    pub registered_at: u64,
    pub tasks_executed: u64,
    pub rewards_earned: U256,
    pub rewards_claimed: U256,
}

impl KeeperInfo {
    pub fn unclaimed(&self) -> U256 {
        self.rewards_earned.saturating_sub(self.rewards_claimed)
    }
}

/// Recorded emergency withdrawal request
#[odra::odra_type]
pub struct EmergencyWithdrawal {
    pub requester: Address,
    pub protocol: Address,
    pub amount: U256,
    pub requested_at: u64,
}

/// Strategy router configuration
#[odra::odra_type]
pub struct RouterConfig {
    /// Routing fee in bps charged by `simulate_route`
    pub routing_fee_bps: u32,
    /// Voting window length in heights
    pub voting_period: u64,
    /// Minimum `votes_for` weight for approval
    pub quorum: U256,
    /// Reward credited per recorded keeper task
    pub keeper_task_reward: U256,
    /// Milliseconds per ledger height
    pub block_interval: u64,
}

/// Default router configuration
pub fn default_router_config() -> RouterConfig {
    RouterConfig {
        routing_fee_bps: 10,
        voting_period: 1440,
        quorum: U256::from(1000u64),
        keeper_task_reward: U256::from(100_000u64),
        block_interval: DEFAULT_BLOCK_INTERVAL_MS,
    }
}

// ========== Reward Engine ==========

/// Lock lifecycle
#[odra::odra_type]
#[derive(Copy, Default)]
pub enum LockStatus {
    #[default]
    Active,
    Matured,
    EarlyUnlocked,
}

/// Locked reward position
#[odra::odra_type]
pub struct LockRecord {
    pub principal: U256,
    pub lockup_heights: u64,
    /// Multiplier resolved at lock time (10000 = 1x)
    pub multiplier_bps: u32,
    pub created_at: u64,
    pub status: LockStatus,
}

impl LockRecord {
    pub fn unlocks_at(&self) -> u64 {
        self.created_at.saturating_add(self.lockup_heights)
    }
}

/// Referral link
#[odra::odra_type]
pub struct ReferralRecord {
    pub referrer: Address,
    pub registered_at: u64,
}

/// Aggregated referral statistics for a referrer
#[odra::odra_type]
#[derive(Default)]
pub struct ReferralStats {
    pub referees: Vec<Address>,
    pub count: u64,
    pub total_bonus: U256,
}

/// Merit score components
#[odra::odra_type]
pub struct MeritScore {
    pub tvl: u64,
    pub activity: u64,
    pub loyalty: u64,
    pub total: u64,
    pub updated_at: u64,
}

/// Reward epoch
#[odra::odra_type]
pub struct RewardEpoch {
    pub total_rewards: U256,
    pub duration_heights: u64,
    pub start_height: u64,
    pub distributed: U256,
}

impl RewardEpoch {
    pub fn is_open(&self, height: u64) -> bool {
        height < self.start_height.saturating_add(self.duration_heights)
    }

    pub fn remaining(&self) -> U256 {
        self.total_rewards.saturating_sub(self.distributed)
    }
}

/// Reward pool totals
#[odra::odra_type]
#[derive(Default)]
pub struct RewardPoolStats {
    pub total_funded: U256,
    pub total_distributed: U256,
    pub total_locked: U256,
    pub total_claimed: U256,
    pub claim_fees: U256,
    /// Referral bonuses credited; not bounded by the pool
    pub referral_bonuses: U256,
}

impl RewardPoolStats {
    /// Funded value not yet promised to any user. Referral bonuses are
    /// credited without a capacity check but still consume capacity.
    pub fn capacity(&self) -> U256 {
        self.total_funded
            .saturating_sub(self.total_distributed)
            .saturating_sub(self.total_locked)
            .saturating_sub(self.referral_bonuses)
    }
}

/// Amount the early unlock penalty is applied to
#[odra::odra_type]
#[derive(Copy, Default)]
pub enum PenaltyBasis {
    #[default]
    Principal,
    Boosted,
}

/// Reward engine configuration
#[odra::odra_type]
pub struct RewardConfig {
    /// Fee kept on `claim_rewards` in bps
    pub claim_fee_bps: u32,
    /// Share of a referee fee credited to the referrer in bps
    pub referral_bonus_bps: u32,
    /// Penalty on early unlock in bps
    pub early_unlock_penalty_bps: u32,
    pub penalty_basis: PenaltyBasis,
    /// Milliseconds per ledger height
    pub block_interval: u64,
}

/// Default reward configuration
pub fn default_reward_config() -> RewardConfig {
    RewardConfig {
        claim_fee_bps: 100,
        referral_bonus_bps: 500,
        early_unlock_penalty_bps: 3000,
        penalty_basis: PenaltyBasis::Principal,
        block_interval: DEFAULT_BLOCK_INTERVAL_MS,
    }
}
