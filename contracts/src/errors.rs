//! Protocol error definitions.
//!
//! Each contract owns one error enum. The numeric codes are part of the
//! external contract and must stay stable:
//! - `VaultError` (1xx) for the vault manager
//! - `RouterError` (2xx) for the strategy router
//! - `RewardError` (3xx) for the reward distributor

use odra::prelude::*;

/// Vault manager errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum VaultError {
    NotAuthorized = 100,
    VaultNotFound = 101,
    InsufficientShares = 102,
    VaultPaused = 103,
    InvalidRiskTier = 104,
    MinDepositNotMet = 105,
    DegenerateDeposit = 106,
    StrategyNotFound = 107,
    InvalidAmount = 108,
    InsufficientGasFee = 109,
    PriceInvariantViolated = 110,
    InsufficientFees = 111,
    RouterNotConfigured = 112,
    DistributorNotConfigured = 113,
    InvalidConfig = 114,
}

impl VaultError {
    pub const fn message(&self) -> &'static str {
        match self {
            VaultError::NotAuthorized => "Vault: caller not authorized",
            VaultError::VaultNotFound => "Vault: vault not found",
            VaultError::InsufficientShares => "Vault: insufficient shares",
            VaultError::VaultPaused => "Vault: deposits paused",
            VaultError::InvalidRiskTier => "Vault: risk tier must be 1, 2 or 3",
            VaultError::MinDepositNotMet => "Vault: deposit below minimum",
            VaultError::DegenerateDeposit => "Vault: deposit would mint zero shares",
            VaultError::StrategyNotFound => "Vault: strategy not found",
            VaultError::InvalidAmount => "Vault: attached value does not match amount",
            VaultError::InsufficientGasFee => "Vault: compound fee not covered",
            VaultError::PriceInvariantViolated => "Vault: share price invariant violated",
            VaultError::InsufficientFees => "Vault: not enough accumulated fees",
            VaultError::RouterNotConfigured => "Vault: strategy router not configured",
            VaultError::DistributorNotConfigured => "Vault: reward distributor not configured",
            VaultError::InvalidConfig => "Vault: invalid configuration parameter",
        }
    }
}

/// Strategy router errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RouterError {
    NotAuthorized = 200,
    InvalidProtocol = 201,
    RouteNotFound = 202,
    ProposalNotFound = 203,
    ProtocolAlreadyRegistered = 204,
    KeeperAlreadyRegistered = 205,
    EmergencyModeInactive = 206,
    InvalidRiskRating = 207,
    AlreadyVoted = 208,
    ProposalClosed = 209,
    RouteInactive = 210,
    NameTooLong = 211,
    InvalidAmount = 212,
    VotingActive = 213,
    KeeperNotFound = 214,
    NoKeeperRewards = 215,
    KeeperPoolInsufficient = 216,
    DescriptionTooLong = 217,
    InvalidConfig = 218,
}

impl RouterError {
    pub const fn message(&self) -> &'static str {
        match self {
            RouterError::NotAuthorized => "Router: caller not authorized",
            RouterError::InvalidProtocol => "Router: protocol not registered",
            RouterError::RouteNotFound => "Router: route not found",
            RouterError::ProposalNotFound => "Router: proposal not found",
            RouterError::ProtocolAlreadyRegistered => "Router: protocol already registered",
            RouterError::KeeperAlreadyRegistered => "Router: keeper already registered",
            RouterError::EmergencyModeInactive => "Router: emergency mode not active",
            RouterError::InvalidRiskRating => "Router: risk rating must be within 1..=10",
            RouterError::AlreadyVoted => "Router: address already voted",
            RouterError::ProposalClosed => "Router: proposal no longer accepts votes",
            RouterError::RouteInactive => "Router: route deactivated",
            RouterError::NameTooLong => "Router: protocol name too long",
            RouterError::InvalidAmount => "Router: amount must be non-zero",
            RouterError::VotingActive => "Router: voting window still open",
            RouterError::KeeperNotFound => "Router: keeper not registered",
            RouterError::NoKeeperRewards => "Router: no keeper rewards to claim",
            RouterError::KeeperPoolInsufficient => "Router: keeper reward pool exhausted",
            RouterError::DescriptionTooLong => "Router: proposal description too long",
            RouterError::InvalidConfig => "Router: invalid configuration parameter",
        }
    }
}

/// Reward distributor errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RewardError {
    NotAuthorized = 300,
    InsufficientRewards = 301,
    LockNotFound = 302,
    StillLocked = 303,
    AlreadyUnlocked = 304,
    LockMatured = 305,
    ReferralExists = 306,
    ReferrerNotFound = 307,
    InvalidProof = 308,
    AlreadyClaimed = 309,
    PoolCapacityExceeded = 310,
    MerkleRootNotSet = 311,
    EpochNotFound = 312,
    EpochClosed = 313,
    InvalidAmount = 314,
    InvalidConfig = 315,
}

impl RewardError {
    pub const fn message(&self) -> &'static str {
        match self {
            RewardError::NotAuthorized => "Rewards: caller not authorized",
            RewardError::InsufficientRewards => "Rewards: insufficient claimable rewards",
            RewardError::LockNotFound => "Rewards: lock not found",
            RewardError::StillLocked => "Rewards: lockup not matured",
            RewardError::AlreadyUnlocked => "Rewards: lock already released",
            RewardError::LockMatured => "Rewards: lock matured, use unlock_rewards",
            RewardError::ReferralExists => "Rewards: referral already registered",
            RewardError::ReferrerNotFound => "Rewards: referee has no referrer",
            RewardError::InvalidProof => "Rewards: invalid merkle proof",
            RewardError::AlreadyClaimed => "Rewards: airdrop leaf already claimed",
            RewardError::PoolCapacityExceeded => "Rewards: reward pool capacity exceeded",
            RewardError::MerkleRootNotSet => "Rewards: merkle root not set",
            RewardError::EpochNotFound => "Rewards: epoch not found",
            RewardError::EpochClosed => "Rewards: epoch closed or budget exhausted",
            RewardError::InvalidAmount => "Rewards: invalid amount",
            RewardError::InvalidConfig => "Rewards: invalid configuration parameter",
        }
    }
}

macro_rules! impl_odra_error {
    ($($error:ty),*) => {
        $(
            impl core::fmt::Display for $error {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    f.write_str(self.message())
                }
            }

            impl From<$error> for OdraError {
                fn from(error: $error) -> Self {
                    #[cfg(target_arch = "wasm32")]
                    {
                        OdraError::user(error as u16)
                    }

                    #[cfg(not(target_arch = "wasm32"))]
                    {
                        OdraError::user(error as u16, error.message())
                    }
                }
            }
        )*
    };
}

impl_odra_error!(VaultError, RouterError, RewardError);
