//! Keeper registry and incentive accounting.
//!
//! Keepers self-register once. The router admin funds a reward pool,
//! credits each executed task from it, and keepers withdraw their
//! credited rewards with a native transfer.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::RouterError;
use crate::types::KeeperInfo;

/// Keeper registry module
#[odra::module]
pub struct KeeperRegistry {
    /// Registered keepers
    keepers: Mapping<Address, KeeperInfo>,
    /// Number of registered keepers
    keeper_count: Var<u32>,
    /// Funded rewards not yet credited to any keeper
    reward_pool: Var<U256>,
}

#[odra::module]
impl KeeperRegistry {
    /// Get keeper info
    pub fn get_keeper_info(&self, keeper: Address) -> Option<KeeperInfo> {
        self.keepers.get(&keeper)
    }

    /// Get the number of registered keepers
    pub fn get_keeper_count(&self) -> u32 {
        self.keeper_count.get_or_default()
    }

    /// Get uncredited keeper rewards
    pub fn get_keeper_reward_pool(&self) -> U256 {
        self.reward_pool.get_or_default()
    }
}

impl KeeperRegistry {
    /// Register `keeper` at `height`. Re-registration is rejected.
    pub fn register(&mut self, keeper: Address, height: u64) {
        if self.keepers.get(&keeper).is_some() {
            self.env().revert(RouterError::KeeperAlreadyRegistered);
        }
        self.keepers.set(
            &keeper,
            KeeperInfo {
                registered_at: height,
                tasks_executed: 0,
                rewards_earned: U256::zero(),
                rewards_claimed: U256::zero(),
            },
        );
        self.keeper_count.set(self.get_keeper_count() + 1);
    }

    /// Add funds to the keeper reward pool.
    pub fn fund(&mut self, amount: U256) -> U256 {
        let pool = self.get_keeper_reward_pool().saturating_add(amount);
        self.reward_pool.set(pool);
        pool
    }

    /// Credit one executed task. Returns the keeper's unclaimed rewards.
    pub fn record_task(&mut self, keeper: Address, reward: U256) -> U256 {
        let mut info = self.require_keeper(keeper);
        let pool = self.get_keeper_reward_pool();
        if reward > pool {
            self.env().revert(RouterError::KeeperPoolInsufficient);
        }

        self.reward_pool.set(pool - reward);
        info.tasks_executed += 1;
        info.rewards_earned = info.rewards_earned.saturating_add(reward);
        let unclaimed = info.unclaimed();
        self.keepers.set(&keeper, info);
        unclaimed
    }

    /// Mark all credited rewards of `keeper` as claimed and return the amount.
    pub fn take_rewards(&mut self, keeper: Address) -> U256 {
        let mut info = self.require_keeper(keeper);
        let amount = info.unclaimed();
        if amount.is_zero() {
            self.env().revert(RouterError::NoKeeperRewards);
        }
        info.rewards_claimed = info.rewards_earned;
        self.keepers.set(&keeper, info);
        amount
    }

    fn require_keeper(&self, keeper: Address) -> KeeperInfo {
        self.keepers
            .get(&keeper)
            .unwrap_or_else(|| self.env().revert(RouterError::KeeperNotFound))
    }
}
