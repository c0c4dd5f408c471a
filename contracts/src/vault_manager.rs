//! Vault manager: pooled-capital vaults issuing proportional shares.
//!
//! ## Accounting
//!
//! - Deposits pay a fee (bps with a floor) and mint shares against the
//!   current share price, rounding down.
//! - Withdrawals burn shares for their proportional assets and pay a fee
//!   on the way out.
//! - Reported yield is compounded into `total_assets` without minting
//!   shares, minus the performance fee.
//!
//! Collected fees stay in the contract until the admin forwards them to
//! the reward distributor.
//!
//! Pausing blocks deposits only. Withdrawals stay open so a paused vault
//! can always be exited.

use odra::prelude::*;
use odra::casper_types::{runtime_args, U256};
use odra::CallDef;
use crate::access_control::{AccessControl, ROLE_ADMIN, ROLE_YIELD_REPORTER};
use crate::clock::height_at;
use crate::errors::VaultError;
use crate::math::{
    apply_bps, assets_for_shares, fee_with_floor, share_price, shares_for_deposit, u256_to_u512,
    u512_to_u256, BPS_SCALE,
};
use crate::types::{
    default_vault_config, FeeBreakdown, RouteQuote, Strategy, UserPosition, VaultConfig,
    VaultInfo, WithdrawalQuote,
};

/// Valid risk tiers
pub const RISK_TIERS: [u8; 3] = [1, 2, 3];

/// Share price scale (1e9, one native unit)
pub const PRICE_SCALE: u64 = 1_000_000_000;

pub mod events {
    use odra::prelude::*;
    use odra::casper_types::U256;

    #[odra::event]
    pub struct VaultCreated {
        pub vault_id: u64,
        pub owner: Address,
        pub risk_tier: u8,
    }

    #[odra::event]
    pub struct Deposited {
        pub vault_id: u64,
        pub user: Address,
        pub amount: U256,
        pub fee: U256,
        pub shares: U256,
    }

    #[odra::event]
    pub struct Withdrawn {
        pub vault_id: u64,
        pub user: Address,
        pub shares: U256,
        pub gross: U256,
        pub fee: U256,
    }

    #[odra::event]
    pub struct YieldReported {
        pub vault_id: u64,
        pub amount: U256,
    }

    #[odra::event]
    pub struct Compounded {
        pub vault_id: u64,
        pub added_assets: U256,
        pub performance_fee: U256,
    }

    #[odra::event]
    pub struct VaultRebalanced {
        pub vault_id: u64,
        pub weights: Vec<u32>,
    }

    #[odra::event]
    pub struct StrategyAdded {
        pub strategy_id: u64,
        pub name: String,
        pub apy_bps: u32,
    }

    #[odra::event]
    pub struct StrategyApyUpdated {
        pub strategy_id: u64,
        pub apy_bps: u32,
    }

    #[odra::event]
    pub struct PauseToggled {
        pub paused: bool,
        pub by: Address,
    }

    #[odra::event]
    pub struct VaultPauseChanged {
        pub vault_id: u64,
        pub paused: bool,
    }

    #[odra::event]
    pub struct FeesForwarded {
        pub distributor: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct VaultConfigUpdated {
        pub by: Address,
    }
}

/// Vault manager contract
#[odra::module(events = [
    events::VaultCreated,
    events::Deposited,
    events::Withdrawn,
    events::YieldReported,
    events::Compounded,
    events::VaultRebalanced,
    events::StrategyAdded,
    events::StrategyApyUpdated,
    events::PauseToggled,
    events::VaultPauseChanged,
    events::FeesForwarded,
    events::VaultConfigUpdated
])]
pub struct VaultManager {
    access: SubModule<AccessControl>,
    /// Vaults by id (ids start at 1)
    vaults: Mapping<u64, VaultInfo>,
    vault_count: Var<u64>,
    /// (vault, user) -> position
    positions: Mapping<(u64, Address), UserPosition>,
    /// Strategy allocation weights per vault
    allocations: Mapping<u64, Vec<u32>>,
    /// Strategies by id (ids start at 1)
    strategies: Mapping<u64, Strategy>,
    strategy_count: Var<u64>,
    /// Global deposit pause
    paused: Var<bool>,
    /// Sum of `total_assets` over all vaults
    total_tvl: Var<U256>,
    fees: Var<FeeBreakdown>,
    /// Receives compound fees
    treasury: Var<Address>,
    router: Var<Option<Address>>,
    reward_distributor: Var<Option<Address>>,
    config: Var<VaultConfig>,
}

#[odra::module]
impl VaultManager {
    /// Initialize the vault manager. `None` selects the default configuration.
    pub fn init(&mut self, admin: Address, treasury: Address, config: Option<VaultConfig>) {
        let config = config.unwrap_or_else(default_vault_config);
        self.validate_config(&config);
        self.access.init(admin);
        self.treasury.set(treasury);
        self.router.set(None);
        self.reward_distributor.set(None);
        self.config.set(config);
        self.paused.set(false);
        self.total_tvl.set(U256::zero());
        self.fees.set(FeeBreakdown::default());
    }

    // ========== Vault Lifecycle ==========

    /// Create a vault owned by the caller
    pub fn create_vault(&mut self, risk_tier: u8) -> u64 {
        if !RISK_TIERS.contains(&risk_tier) {
            self.env().revert(VaultError::InvalidRiskTier);
        }

        let owner = self.env().caller();
        let vault_id = self.vault_count.get_or_default() + 1;
        self.vaults.set(
            &vault_id,
            VaultInfo {
                owner,
                risk_tier,
                total_assets: U256::zero(),
                total_shares: U256::zero(),
                paused: false,
                pending_yield: U256::zero(),
                last_compound_height: 0,
                created_at: self.current_height(),
            },
        );
        self.vault_count.set(vault_id);

        self.env().emit_event(events::VaultCreated {
            vault_id,
            owner,
            risk_tier,
        });
        vault_id
    }

    /// Deposit the attached value into a vault. Returns minted shares.
    #[odra(payable)]
    pub fn deposit(&mut self, vault_id: u64, amount: U256) -> U256 {
        let mut vault = self.require_vault(vault_id);
        if self.is_paused() || vault.paused {
            self.env().revert(VaultError::VaultPaused);
        }

        let config = self.get_config();
        if amount < config.min_deposit {
            self.env().revert(VaultError::MinDepositNotMet);
        }
        if u512_to_u256(self.env().attached_value()) != amount {
            self.env().revert(VaultError::InvalidAmount);
        }

        let fee = fee_with_floor(amount, config.deposit_fee_bps, config.min_fee);
        let net = amount - fee;
        let shares = shares_for_deposit(net, vault.total_shares, vault.total_assets);
        if shares.is_zero() {
            self.env().revert(VaultError::DegenerateDeposit);
        }

        vault.total_assets += net;
        vault.total_shares += shares;
        self.vaults.set(&vault_id, vault);

        let user = self.env().caller();
        let mut position = self.positions.get(&(vault_id, user)).unwrap_or_default();
        position.shares += shares;
        position.total_deposited += amount;
        position.last_deposit_height = self.current_height();
        self.positions.set(&(vault_id, user), position);

        self.total_tvl.set(self.get_total_tvl() + net);
        let mut fees = self.get_protocol_fees();
        fees.deposit += fee;
        self.fees.set(fees);

        self.env().emit_event(events::Deposited {
            vault_id,
            user,
            amount,
            fee,
            shares,
        });
        shares
    }

    /// Burn shares and receive their assets minus the withdrawal fee.
    /// Returns the net amount transferred.
    pub fn withdraw(&mut self, vault_id: u64, shares: U256) -> U256 {
        let mut vault = self.require_vault(vault_id);
        let user = self.env().caller();
        let mut position = self.positions.get(&(vault_id, user)).unwrap_or_default();
        if shares.is_zero() || shares > position.shares {
            self.env().revert(VaultError::InsufficientShares);
        }

        let quote = self.quote_withdrawal(&vault, shares);

        vault.total_shares -= shares;
        vault.total_assets -= quote.gross;
        if !vault.total_shares.is_zero() && vault.total_assets.is_zero() {
            self.env().revert(VaultError::PriceInvariantViolated);
        }
        self.vaults.set(&vault_id, vault);

        position.shares -= shares;
        self.positions.set(&(vault_id, user), position);

        self.total_tvl.set(self.get_total_tvl().saturating_sub(quote.gross));
        let mut fees = self.get_protocol_fees();
        fees.withdrawal += quote.fee;
        self.fees.set(fees);

        if !quote.net.is_zero() {
            self.env().transfer_tokens(&user, &u256_to_u512(quote.net));
        }

        self.env().emit_event(events::Withdrawn {
            vault_id,
            user,
            shares,
            gross: quote.gross,
            fee: quote.fee,
        });
        quote.net
    }

    /// Add the attached value to a vault's pending yield.
    /// Callable by the admin, the vault owner or a yield reporter.
    #[odra(payable)]
    pub fn report_yield(&mut self, vault_id: u64) -> U256 {
        let mut vault = self.require_vault(vault_id);
        let caller = self.env().caller();
        if caller != vault.owner
            && !self.access.caller_has_role(ROLE_ADMIN)
            && !self.access.caller_has_role(ROLE_YIELD_REPORTER)
        {
            self.env().revert(VaultError::NotAuthorized);
        }

        let amount = u512_to_u256(self.env().attached_value());
        if amount.is_zero() {
            self.env().revert(VaultError::InvalidAmount);
        }

        vault.pending_yield += amount;
        let pending = vault.pending_yield;
        self.vaults.set(&vault_id, vault);

        self.env().emit_event(events::YieldReported { vault_id, amount });
        pending
    }

    /// Compound pending yield into the vault.
    ///
    /// The caller attaches at least `compound_fee`; that fee goes to the
    /// treasury and any excess is refunded. Yield is held back while the
    /// vault has no shares.
    #[odra(payable)]
    pub fn compound_rewards(&mut self, vault_id: u64) -> bool {
        let mut vault = self.require_vault(vault_id);
        let config = self.get_config();

        let attached = u512_to_u256(self.env().attached_value());
        if attached < config.compound_fee {
            self.env().revert(VaultError::InsufficientGasFee);
        }

        let caller = self.env().caller();
        let treasury = self.get_treasury();
        if !config.compound_fee.is_zero() {
            self.env().transfer_tokens(&treasury, &u256_to_u512(config.compound_fee));
        }
        let excess = attached - config.compound_fee;
        if !excess.is_zero() {
            self.env().transfer_tokens(&caller, &u256_to_u512(excess));
        }

        let mut added_assets = U256::zero();
        let mut performance_fee = U256::zero();
        if !vault.pending_yield.is_zero() && !vault.total_shares.is_zero() {
            performance_fee = apply_bps(vault.pending_yield, config.performance_fee_bps);
            added_assets = vault.pending_yield - performance_fee;
            vault.total_assets += added_assets;
            vault.pending_yield = U256::zero();

            self.total_tvl.set(self.get_total_tvl() + added_assets);
            let mut fees = self.get_protocol_fees();
            fees.performance += performance_fee;
            self.fees.set(fees);
        }
        vault.last_compound_height = self.current_height();
        self.vaults.set(&vault_id, vault);

        self.env().emit_event(events::Compounded {
            vault_id,
            added_assets,
            performance_fee,
        });
        true
    }

    /// Replace a vault's allocation weights (vault owner only)
    pub fn rebalance_vault(&mut self, vault_id: u64, weights: Vec<u32>) -> bool {
        let vault = self.require_vault(vault_id);
        if vault.owner != self.env().caller() {
            self.env().revert(VaultError::NotAuthorized);
        }
        self.allocations.set(&vault_id, weights.clone());
        self.env().emit_event(events::VaultRebalanced { vault_id, weights });
        true
    }

    /// Quote routing the vault's assets through the strategy router
    pub fn quote_route(&self, vault_id: u64, from: Address, to: Address) -> RouteQuote {
        let vault = self.require_vault(vault_id);
        let router = self
            .get_router()
            .unwrap_or_else(|| self.env().revert(VaultError::RouterNotConfigured));

        let args = runtime_args! {
            "from" => from,
            "to" => to,
            "amount" => vault.total_assets,
        };
        let call_def = CallDef::new("simulate_route", false, args);
        self.env().call_contract(router, call_def)
    }

    // ========== Strategies ==========

    /// Add a strategy (admin only)
    pub fn add_strategy(&mut self, name: String, manager: Address, apy_bps: u32, risk_score: u8) -> u64 {
        self.require_admin();
        let strategy_id = self.strategy_count.get_or_default() + 1;
        self.strategies.set(
            &strategy_id,
            Strategy {
                name: name.clone(),
                manager,
                apy_bps,
                risk_score,
                active: true,
            },
        );
        self.strategy_count.set(strategy_id);
        self.env().emit_event(events::StrategyAdded {
            strategy_id,
            name,
            apy_bps,
        });
        strategy_id
    }

    /// Update a strategy's APY (admin only)
    pub fn update_strategy_apy(&mut self, strategy_id: u64, apy_bps: u32) -> bool {
        self.require_admin();
        let mut strategy = self
            .strategies
            .get(&strategy_id)
            .unwrap_or_else(|| self.env().revert(VaultError::StrategyNotFound));
        strategy.apy_bps = apy_bps;
        self.strategies.set(&strategy_id, strategy);
        self.env().emit_event(events::StrategyApyUpdated {
            strategy_id,
            apy_bps,
        });
        true
    }

    // ========== Pause Control ==========

    /// Flip the global deposit pause (admin only). Returns the new flag.
    pub fn toggle_pause(&mut self) -> bool {
        self.require_admin();
        let paused = !self.is_paused();
        self.paused.set(paused);
        self.env().emit_event(events::PauseToggled {
            paused,
            by: self.env().caller(),
        });
        paused
    }

    /// Pause or resume deposits into one vault (admin or vault owner)
    pub fn set_vault_paused(&mut self, vault_id: u64, paused: bool) -> bool {
        let mut vault = self.require_vault(vault_id);
        if vault.owner != self.env().caller() {
            self.require_admin();
        }
        vault.paused = paused;
        self.vaults.set(&vault_id, vault);
        self.env().emit_event(events::VaultPauseChanged { vault_id, paused });
        paused
    }

    // ========== Fees ==========

    /// Forward collected fees to the reward distributor (admin only).
    /// Returns the total forwarded so far.
    pub fn forward_fees_to_rewards(&mut self, amount: U256) -> U256 {
        self.require_admin();
        let distributor = self
            .get_reward_distributor()
            .unwrap_or_else(|| self.env().revert(VaultError::DistributorNotConfigured));

        let mut fees = self.get_protocol_fees();
        if amount.is_zero() || amount > fees.available() {
            self.env().revert(VaultError::InsufficientFees);
        }
        fees.forwarded += amount;
        let forwarded = fees.forwarded;
        self.fees.set(fees);

        let call_def = CallDef::new("receive_protocol_fees", true, runtime_args! {})
            .with_amount(u256_to_u512(amount));
        self.env().call_contract::<U256>(distributor, call_def);

        self.env().emit_event(events::FeesForwarded {
            distributor,
            amount,
        });
        forwarded
    }

    // ========== Admin ==========

    pub fn set_router(&mut self, router: Address) {
        self.require_admin();
        self.router.set(Some(router));
    }

    pub fn set_reward_distributor(&mut self, distributor: Address) {
        self.require_admin();
        self.reward_distributor.set(Some(distributor));
    }

    pub fn set_treasury(&mut self, treasury: Address) {
        self.require_admin();
        self.treasury.set(treasury);
    }

    /// Replace the vault configuration (admin only)
    pub fn set_config(&mut self, config: VaultConfig) {
        self.require_admin();
        self.validate_config(&config);
        // the height clock is fixed at init
        if config.block_interval != self.get_config().block_interval {
            self.env().revert(VaultError::InvalidConfig);
        }
        self.config.set(config);
        self.env().emit_event(events::VaultConfigUpdated {
            by: self.env().caller(),
        });
    }

    pub fn grant_role(&mut self, role_id: u8, account: Address) {
        self.require_admin();
        self.access.grant(role_id, account);
    }

    pub fn revoke_role(&mut self, role_id: u8, account: Address) {
        self.require_admin();
        self.access.revoke(role_id, account, VaultError::InvalidConfig);
    }

    // ========== View Functions ==========

    pub fn get_vault_info(&self, vault_id: u64) -> Option<VaultInfo> {
        self.vaults.get(&vault_id)
    }

    pub fn get_vault_count(&self) -> u64 {
        self.vault_count.get_or_default()
    }

    pub fn get_user_position(&self, vault_id: u64, user: Address) -> Option<UserPosition> {
        self.positions.get(&(vault_id, user))
    }

    pub fn get_vault_allocation(&self, vault_id: u64) -> Vec<u32> {
        self.allocations.get(&vault_id).unwrap_or_default()
    }

    pub fn get_strategy(&self, strategy_id: u64) -> Option<Strategy> {
        self.strategies.get(&strategy_id)
    }

    pub fn get_strategy_count(&self) -> u64 {
        self.strategy_count.get_or_default()
    }

    pub fn get_total_tvl(&self) -> U256 {
        self.total_tvl.get_or_default()
    }

    /// Project a withdrawal of `shares` by `user` without executing it
    pub fn calculate_withdrawable_amount(&self, user: Address, vault_id: u64, shares: U256) -> WithdrawalQuote {
        let vault = self.require_vault(vault_id);
        let held = self
            .positions
            .get(&(vault_id, user))
            .map(|position| position.shares)
            .unwrap_or_default();
        if shares > held {
            self.env().revert(VaultError::InsufficientShares);
        }
        self.quote_withdrawal(&vault, shares)
    }

    pub fn get_protocol_fees(&self) -> FeeBreakdown {
        self.fees.get().unwrap_or_default()
    }

    /// Assets per share scaled by `PRICE_SCALE`
    pub fn get_share_price(&self, vault_id: u64) -> U256 {
        let vault = self.require_vault(vault_id);
        share_price(vault.total_assets, vault.total_shares, U256::from(PRICE_SCALE))
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get_or_default()
    }

    pub fn get_config(&self) -> VaultConfig {
        self.config.get().unwrap_or_else(default_vault_config)
    }

    pub fn get_treasury(&self) -> Address {
        self.treasury
            .get()
            .unwrap_or_else(|| self.env().revert(VaultError::InvalidConfig))
    }

    pub fn get_router(&self) -> Option<Address> {
        self.router.get().flatten()
    }

    pub fn get_reward_distributor(&self) -> Option<Address> {
        self.reward_distributor.get().flatten()
    }

    pub fn has_role(&self, role_id: u8, account: Address) -> bool {
        self.access.has_role(role_id, account)
    }

    pub fn get_current_height(&self) -> u64 {
        self.current_height()
    }

    // ========== Internal Functions ==========

    fn current_height(&self) -> u64 {
        height_at(self.env().get_block_time(), self.get_config().block_interval)
    }

    fn require_admin(&self) {
        self.access.require_role(ROLE_ADMIN, VaultError::NotAuthorized);
    }

    fn require_vault(&self, vault_id: u64) -> VaultInfo {
        self.vaults
            .get(&vault_id)
            .unwrap_or_else(|| self.env().revert(VaultError::VaultNotFound))
    }

    fn quote_withdrawal(&self, vault: &VaultInfo, shares: U256) -> WithdrawalQuote {
        let config = self.get_config();
        let gross = assets_for_shares(shares, vault.total_shares, vault.total_assets);
        let fee = fee_with_floor(gross, config.withdrawal_fee_bps, config.min_fee);
        WithdrawalQuote {
            gross,
            fee,
            net: gross - fee,
        }
    }

    fn validate_config(&self, config: &VaultConfig) {
        let scale = BPS_SCALE as u32;
        if config.deposit_fee_bps > scale
            || config.withdrawal_fee_bps > scale
            || config.performance_fee_bps > scale
            || config.block_interval == 0
        {
            self.env().revert(VaultError::InvalidConfig);
        }
    }
}
