//! Strategy router: protocol directory, route book, governance, keepers
//! and emergency controls.
//!
//! The router is read by the vault manager to quote routed allocations
//! (`simulate_route`). It owns no user funds apart from the keeper
//! reward pool.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::access_control::{AccessControl, ROLE_ADMIN, ROLE_KEEPER};
use crate::clock::height_at;
use crate::errors::RouterError;
use crate::governance::Governance;
use crate::keeper::KeeperRegistry;
use crate::math::{apply_bps, u256_to_u512, u512_to_u256, BPS_SCALE};
use crate::registry::ProtocolRegistry;
use crate::types::{
    default_router_config, EmergencyWithdrawal, KeeperInfo, ProposalStatus, ProtocolEntry, Route,
    RouteQuote, RouterConfig, StrategyProposal,
};

pub mod events {
    use odra::prelude::*;
    use odra::casper_types::U256;
    use crate::types::ProposalStatus;

    #[odra::event]
    pub struct ProtocolRegistered {
        pub protocol: Address,
        pub name: String,
        pub risk_rating: u8,
    }

    #[odra::event]
    pub struct ProtocolStatusChanged {
        pub protocol: Address,
        pub active: bool,
    }

    #[odra::event]
    pub struct RouteCreated {
        pub route_id: u64,
        pub from: Address,
        pub to: Address,
        pub apy_bps: u32,
        pub gas_cost: U256,
    }

    #[odra::event]
    pub struct RouteApyUpdated {
        pub route_id: u64,
        pub apy_bps: u32,
    }

    #[odra::event]
    pub struct RouteDeactivated {
        pub route_id: u64,
    }

    #[odra::event]
    pub struct StrategyProposed {
        pub proposal_id: u64,
        pub proposer: Address,
        pub protocol: Address,
    }

    #[odra::event]
    pub struct VoteCast {
        pub proposal_id: u64,
        pub voter: Address,
        pub support: bool,
        pub weight: U256,
    }

    #[odra::event]
    pub struct ProposalFinalized {
        pub proposal_id: u64,
        pub status: ProposalStatus,
    }

    #[odra::event]
    pub struct KeeperRegistered {
        pub keeper: Address,
    }

    #[odra::event]
    pub struct KeeperTaskRecorded {
        pub keeper: Address,
        pub reward: U256,
    }

    #[odra::event]
    pub struct KeeperRewardsClaimed {
        pub keeper: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct EmergencyModeToggled {
        pub active: bool,
        pub by: Address,
    }

    #[odra::event]
    pub struct EmergencyWithdrawalRequested {
        pub request_id: u64,
        pub requester: Address,
        pub protocol: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct RouterConfigUpdated {
        pub by: Address,
    }
}

/// Strategy router contract
#[odra::module(events = [
    events::ProtocolRegistered,
    events::ProtocolStatusChanged,
    events::RouteCreated,
    events::RouteApyUpdated,
    events::RouteDeactivated,
    events::StrategyProposed,
    events::VoteCast,
    events::ProposalFinalized,
    events::KeeperRegistered,
    events::KeeperTaskRecorded,
    events::KeeperRewardsClaimed,
    events::EmergencyModeToggled,
    events::EmergencyWithdrawalRequested,
    events::RouterConfigUpdated
])]
pub struct StrategyRouter {
    access: SubModule<AccessControl>,
    registry: SubModule<ProtocolRegistry>,
    governance: SubModule<Governance>,
    keepers: SubModule<KeeperRegistry>,
    /// Routes by id (ids start at 1)
    routes: Mapping<u64, Route>,
    /// Last issued route id
    route_count: Var<u64>,
    /// Most recent route created for (from, to)
    pair_routes: Mapping<(Address, Address), u64>,
    /// Process-wide emergency flag
    emergency_mode: Var<bool>,
    /// Emergency withdrawal requests by id (ids start at 1)
    emergency_withdrawals: Mapping<u64, EmergencyWithdrawal>,
    emergency_withdrawal_count: Var<u64>,
    config: Var<RouterConfig>,
}

#[odra::module]
impl StrategyRouter {
    /// Initialize the router. `None` selects the default configuration.
    pub fn init(&mut self, admin: Address, config: Option<RouterConfig>) {
        let config = config.unwrap_or_else(default_router_config);
        self.validate_config(&config);
        self.access.init(admin);
        self.config.set(config);
        self.emergency_mode.set(false);
    }

    // ========== Protocol Registry ==========

    /// Register a protocol (admin only)
    pub fn register_protocol(&mut self, protocol: Address, name: String, risk_rating: u8) -> bool {
        self.require_admin();
        let height = self.current_height();
        self.registry.register(protocol, name.clone(), risk_rating, height);
        self.env().emit_event(events::ProtocolRegistered {
            protocol,
            name,
            risk_rating,
        });
        true
    }

    /// Activate or deactivate a registered protocol (admin only)
    pub fn set_protocol_active(&mut self, protocol: Address, active: bool) -> bool {
        self.require_admin();
        self.registry.set_active(protocol, active);
        self.env().emit_event(events::ProtocolStatusChanged { protocol, active });
        true
    }

    pub fn get_protocol_info(&self, protocol: Address) -> Option<ProtocolEntry> {
        self.registry.get_protocol_info(protocol)
    }

    pub fn get_protocol_count(&self) -> u32 {
        self.registry.get_protocol_count()
    }

    // ========== Route Book ==========

    /// Create a route between two active protocols. Open to any caller.
    pub fn create_route(&mut self, from: Address, to: Address, apy_bps: u32, gas_cost: U256) -> u64 {
        if from == to {
            self.env().revert(RouterError::InvalidProtocol);
        }
        self.registry.require_active(from);
        self.registry.require_active(to);

        let route_id = self.route_count.get_or_default() + 1;
        self.routes.set(
            &route_id,
            Route {
                from,
                to,
                apy_bps,
                gas_cost,
                active: true,
                created_at: self.current_height(),
            },
        );
        self.route_count.set(route_id);
        self.pair_routes.set(&(from, to), route_id);

        self.env().emit_event(events::RouteCreated {
            route_id,
            from,
            to,
            apy_bps,
            gas_cost,
        });
        route_id
    }

    /// Update the APY estimate of an active route (admin only)
    pub fn update_route_apy(&mut self, route_id: u64, apy_bps: u32) -> bool {
        self.require_admin();
        let mut route = self.require_active_route(route_id);
        route.apy_bps = apy_bps;
        self.routes.set(&route_id, route);
        self.env().emit_event(events::RouteApyUpdated { route_id, apy_bps });
        true
    }

    /// Deactivate a route permanently (admin only)
    pub fn deactivate_route(&mut self, route_id: u64) -> bool {
        self.require_admin();
        let mut route = self.require_active_route(route_id);
        route.active = false;
        self.routes.set(&route_id, route);
        self.env().emit_event(events::RouteDeactivated { route_id });
        true
    }

    /// Quote moving `amount` from one registered protocol to another.
    ///
    /// The routing fee applies with or without a route; an active route
    /// for the pair adds its gas cost and reports its APY.
    pub fn simulate_route(&self, from: Address, to: Address, amount: U256) -> RouteQuote {
        self.registry.require_registered(from);
        self.registry.require_registered(to);

        let config = self.get_config();
        let routing_fee = apply_bps(amount, config.routing_fee_bps);

        let route = self
            .pair_routes
            .get(&(from, to))
            .and_then(|id| self.routes.get(&id).map(|route| (id, route)))
            .filter(|(_, route)| route.active);

        let (route_id, gas_cost, apy_bps) = match route {
            Some((id, route)) => (Some(id), route.gas_cost, route.apy_bps),
            None => (None, U256::zero(), 0),
        };

        let fee = routing_fee.saturating_add(gas_cost);
        RouteQuote {
            route_id,
            fee,
            net_amount: amount.saturating_sub(fee),
            apy_bps,
        }
    }

    pub fn get_route(&self, route_id: u64) -> Option<Route> {
        self.routes.get(&route_id)
    }

    pub fn get_route_count(&self) -> u64 {
        self.route_count.get_or_default()
    }

    /// Most recently created route id for a pair, active or not
    pub fn get_route_for_pair(&self, from: Address, to: Address) -> Option<u64> {
        self.pair_routes.get(&(from, to))
    }

    // ========== Governance ==========

    /// Propose a registered protocol as a strategy
    pub fn propose_strategy(&mut self, protocol: Address, description: String) -> u64 {
        self.registry.require_registered(protocol);
        let proposer = self.env().caller();
        let height = self.current_height();
        let voting_period = self.get_config().voting_period;

        let proposal_id = self
            .governance
            .propose(proposer, protocol, description, height, voting_period);
        self.env().emit_event(events::StrategyProposed {
            proposal_id,
            proposer,
            protocol,
        });
        proposal_id
    }

    /// Cast a weighted vote; one vote per address per proposal
    pub fn vote_on_strategy(&mut self, proposal_id: u64, support: bool, weight: U256) -> bool {
        let voter = self.env().caller();
        let height = self.current_height();
        self.governance.vote(proposal_id, voter, support, weight, height);
        self.env().emit_event(events::VoteCast {
            proposal_id,
            voter,
            support,
            weight,
        });
        true
    }

    /// Resolve a proposal after its voting window
    pub fn finalize_proposal(&mut self, proposal_id: u64) -> ProposalStatus {
        let height = self.current_height();
        let quorum = self.get_config().quorum;
        let status = self.governance.finalize(proposal_id, height, quorum);
        self.env().emit_event(events::ProposalFinalized { proposal_id, status });
        status
    }

    pub fn get_strategy_proposal(&self, proposal_id: u64) -> Option<StrategyProposal> {
        self.governance.get_strategy_proposal(proposal_id)
    }

    pub fn get_proposal_count(&self) -> u64 {
        self.governance.get_proposal_count()
    }

    pub fn has_voted(&self, proposal_id: u64, voter: Address) -> bool {
        self.governance.has_voted(proposal_id, voter)
    }

    // ========== Keepers ==========

    /// Register the caller as a keeper
    pub fn register_keeper(&mut self) -> bool {
        let keeper = self.env().caller();
        let height = self.current_height();
        self.keepers.register(keeper, height);
        self.access.grant(ROLE_KEEPER, keeper);
        self.env().emit_event(events::KeeperRegistered { keeper });
        true
    }

    /// Fund the keeper reward pool with the attached value (admin only)
    #[odra(payable)]
    pub fn fund_keeper_rewards(&mut self) -> U256 {
        self.require_admin();
        let amount = u512_to_u256(self.env().attached_value());
        if amount.is_zero() {
            self.env().revert(RouterError::InvalidAmount);
        }
        self.keepers.fund(amount)
    }

    /// Credit one executed task to a keeper (admin only)
    pub fn record_keeper_task(&mut self, keeper: Address) -> U256 {
        self.require_admin();
        let reward = self.get_config().keeper_task_reward;
        let unclaimed = self.keepers.record_task(keeper, reward);
        self.env().emit_event(events::KeeperTaskRecorded { keeper, reward });
        unclaimed
    }

    /// Withdraw the caller's credited keeper rewards. Revoking
    /// `ROLE_KEEPER` suspends payouts.
    pub fn claim_keeper_rewards(&mut self) -> U256 {
        self.access.require_role(ROLE_KEEPER, RouterError::NotAuthorized);
        let keeper = self.env().caller();
        let amount = self.keepers.take_rewards(keeper);
        self.env().transfer_tokens(&keeper, &u256_to_u512(amount));
        self.env().emit_event(events::KeeperRewardsClaimed { keeper, amount });
        amount
    }

    pub fn get_keeper_info(&self, keeper: Address) -> Option<KeeperInfo> {
        self.keepers.get_keeper_info(keeper)
    }

    pub fn get_keeper_count(&self) -> u32 {
        self.keepers.get_keeper_count()
    }

    pub fn get_keeper_reward_pool(&self) -> U256 {
        self.keepers.get_keeper_reward_pool()
    }

    // ========== Emergency Controls ==========

    /// Flip emergency mode (admin only). Returns the new flag.
    pub fn toggle_emergency_mode(&mut self) -> bool {
        self.require_admin();
        let active = !self.is_emergency_mode();
        self.emergency_mode.set(active);
        self.env().emit_event(events::EmergencyModeToggled {
            active,
            by: self.env().caller(),
        });
        active
    }

    pub fn is_emergency_mode(&self) -> bool {
        self.emergency_mode.get_or_default()
    }

    /// Record a request to pull funds out of a protocol while in emergency mode
    pub fn request_emergency_withdrawal(&mut self, protocol: Address, amount: U256) -> bool {
        if !self.is_emergency_mode() {
            self.env().revert(RouterError::EmergencyModeInactive);
        }
        self.registry.require_registered(protocol);
        if amount.is_zero() {
            self.env().revert(RouterError::InvalidAmount);
        }

        let requester = self.env().caller();
        let request_id = self.emergency_withdrawal_count.get_or_default() + 1;
        self.emergency_withdrawals.set(
            &request_id,
            EmergencyWithdrawal {
                requester,
                protocol,
                amount,
                requested_at: self.current_height(),
            },
        );
        self.emergency_withdrawal_count.set(request_id);

        self.env().emit_event(events::EmergencyWithdrawalRequested {
            request_id,
            requester,
            protocol,
            amount,
        });
        true
    }

    pub fn get_emergency_withdrawal(&self, request_id: u64) -> Option<EmergencyWithdrawal> {
        self.emergency_withdrawals.get(&request_id)
    }

    pub fn get_emergency_withdrawal_count(&self) -> u64 {
        self.emergency_withdrawal_count.get_or_default()
    }

    // ========== Admin ==========

    /// Replace the router configuration (admin only)
    pub fn set_config(&mut self, config: RouterConfig) {
        self.require_admin();
        self.validate_config(&config);
        // the height clock is fixed at init
        if config.block_interval != self.get_config().block_interval {
            self.env().revert(RouterError::InvalidConfig);
        }
        self.config.set(config);
        self.env().emit_event(events::RouterConfigUpdated {
            by: self.env().caller(),
        });
    }

    pub fn grant_role(&mut self, role_id: u8, account: Address) {
        self.require_admin();
        self.access.grant(role_id, account);
    }

    pub fn revoke_role(&mut self, role_id: u8, account: Address) {
        self.require_admin();
        self.access.revoke(role_id, account, RouterError::InvalidConfig);
    }

    pub fn has_role(&self, role_id: u8, account: Address) -> bool {
        self.access.has_role(role_id, account)
    }

    pub fn get_config(&self) -> RouterConfig {
        self.config.get().unwrap_or_else(default_router_config)
    }

    pub fn get_current_height(&self) -> u64 {
        self.current_height()
    }

    // ========== Internal Functions ==========

    fn current_height(&self) -> u64 {
        height_at(self.env().get_block_time(), self.get_config().block_interval)
    }

    fn require_admin(&self) {
        self.access.require_role(ROLE_ADMIN, RouterError::NotAuthorized);
    }

    fn require_active_route(&self, route_id: u64) -> Route {
        let route = self
            .routes
            .get(&route_id)
            .unwrap_or_else(|| self.env().revert(RouterError::RouteNotFound));
        if !route.active {
            self.env().revert(RouterError::RouteInactive);
        }
        route
    }

    fn validate_config(&self, config: &RouterConfig) {
        if config.routing_fee_bps as u64 > BPS_SCALE
            || config.voting_period == 0
            || config.block_interval == 0
        {
            self.env().revert(RouterError::InvalidConfig);
        }
    }
}
