//! Strategy router scenarios: registry, routes, governance, keepers, emergency.

use odra::casper_types::U256;
use odra::host::HostRef;
use odra::prelude::*;
use pretty_assertions::assert_eq;
use yield_agg_contracts::access_control::ROLE_KEEPER;
use yield_agg_contracts::errors::RouterError;
use yield_agg_contracts::types::ProposalStatus;

use crate::fixtures::{advance_heights, millions, motes, setup, Protocol};

const VOTING_PERIOD: u64 = 1_440;

/// Two protocol addresses registered by the admin
fn with_protocols() -> (Protocol, Address, Address) {
    let mut p = setup();
    let aave = p.env.get_account(5);
    let curve = p.env.get_account(6);
    p.env.set_caller(p.admin);
    p.router.register_protocol(aave, "aave".to_string(), 3);
    p.router.register_protocol(curve, "curve".to_string(), 5);
    (p, aave, curve)
}

#[test]
fn test_register_protocol() {
    let (mut p, aave, _) = with_protocols();
    let entry = p.router.get_protocol_info(aave).unwrap();
    assert_eq!(entry.name, "aave");
    assert_eq!(entry.risk_rating, 3);
    assert!(entry.active);
    assert_eq!(p.router.get_protocol_count(), 2);

    assert_eq!(
        p.router.try_register_protocol(aave, "aave-v3".to_string(), 3),
        Err(RouterError::ProtocolAlreadyRegistered.into())
    );

    let other = p.env.get_account(7);
    assert_eq!(
        p.router.try_register_protocol(other, "x".repeat(65), 3),
        Err(RouterError::NameTooLong.into())
    );
    assert_eq!(
        p.router.try_register_protocol(other, "lido".to_string(), 0),
        Err(RouterError::InvalidRiskRating.into())
    );
    assert_eq!(
        p.router.try_register_protocol(other, "lido".to_string(), 11),
        Err(RouterError::InvalidRiskRating.into())
    );

    p.env.set_caller(p.alice);
    assert_eq!(
        p.router.try_register_protocol(other, "lido".to_string(), 4),
        Err(RouterError::NotAuthorized.into())
    );
}

#[test]
fn test_create_route() {
    let (mut p, aave, curve) = with_protocols();
    let unknown = p.env.get_account(8);

    assert_eq!(
        p.router.try_create_route(aave, unknown, 500, U256::zero()),
        Err(RouterError::InvalidProtocol.into())
    );
    assert_eq!(
        p.router.try_create_route(aave, aave, 500, U256::zero()),
        Err(RouterError::InvalidProtocol.into())
    );

    assert_eq!(p.router.create_route(aave, curve, 500, U256::zero()), 1);
    assert_eq!(p.router.create_route(curve, aave, 700, U256::from(50_000u64)), 2);
    assert_eq!(p.router.get_route_count(), 2);
    assert_eq!(p.router.get_route_for_pair(curve, aave), Some(2));
    assert_eq!(p.router.get_route(2).unwrap().apy_bps, 700);

    p.router.set_protocol_active(curve, false);
    assert_eq!(
        p.router.try_create_route(aave, curve, 500, U256::zero()),
        Err(RouterError::InvalidProtocol.into())
    );

}

#[test]
fn test_any_caller_can_create_route() {
    let (mut p, aave, curve) = with_protocols();
    p.env.set_caller(p.alice);
    assert_eq!(p.router.create_route(aave, curve, 500, U256::zero()), 1);
    assert_eq!(p.router.get_route(1).unwrap().from, aave);
    assert_eq!(p.router.get_route_for_pair(aave, curve), Some(1));

    p.env.set_caller(p.bob);
    assert_eq!(
        p.router.try_create_route(aave, p.carol, 500, U256::zero()),
        Err(RouterError::InvalidProtocol.into())
    );
}

#[test]
fn test_update_and_deactivate_route() {
    let (mut p, aave, curve) = with_protocols();
    let route_id = p.router.create_route(aave, curve, 500, U256::zero());

    assert!(p.router.update_route_apy(route_id, 650));
    assert_eq!(p.router.get_route(route_id).unwrap().apy_bps, 650);

    assert!(p.router.deactivate_route(route_id));
    assert!(!p.router.get_route(route_id).unwrap().active);
    assert_eq!(
        p.router.try_update_route_apy(route_id, 700),
        Err(RouterError::RouteInactive.into())
    );
    assert_eq!(
        p.router.try_deactivate_route(route_id),
        Err(RouterError::RouteInactive.into())
    );
    assert_eq!(
        p.router.try_update_route_apy(42, 700),
        Err(RouterError::RouteNotFound.into())
    );
}

#[test]
fn test_simulate_route() {
    let (mut p, aave, curve) = with_protocols();
    let amount = millions(100);

    let quote = p.router.simulate_route(aave, curve, amount);
    assert_eq!(quote.route_id, None);
    assert_eq!(quote.fee, U256::from(100_000u64));
    assert_eq!(quote.net_amount, amount - U256::from(100_000u64));

    let route_id = p.router.create_route(aave, curve, 800, U256::from(50_000u64));
    let quote = p.router.simulate_route(aave, curve, amount);
    assert_eq!(quote.route_id, Some(route_id));
    assert_eq!(quote.fee, U256::from(150_000u64));
    assert_eq!(quote.apy_bps, 800);

    p.router.deactivate_route(route_id);
    let quote = p.router.simulate_route(aave, curve, amount);
    assert_eq!(quote.route_id, None);
    assert_eq!(quote.fee, U256::from(100_000u64));

    // gas cost above the amount saturates to zero
    p.router.create_route(aave, curve, 800, U256::from(50_000u64));
    let quote = p.router.simulate_route(aave, curve, U256::from(10_000u64));
    assert_eq!(quote.fee, U256::from(50_010u64));
    assert!(quote.net_amount.is_zero());

    let unknown = p.env.get_account(8);
    assert_eq!(
        p.router.try_simulate_route(aave, unknown, amount),
        Err(RouterError::InvalidProtocol.into())
    );
}

#[test]
fn test_propose_and_vote() {
    let (mut p, aave, _) = with_protocols();
    let unknown = p.env.get_account(8);

    p.env.set_caller(p.alice);
    assert_eq!(
        p.router.try_propose_strategy(unknown, "move funds".to_string()),
        Err(RouterError::InvalidProtocol.into())
    );
    assert_eq!(
        p.router.try_propose_strategy(aave, "x".repeat(257)),
        Err(RouterError::DescriptionTooLong.into())
    );

    let proposal_id = p.router.propose_strategy(aave, "allocate to aave".to_string());
    assert_eq!(proposal_id, 1);

    assert!(p.router.vote_on_strategy(proposal_id, true, U256::from(800u64)));
    assert!(p.router.has_voted(proposal_id, p.alice));
    assert_eq!(
        p.router.try_vote_on_strategy(proposal_id, false, U256::from(1u64)),
        Err(RouterError::AlreadyVoted.into())
    );

    p.env.set_caller(p.bob);
    assert_eq!(
        p.router.try_vote_on_strategy(proposal_id, true, U256::zero()),
        Err(RouterError::InvalidAmount.into())
    );
    p.router.vote_on_strategy(proposal_id, false, U256::from(300u64));
    assert_eq!(
        p.router.try_vote_on_strategy(9, true, U256::from(1u64)),
        Err(RouterError::ProposalNotFound.into())
    );

    let proposal = p.router.get_strategy_proposal(proposal_id).unwrap();
    assert_eq!(proposal.votes_for, U256::from(800u64));
    assert_eq!(proposal.votes_against, U256::from(300u64));
    assert_eq!(proposal.status, ProposalStatus::Pending);

    assert_eq!(
        p.router.try_finalize_proposal(proposal_id),
        Err(RouterError::VotingActive.into())
    );
}

#[test]
fn test_finalize_approved() {
    let (mut p, aave, _) = with_protocols();

    p.env.set_caller(p.alice);
    let proposal_id = p.router.propose_strategy(aave, "allocate".to_string());
    p.router.vote_on_strategy(proposal_id, true, U256::from(1_200u64));
    p.env.set_caller(p.bob);
    p.router.vote_on_strategy(proposal_id, false, U256::from(400u64));

    advance_heights(&p.env, VOTING_PERIOD);
    p.env.set_caller(p.carol);
    assert_eq!(
        p.router.try_vote_on_strategy(proposal_id, true, U256::from(1u64)),
        Err(RouterError::ProposalClosed.into())
    );

    assert_eq!(p.router.finalize_proposal(proposal_id), ProposalStatus::Approved);
    assert_eq!(
        p.router.try_finalize_proposal(proposal_id),
        Err(RouterError::ProposalClosed.into())
    );
}

#[test]
fn test_finalize_rejected_without_quorum() {
    let (mut p, aave, _) = with_protocols();

    p.env.set_caller(p.alice);
    let proposal_id = p.router.propose_strategy(aave, "allocate".to_string());
    p.router.vote_on_strategy(proposal_id, true, U256::from(999u64));

    advance_heights(&p.env, VOTING_PERIOD);
    assert_eq!(p.router.finalize_proposal(proposal_id), ProposalStatus::Rejected);
    assert_eq!(
        p.router.get_strategy_proposal(proposal_id).unwrap().status,
        ProposalStatus::Rejected
    );
}

#[test]
fn test_keeper_lifecycle() {
    let mut p = setup();
    let task_reward = U256::from(100_000u64);

    p.env.set_caller(p.alice);
    assert!(p.router.register_keeper());
    assert!(p.router.has_role(ROLE_KEEPER, p.alice));
    assert_eq!(p.router.get_keeper_count(), 1);
    assert_eq!(
        p.router.try_register_keeper(),
        Err(RouterError::KeeperAlreadyRegistered.into())
    );

    p.env.set_caller(p.admin);
    assert_eq!(
        p.router.try_record_keeper_task(p.alice),
        Err(RouterError::KeeperPoolInsufficient.into())
    );
    assert_eq!(
        p.router.with_tokens(motes(millions(1))).fund_keeper_rewards(),
        millions(1)
    );
    assert_eq!(p.router.record_keeper_task(p.alice), task_reward);
    assert_eq!(p.router.record_keeper_task(p.alice), task_reward * 2);
    assert_eq!(p.router.get_keeper_reward_pool(), millions(1) - task_reward * 2);
    assert_eq!(
        p.router.try_record_keeper_task(p.bob),
        Err(RouterError::KeeperNotFound.into())
    );

    let info = p.router.get_keeper_info(p.alice).unwrap();
    assert_eq!(info.tasks_executed, 2);

    p.env.set_caller(p.alice);
    assert_eq!(p.router.claim_keeper_rewards(), task_reward * 2);
    assert!(p.router.get_keeper_info(p.alice).unwrap().unclaimed().is_zero());
    assert_eq!(
        p.router.try_claim_keeper_rewards(),
        Err(RouterError::NoKeeperRewards.into())
    );

    p.env.set_caller(p.bob);
    assert_eq!(
        p.router.try_claim_keeper_rewards(),
        Err(RouterError::NotAuthorized.into())
    );
}

#[test]
fn test_revoked_keeper_cannot_claim() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    p.router.register_keeper();

    p.env.set_caller(p.admin);
    p.router.with_tokens(motes(millions(1))).fund_keeper_rewards();
    let reward = p.router.record_keeper_task(p.alice);
    p.router.revoke_role(ROLE_KEEPER, p.alice);

    p.env.set_caller(p.alice);
    assert_eq!(
        p.router.try_claim_keeper_rewards(),
        Err(RouterError::NotAuthorized.into())
    );
    assert_eq!(p.router.get_keeper_info(p.alice).unwrap().unclaimed(), reward);

    p.env.set_caller(p.admin);
    p.router.grant_role(ROLE_KEEPER, p.alice);
    p.env.set_caller(p.alice);
    assert_eq!(p.router.claim_keeper_rewards(), reward);
}

#[test]
fn test_router_block_interval_fixed() {
    let mut p = setup();
    let height = p.router.get_current_height();
    let mut config = p.router.get_config();
    config.block_interval = 1;
    assert_eq!(
        p.router.try_set_config(config),
        Err(RouterError::InvalidConfig.into())
    );
    assert_eq!(p.router.get_current_height(), height);
}

#[test]
fn test_fund_keeper_rewards_requires_admin() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    assert_eq!(
        p.router.with_tokens(motes(millions(1))).try_fund_keeper_rewards(),
        Err(RouterError::NotAuthorized.into())
    );

    p.env.set_caller(p.admin);
    assert_eq!(
        p.router.try_fund_keeper_rewards(),
        Err(RouterError::InvalidAmount.into())
    );
}

#[test]
fn test_emergency_withdrawal() {
    let (mut p, aave, _) = with_protocols();

    p.env.set_caller(p.alice);
    assert_eq!(
        p.router.try_request_emergency_withdrawal(aave, millions(5)),
        Err(RouterError::EmergencyModeInactive.into())
    );
    assert_eq!(
        p.router.try_toggle_emergency_mode(),
        Err(RouterError::NotAuthorized.into())
    );

    p.env.set_caller(p.admin);
    assert!(p.router.toggle_emergency_mode());
    assert!(p.router.is_emergency_mode());

    p.env.set_caller(p.alice);
    assert!(p.router.request_emergency_withdrawal(aave, millions(5)));
    let request = p.router.get_emergency_withdrawal(1).unwrap();
    assert_eq!(request.requester, p.alice);
    assert_eq!(request.amount, millions(5));
    assert_eq!(p.router.get_emergency_withdrawal_count(), 1);

    let unknown = p.env.get_account(8);
    assert_eq!(
        p.router.try_request_emergency_withdrawal(unknown, millions(5)),
        Err(RouterError::InvalidProtocol.into())
    );
    assert_eq!(
        p.router.try_request_emergency_withdrawal(aave, U256::zero()),
        Err(RouterError::InvalidAmount.into())
    );

    p.env.set_caller(p.admin);
    assert!(!p.router.toggle_emergency_mode());
}

#[test]
fn test_router_config_update() {
    let mut p = setup();
    let mut config = p.router.get_config();
    config.routing_fee_bps = 10_001;
    assert_eq!(
        p.router.try_set_config(config.clone()),
        Err(RouterError::InvalidConfig.into())
    );

    config.routing_fee_bps = 25;
    p.router.set_config(config);
    assert_eq!(p.router.get_config().routing_fee_bps, 25);

    let current = p.router.get_config();
    p.env.set_caller(p.alice);
    assert_eq!(
        p.router.try_set_config(current),
        Err(RouterError::NotAuthorized.into())
    );
}
