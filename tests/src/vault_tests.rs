//! Vault manager scenarios.

use odra::casper_types::U256;
use odra::host::{Deployer, HostRef};
use pretty_assertions::assert_eq;
use yield_agg_contracts::errors::VaultError;
use yield_agg_contracts::vault_manager::{VaultManager, VaultManagerInitArgs, PRICE_SCALE};

use crate::fixtures::{millions, motes, setup};

#[test]
fn test_create_vault_rejects_bad_tier() {
    let mut p = setup();
    p.env.set_caller(p.alice);

    assert_eq!(p.vault.try_create_vault(5), Err(VaultError::InvalidRiskTier.into()));
    assert_eq!(p.vault.try_create_vault(0), Err(VaultError::InvalidRiskTier.into()));
    assert_eq!(p.vault.get_vault_count(), 0);
}

#[test]
fn test_create_vault_sequential_ids() {
    let mut p = setup();
    p.env.set_caller(p.alice);

    assert_eq!(p.vault.create_vault(1), 1);
    assert_eq!(p.vault.create_vault(2), 2);
    assert_eq!(p.vault.create_vault(3), 3);

    let info = p.vault.get_vault_info(2).unwrap();
    assert_eq!(info.owner, p.alice);
    assert_eq!(info.risk_tier, 2);
    assert!(info.total_shares.is_zero());
    assert!(info.total_assets.is_zero());
}

#[test]
fn test_min_deposit() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(1);

    let below = millions(50);
    assert_eq!(
        p.vault.with_tokens(motes(below)).try_deposit(vault_id, below),
        Err(VaultError::MinDepositNotMet.into())
    );

    let shares = p.deposit(p.alice, vault_id, millions(100));
    assert_eq!(shares, millions(99));
}

#[test]
fn test_deposit_requires_matching_value() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(1);

    assert_eq!(
        p.vault.with_tokens(motes(millions(99))).try_deposit(vault_id, millions(100)),
        Err(VaultError::InvalidAmount.into())
    );
}

#[test]
fn test_deposit_into_unknown_vault() {
    let mut p = setup();
    let amount = millions(100);
    p.env.set_caller(p.alice);
    assert_eq!(
        p.vault.with_tokens(motes(amount)).try_deposit(7, amount),
        Err(VaultError::VaultNotFound.into())
    );
}

#[test]
fn test_deposit_accounting() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(2);
    p.deposit(p.alice, vault_id, millions(100));

    let info = p.vault.get_vault_info(vault_id).unwrap();
    assert_eq!(info.total_assets, millions(99));
    assert_eq!(info.total_shares, millions(99));

    let position = p.vault.get_user_position(vault_id, p.alice).unwrap();
    assert_eq!(position.shares, millions(99));
    assert_eq!(position.total_deposited, millions(100));

    assert_eq!(p.vault.get_total_tvl(), millions(99));
    assert_eq!(p.vault.get_protocol_fees().deposit, millions(1));
    assert_eq!(p.vault.get_share_price(vault_id), U256::from(PRICE_SCALE));
}

#[test]
fn test_withdraw_all_pays_net_of_fees() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(1);
    let shares = p.deposit(p.alice, vault_id, millions(100));

    let quote = p.vault.calculate_withdrawable_amount(p.alice, vault_id, shares);
    let net = p.vault.withdraw(vault_id, shares);

    assert_eq!(net, millions(98));
    assert_eq!(quote.net, net);
    assert_eq!(quote.fee, millions(1));

    let info = p.vault.get_vault_info(vault_id).unwrap();
    assert!(info.total_shares.is_zero());
    assert!(info.total_assets.is_zero());
    assert!(p.vault.get_total_tvl().is_zero());

    let fees = p.vault.get_protocol_fees();
    assert_eq!(fees.deposit + fees.withdrawal, millions(2));
}

#[test]
fn test_round_trip_never_creates_value() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(3);

    for amount in [100u64, 137, 250, 1_000] {
        let deposited = millions(amount);
        let shares = p.deposit(p.bob, vault_id, deposited);
        let fees_before = p.vault.get_protocol_fees();
        let net = p.vault.withdraw(vault_id, shares);
        let fees_after = p.vault.get_protocol_fees();

        let withdrawal_fee = fees_after.withdrawal - fees_before.withdrawal;
        assert!(net + withdrawal_fee <= deposited);
        assert!(net < deposited);
    }
}

#[test]
fn test_withdraw_more_than_held() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(1);
    let shares = p.deposit(p.alice, vault_id, millions(100));

    assert_eq!(
        p.vault.try_withdraw(vault_id, shares + U256::one()),
        Err(VaultError::InsufficientShares.into())
    );
    assert_eq!(
        p.vault.try_withdraw(vault_id, U256::zero()),
        Err(VaultError::InsufficientShares.into())
    );

    p.env.set_caller(p.bob);
    assert_eq!(
        p.vault.try_withdraw(vault_id, U256::one()),
        Err(VaultError::InsufficientShares.into())
    );
}

#[test]
fn test_pause_blocks_deposits_only() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(1);
    let shares = p.deposit(p.alice, vault_id, millions(200));

    p.env.set_caller(p.admin);
    assert!(p.vault.toggle_pause());
    assert!(p.vault.is_paused());

    let amount = millions(100);
    p.env.set_caller(p.bob);
    assert_eq!(
        p.vault.with_tokens(motes(amount)).try_deposit(vault_id, amount),
        Err(VaultError::VaultPaused.into())
    );

    p.env.set_caller(p.alice);
    assert!(p.vault.try_withdraw(vault_id, shares / 2).is_ok());

    p.env.set_caller(p.admin);
    assert!(!p.vault.toggle_pause());
    assert_eq!(p.deposit(p.bob, vault_id, amount), millions(99));
}

#[test]
fn test_toggle_pause_requires_admin() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    assert_eq!(p.vault.try_toggle_pause(), Err(VaultError::NotAuthorized.into()));
}

#[test]
fn test_vault_pause_by_owner() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(1);

    p.env.set_caller(p.bob);
    assert_eq!(
        p.vault.try_set_vault_paused(vault_id, true),
        Err(VaultError::NotAuthorized.into())
    );

    p.env.set_caller(p.alice);
    assert!(p.vault.set_vault_paused(vault_id, true));

    let amount = millions(100);
    assert_eq!(
        p.vault.with_tokens(motes(amount)).try_deposit(vault_id, amount),
        Err(VaultError::VaultPaused.into())
    );

    p.env.set_caller(p.admin);
    assert!(!p.vault.set_vault_paused(vault_id, false));
    p.deposit(p.alice, vault_id, amount);
}

#[test]
fn test_rebalance_owner_only() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(2);

    p.env.set_caller(p.bob);
    assert_eq!(
        p.vault.try_rebalance_vault(vault_id, vec![5000, 5000]),
        Err(VaultError::NotAuthorized.into())
    );

    p.env.set_caller(p.alice);
    assert!(p.vault.rebalance_vault(vault_id, vec![6000, 3000, 1000]));
    assert_eq!(p.vault.get_vault_allocation(vault_id), vec![6000, 3000, 1000]);

    assert!(p.vault.rebalance_vault(vault_id, vec![10_000]));
    assert_eq!(p.vault.get_vault_allocation(vault_id), vec![10_000]);
}

#[test]
fn test_strategies() {
    let mut p = setup();
    let manager = p.carol;

    p.env.set_caller(p.alice);
    assert_eq!(
        p.vault.try_add_strategy("Lending".to_string(), manager, 800, 3),
        Err(VaultError::NotAuthorized.into())
    );

    p.env.set_caller(p.admin);
    assert_eq!(p.vault.add_strategy("Lending".to_string(), manager, 800, 3), 1);
    assert_eq!(p.vault.add_strategy("LP".to_string(), manager, 1500, 7), 2);
    assert!(p.vault.update_strategy_apy(1, 950));
    assert_eq!(p.vault.get_strategy(1).unwrap().apy_bps, 950);
    assert_eq!(
        p.vault.try_update_strategy_apy(99, 1),
        Err(VaultError::StrategyNotFound.into())
    );
}

#[test]
fn test_compound_grows_share_price() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(2);
    p.deposit(p.alice, vault_id, millions(100));
    let price_before = p.vault.get_share_price(vault_id);

    let harvested = millions(10);
    p.env.set_caller(p.alice);
    assert_eq!(p.vault.with_tokens(motes(harvested)).report_yield(vault_id), harvested);

    let treasury_before = p.env.balance_of(&p.treasury);
    p.env.set_caller(p.bob);
    assert!(p.vault.with_tokens(motes(U256::from(500_000u64))).compound_rewards(vault_id));
    assert_eq!(
        p.env.balance_of(&p.treasury),
        treasury_before + motes(U256::from(200_000u64))
    );

    let info = p.vault.get_vault_info(vault_id).unwrap();
    // 15% performance fee on 10e6
    assert_eq!(info.total_assets, U256::from(107_500_000u64));
    assert!(info.pending_yield.is_zero());
    assert_eq!(p.vault.get_protocol_fees().performance, U256::from(1_500_000u64));
    assert!(p.vault.get_share_price(vault_id) > price_before);
}

#[test]
fn test_compound_requires_fee() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(1);

    assert_eq!(
        p.vault
            .with_tokens(motes(U256::from(199_999u64)))
            .try_compound_rewards(vault_id),
        Err(VaultError::InsufficientGasFee.into())
    );
}

#[test]
fn test_report_yield_authorization() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(1);

    p.env.set_caller(p.bob);
    assert_eq!(
        p.vault.with_tokens(motes(millions(1))).try_report_yield(vault_id),
        Err(VaultError::NotAuthorized.into())
    );
}

#[test]
fn test_share_price_monotonic_across_deposits_and_withdrawals() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(3);
    p.deposit(p.alice, vault_id, millions(100));

    p.env.set_caller(p.alice);
    p.vault.with_tokens(motes(millions(7))).report_yield(vault_id);
    p.vault.with_tokens(motes(U256::from(200_000u64))).compound_rewards(vault_id);

    let mut price = p.vault.get_share_price(vault_id);
    for (user, amount) in [(p.bob, 200u64), (p.carol, 333), (p.alice, 101)] {
        p.deposit(user, vault_id, millions(amount));
        let next = p.vault.get_share_price(vault_id);
        assert!(next >= price);
        price = next;
    }

    for user in [p.bob, p.carol] {
        let shares = p.vault.get_user_position(vault_id, user).unwrap().shares;
        p.env.set_caller(user);
        p.vault.withdraw(vault_id, shares / 3);
        let next = p.vault.get_share_price(vault_id);
        assert!(next >= price);
        price = next;
    }
}

#[test]
fn test_degenerate_deposit_rejected() {
    let mut p = setup();
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(1);
    let shares = p.deposit(p.alice, vault_id, millions(100));

    // Leave a single share backed by a single unit, then inflate its price.
    p.vault.withdraw(vault_id, shares - U256::one());
    p.vault.with_tokens(motes(millions(500))).report_yield(vault_id);
    p.vault.with_tokens(motes(U256::from(200_000u64))).compound_rewards(vault_id);

    let amount = millions(100);
    p.env.set_caller(p.bob);
    assert_eq!(
        p.vault.with_tokens(motes(amount)).try_deposit(vault_id, amount),
        Err(VaultError::DegenerateDeposit.into())
    );
}

#[test]
fn test_forward_fees_requires_distributor() {
    let p = setup();
    let mut vault = VaultManager::deploy(
        &p.env,
        VaultManagerInitArgs {
            admin: p.admin,
            treasury: p.treasury,
            config: None,
        },
    );
    p.env.set_caller(p.admin);
    assert_eq!(
        vault.try_forward_fees_to_rewards(U256::one()),
        Err(VaultError::DistributorNotConfigured.into())
    );
    assert_eq!(vault.get_router(), None);
    assert_eq!(vault.get_reward_distributor(), None);
}

#[test]
fn test_config_update() {
    let mut p = setup();
    let mut config = p.vault.get_config();
    config.min_deposit = millions(10);

    p.env.set_caller(p.alice);
    assert_eq!(
        p.vault.try_set_config(config.clone()),
        Err(VaultError::NotAuthorized.into())
    );

    p.env.set_caller(p.admin);
    let mut invalid = config.clone();
    invalid.deposit_fee_bps = 10_001;
    assert_eq!(p.vault.try_set_config(invalid), Err(VaultError::InvalidConfig.into()));

    p.vault.set_config(config);
    p.env.set_caller(p.alice);
    let vault_id = p.vault.create_vault(1);
    // 10e6 deposit pays the 1e6 fee floor
    assert_eq!(p.deposit(p.alice, vault_id, millions(10)), millions(9));
}

#[test]
fn test_vault_block_interval_fixed() {
    let mut p = setup();
    p.env.set_caller(p.admin);
    let height = p.vault.get_current_height();
    let mut config = p.vault.get_config();
    config.block_interval *= 2;
    assert_eq!(p.vault.try_set_config(config), Err(VaultError::InvalidConfig.into()));
    assert_eq!(p.vault.get_current_height(), height);
}
