//! Deploy the yield aggregator contracts to Casper livenet/testnet using the
//! Odra livenet environment.
//!
//! Usage:
//!   cargo run --bin deploy_livenet --release
//!
//! Requires .env file with:
//!   ODRA_CASPER_LIVENET_SECRET_KEY_PATH=/path/to/secret_key.pem
//!   ODRA_CASPER_LIVENET_NODE_ADDRESS=https://node.testnet.casper.network
//!   ODRA_CASPER_LIVENET_CHAIN_NAME=casper-test
//!   ODRA_CASPER_LIVENET_PAYMENT_AMOUNT=200000000000
//!
//! Optional:
//!   DEPLOYMENT_OUTPUT=deployment.json

use odra::host::{Deployer, HostRef};
use odra::prelude::*;

use yield_agg_contracts::access_control::ROLE_FEE_SOURCE;
use yield_agg_contracts::reward_distributor::{RewardDistributor, RewardDistributorInitArgs};
use yield_agg_contracts::router::{StrategyRouter, StrategyRouterInitArgs};
use yield_agg_contracts::vault_manager::{VaultManager, VaultManagerInitArgs};

fn main() {
    // Load environment from .env file
    dotenv::dotenv().ok();

    println!("=== Yield Aggregator Livenet Deployment ===");
    println!();

    let env = odra_casper_livenet_env::env();

    // Payment amount for deployments and calls (required for Casper 2.0 txs)
    let payment_amount: u64 = std::env::var("ODRA_CASPER_LIVENET_PAYMENT_AMOUNT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(200_000_000_000);
    env.set_gas(payment_amount);

    let deployer = env.caller();
    println!("Deployer: {:?}", deployer);
    println!();

    // ==================== Phase 1: Contracts ====================
    println!("=== Phase 1: Deploying Contracts ===");
    println!();

    println!("Deploying StrategyRouter...");
    let router = StrategyRouter::deploy(
        &env,
        StrategyRouterInitArgs {
            admin: deployer,
            config: None,
        },
    );
    let router_addr = router.address().clone();
    println!("StrategyRouter deployed at: {:?}", router_addr);

    println!("Deploying RewardDistributor...");
    let mut rewards = RewardDistributor::deploy(
        &env,
        RewardDistributorInitArgs {
            admin: deployer,
            config: None,
        },
    );
    let rewards_addr = rewards.address().clone();
    println!("RewardDistributor deployed at: {:?}", rewards_addr);

    // The deployer collects compound fees until a treasury is set
    println!("Deploying VaultManager...");
    let mut vault = VaultManager::deploy(
        &env,
        VaultManagerInitArgs {
            admin: deployer,
            treasury: deployer,
            config: None,
        },
    );
    let vault_addr = vault.address().clone();
    println!("VaultManager deployed at: {:?}", vault_addr);

    println!();

    // ==================== Phase 2: Cross-contract Configuration ====================
    println!("=== Phase 2: Cross-contract Configuration ===");
    println!();

    println!("Configuring VaultManager -> StrategyRouter link...");
    vault.set_router(router_addr);
    println!("Done.");

    println!("Configuring VaultManager -> RewardDistributor link...");
    vault.set_reward_distributor(rewards_addr);
    println!("Done.");

    println!("Granting VaultManager the fee source role...");
    rewards.grant_role(ROLE_FEE_SOURCE, vault_addr);
    println!("Done.");

    println!();
    println!("=== Deployment Complete ===");
    println!();
    println!("Contract Addresses:");
    println!("  StrategyRouter:     {:?}", router_addr);
    println!("  RewardDistributor:  {:?}", rewards_addr);
    println!("  VaultManager:       {:?}", vault_addr);

    let output = std::env::var("DEPLOYMENT_OUTPUT").unwrap_or_else(|_| "deployment.json".to_string());
    let record = serde_json::json!({
        "deployer": format!("{:?}", deployer),
        "strategy_router": format!("{:?}", router_addr),
        "reward_distributor": format!("{:?}", rewards_addr),
        "vault_manager": format!("{:?}", vault_addr),
    });
    match serde_json::to_string_pretty(&record) {
        Ok(json) => match std::fs::write(&output, json) {
            Ok(()) => println!("Addresses written to {}", output),
            Err(err) => eprintln!("Could not write {}: {}", output, err),
        },
        Err(err) => eprintln!("Could not encode deployment record: {}", err),
    }
}
