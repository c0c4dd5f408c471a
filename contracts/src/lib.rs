//! Yield Aggregator Contracts
//!
//! Accounting engine for pooled yield vaults on Casper.
//!
//! ## Architecture
//!
//! - **VaultManager**: Share-based vaults with fees, pausing and strategy allocation
//! - **RewardDistributor**: Reward pool with locks, referrals, epochs and merkle airdrops
//! - **StrategyRouter**: Protocol registry, route book, governance, keepers and
//!   emergency controls
//!
//! ## Cross-contract flows
//!
//! - VaultManager forwards collected fees to `RewardDistributor::receive_protocol_fees`
//!   (the vault needs `ROLE_FEE_SOURCE` on the distributor)
//! - VaultManager quotes routed allocations through `StrategyRouter::simulate_route`

#![cfg_attr(target_arch = "wasm32", no_std)]

#[cfg(target_arch = "wasm32")]
extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod types;
pub mod errors;
pub mod math;
pub mod merkle;
pub mod clock;
pub mod access_control;

// Strategy router sub-modules
pub mod registry;
pub mod governance;
pub mod keeper;

// Contract modules
pub mod router;
pub mod vault_manager;
pub mod reward_distributor;
