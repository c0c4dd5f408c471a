//! SHA-256 merkle trees for airdrop claims.
//!
//! Interior nodes hash the two children in ascending byte order, so a
//! proof is just the list of siblings from leaf to root. Odd levels
//! carry their last node up unchanged by pairing it with itself.

use odra::casper_types::bytesrepr::ToBytes;
use odra::casper_types::U256;
use odra::prelude::*;
use sha2::{Digest, Sha256};

pub type Hash = [u8; 32];

/// Leaf for `(account, amount, index)`:
/// `SHA256(account bytes ‖ amount as 32-byte big endian ‖ index as 8-byte big endian)`.
pub fn leaf_hash(account: &Address, amount: U256, index: u64) -> Hash {
    let mut amount_bytes = [0u8; 32];
    amount.to_big_endian(&mut amount_bytes);

    let mut hasher = Sha256::new();
    hasher.update(account.to_bytes().unwrap_or_default());
    hasher.update(amount_bytes);
    hasher.update(index.to_be_bytes());
    finalize(hasher)
}

/// `SHA256(min(a, b) ‖ max(a, b))`
pub fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (left, right) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    finalize(hasher)
}

/// Fold `proof` over `leaf` and compare with `root`.
pub fn verify_proof(leaf: Hash, proof: &[Hash], root: &Hash) -> bool {
    let computed = proof.iter().fold(leaf, |node, sibling| hash_pair(&node, sibling));
    &computed == root
}

/// Root over `leaves`. Zero hash for an empty set.
pub fn compute_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return [0u8; 32];
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level[0]
}

/// Sibling path for the leaf at `index`, or `None` when out of range.
pub fn build_proof(leaves: &[Hash], index: usize) -> Option<Vec<Hash>> {
    if index >= leaves.len() {
        return None;
    }
    let mut proof = Vec::new();
    let mut level = leaves.to_vec();
    let mut position = index;
    while level.len() > 1 {
        let sibling = if position % 2 == 0 {
            level.get(position + 1).copied().unwrap_or(level[position])
        } else {
            level[position - 1]
        };
        proof.push(sibling);
        level = next_level(&level);
        position /= 2;
    }
    Some(proof)
}

fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
        .collect()
}

fn finalize(hasher: Sha256) -> Hash {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}
