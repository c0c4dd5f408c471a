//! Ledger height derived from the host block time.

/// Height at `block_time_ms` for a given interval. A zero interval is
/// treated as one millisecond per height.
pub fn height_at(block_time_ms: u64, block_interval_ms: u64) -> u64 {
    block_time_ms / block_interval_ms.max(1)
}
