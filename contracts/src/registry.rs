//! Registry of external yield protocols the router may route between.
//!
//! Embedded in the strategy router. Authorization is checked by the
//! router before any mutating call lands here.

use odra::prelude::*;
use crate::errors::RouterError;
use crate::types::ProtocolEntry;

/// Longest accepted protocol name, in bytes
pub const MAX_PROTOCOL_NAME_LEN: usize = 64;
/// Riskiest accepted rating
pub const MAX_RISK_RATING: u8 = 10;

/// Protocol registry module
#[odra::module]
pub struct ProtocolRegistry {
    /// Registered protocols by address
    protocols: Mapping<Address, ProtocolEntry>,
    /// Number of registered protocols
    protocol_count: Var<u32>,
}

#[odra::module]
impl ProtocolRegistry {
    /// Get a registered protocol
    pub fn get_protocol_info(&self, protocol: Address) -> Option<ProtocolEntry> {
        self.protocols.get(&protocol)
    }

    /// Check if an address is registered
    pub fn is_registered(&self, protocol: Address) -> bool {
        self.protocols.get(&protocol).is_some()
    }

    /// Get the number of registered protocols
    pub fn get_protocol_count(&self) -> u32 {
        self.protocol_count.get_or_default()
    }
}

impl ProtocolRegistry {
    /// Register a protocol at `height`.
    pub fn register(&mut self, protocol: Address, name: String, risk_rating: u8, height: u64) {
        if name.is_empty() || name.len() > MAX_PROTOCOL_NAME_LEN {
            self.env().revert(RouterError::NameTooLong);
        }
        if risk_rating == 0 || risk_rating > MAX_RISK_RATING {
            self.env().revert(RouterError::InvalidRiskRating);
        }
        if self.is_registered(protocol) {
            self.env().revert(RouterError::ProtocolAlreadyRegistered);
        }

        self.protocols.set(
            &protocol,
            ProtocolEntry {
                name,
                risk_rating,
                active: true,
                registered_at: height,
            },
        );
        self.protocol_count.set(self.get_protocol_count() + 1);
    }

    /// Flip the active flag of a registered protocol.
    pub fn set_active(&mut self, protocol: Address, active: bool) {
        let mut entry = self.require_registered(protocol);
        entry.active = active;
        self.protocols.set(&protocol, entry);
    }

    /// Registered entry, or revert with `InvalidProtocol`.
    pub fn require_registered(&self, protocol: Address) -> ProtocolEntry {
        self.protocols
            .get(&protocol)
            .unwrap_or_else(|| self.env().revert(RouterError::InvalidProtocol))
    }

    /// Registered and active entry, or revert with `InvalidProtocol`.
    pub fn require_active(&self, protocol: Address) -> ProtocolEntry {
        let entry = self.require_registered(protocol);
        if !entry.active {
            self.env().revert(RouterError::InvalidProtocol);
        }
        entry
    }
}
