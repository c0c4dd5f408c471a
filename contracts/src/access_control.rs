//! Role-based access control shared by all yield aggregator contracts.
//!
//! Embedded as a `SubModule` in every contract. Each contract checks
//! roles with [`AccessControl::require_role`], passing its own error
//! so callers see the contract's `NotAuthorized` code.
//!
//! Roles:
//! - ADMIN manages configuration and grants every other role
//! - KEEPER runs automation tasks
//! - FEE_SOURCE may push protocol fees and referral fees into the reward pool
//! - YIELD_REPORTER may report harvested yield into a vault

use odra::prelude::*;

/// Role constants (u8 for efficient storage)
pub const ROLE_ADMIN: u8 = 0;
pub const ROLE_KEEPER: u8 = 1;
pub const ROLE_FEE_SOURCE: u8 = 2;
pub const ROLE_YIELD_REPORTER: u8 = 3;

pub mod events {
    use odra::prelude::*;

    #[odra::event]
    pub struct RoleGranted {
        pub role: u8,
        pub account: Address,
    }

    #[odra::event]
    pub struct RoleRevoked {
        pub role: u8,
        pub account: Address,
    }
}

/// Access Control module
#[odra::module(events = [events::RoleGranted, events::RoleRevoked])]
pub struct AccessControl {
    /// Role assignments: (role, account) -> bool
    roles: Mapping<(u8, Address), bool>,
    /// Number of accounts with each role
    role_count: Mapping<u8, u32>,
}

#[odra::module]
impl AccessControl {
    /// Initialize access control with initial admin
    pub fn init(&mut self, initial_admin: Address) {
        self.set_role_internal(ROLE_ADMIN, initial_admin, true);
    }

    /// Check if account has a specific role
    pub fn has_role(&self, role_id: u8, account: Address) -> bool {
        self.roles.get(&(role_id, account)).unwrap_or(false)
    }

    /// Get the number of accounts with a role
    pub fn get_role_member_count(&self, role_id: u8) -> u32 {
        self.role_count.get(&role_id).unwrap_or(0)
    }
}

impl AccessControl {
    /// Check if caller has a specific role
    pub fn caller_has_role(&self, role_id: u8) -> bool {
        self.has_role(role_id, self.env().caller())
    }

    /// Revert with `error` unless the caller holds `role_id`.
    pub fn require_role<E: Into<OdraError>>(&self, role_id: u8, error: E) {
        if !self.caller_has_role(role_id) {
            self.env().revert(error);
        }
    }

    /// Revert with `error` unless the caller holds at least one of `roles`.
    pub fn require_any_role<E: Into<OdraError>>(&self, roles: &[u8], error: E) {
        if !roles.iter().any(|role| self.caller_has_role(*role)) {
            self.env().revert(error);
        }
    }

    /// Grant a role. The embedding contract checks authorization first.
    pub fn grant(&mut self, role_id: u8, account: Address) {
        if self.has_role(role_id, account) {
            return;
        }
        self.set_role_internal(role_id, account, true);
    }

    /// Revoke a role. Reverts with `error` when removing the last admin.
    pub fn revoke<E: Into<OdraError>>(&mut self, role_id: u8, account: Address, error: E) {
        if !self.has_role(role_id, account) {
            return;
        }
        if role_id == ROLE_ADMIN && self.get_role_member_count(ROLE_ADMIN) <= 1 {
            self.env().revert(error);
        }
        self.set_role_internal(role_id, account, false);
    }

    fn set_role_internal(&mut self, role_id: u8, account: Address, value: bool) {
        let had_role = self.roles.get(&(role_id, account)).unwrap_or(false);

        self.roles.set(&(role_id, account), value);

        let current_count = self.role_count.get(&role_id).unwrap_or(0);
        if value && !had_role {
            self.role_count.set(&role_id, current_count + 1);
            self.env().emit_event(events::RoleGranted { role: role_id, account });
        } else if !value && had_role && current_count > 0 {
            self.role_count.set(&role_id, current_count - 1);
            self.env().emit_event(events::RoleRevoked { role: role_id, account });
        }
    }
}
