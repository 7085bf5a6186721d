//! # Administrative Capability
//!
//! Who counts as an administrator is decided outside the engine. The engine
//! only asks.

use std::collections::HashSet;

use rosca_core::AccountId;

/// Answers whether an account holds the administrative capability.
pub trait AdminCapability: Send + Sync {
    fn is_admin(&self, caller: &AccountId) -> bool;
}

/// A fixed set of administrators.
#[derive(Debug, Clone, Default)]
pub struct StaticAdmins {
    admins: HashSet<AccountId>,
}

impl StaticAdmins {
    pub fn new(admins: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }
}

impl AdminCapability for StaticAdmins {
    fn is_admin(&self, caller: &AccountId) -> bool {
        !caller.is_null() && self.admins.contains(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_accounts_are_admins() {
        let admins = StaticAdmins::new([AccountId::new("root")]);
        assert!(admins.is_admin(&AccountId::new("root")));
        assert!(!admins.is_admin(&AccountId::new("ada")));
    }

    #[test]
    fn null_is_never_admin() {
        let admins = StaticAdmins::new([AccountId::null()]);
        assert!(!admins.is_admin(&AccountId::null()));
    }
}
