//! # Membership Index
//!
//! (circle, account) pairs authorized to receive deposits. Written once when a
//! circle is created and purged when it is decommissioned.

use std::collections::HashSet;

use rosca_core::{AccountId, CircleId};

#[derive(Debug, Default)]
pub struct MembershipIndex {
    entries: HashSet<(CircleId, AccountId)>,
}

impl MembershipIndex {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enroll(&mut self, circle: CircleId, members: &[AccountId]) {
        self.entries
            .extend(members.iter().map(|m| (circle, m.clone())));
    }

    pub fn is_member(&self, circle: &CircleId, account: &AccountId) -> bool {
        self.entries.contains(&(*circle, account.clone()))
    }

    pub fn purge(&mut self, circle: &CircleId, members: &[AccountId]) {
        for m in members {
            self.entries.remove(&(*circle, m.clone()));
        }
    }
}
