//! # Balance Ledger
//!
//! Each member's contribution toward the *current* round of a circle. The
//! ledger holds no history: a payout zeroes every entry for the circle.
//!
//! ## Invariant
//!
//! For every circle, each entry is at most `deposit_amount`, so the sum of
//! entries is at most `deposit_amount * members.len()`. The ledger does not
//! know the cap; [`BalanceLedger::credited`] takes it from the caller and
//! refuses to produce a balance above it.

use std::collections::HashMap;

use rosca_core::{AccountId, Amount, CircleId};

use crate::custody::Payout;

#[derive(Debug, Default)]
pub struct BalanceLedger {
    entries: HashMap<(CircleId, AccountId), Amount>,
}

impl BalanceLedger {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, circle: &CircleId, member: &AccountId) -> Amount {
        self.entries
            .get(&(*circle, member.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// The balance `member` would hold after crediting `amount`, or `None`
    /// if that would exceed `cap`. Does not mutate.
    pub fn credited(&self, circle: &CircleId, member: &AccountId, amount: Amount, cap: Amount) -> Option<Amount> {
        self.balance_of(circle, member)
            .checked_add(amount)
            .filter(|next| *next <= cap)
    }

    pub fn set(&mut self, circle: CircleId, member: &AccountId, amount: Amount) {
        if amount == 0 {
            self.entries.remove(&(circle, member.clone()));
        } else {
            self.entries.insert((circle, member.clone()), amount);
        }
    }

    /// Balances in `members` order.
    pub fn balances(&self, circle: &CircleId, members: &[AccountId]) -> Vec<Amount> {
        members.iter().map(|m| self.balance_of(circle, m)).collect()
    }

    /// Whether every member has reached `deposit_amount`.
    pub fn all_funded(&self, circle: &CircleId, members: &[AccountId], deposit_amount: Amount) -> bool {
        members
            .iter()
            .all(|m| self.balance_of(circle, m) >= deposit_amount)
    }

    /// Nonzero balances in `members` order, as refund legs.
    pub fn outstanding(&self, circle: &CircleId, members: &[AccountId]) -> Vec<Payout> {
        members
            .iter()
            .filter_map(|m| {
                let amount = self.balance_of(circle, m);
                (amount > 0).then(|| Payout {
                    to: m.clone(),
                    amount,
                })
            })
            .collect()
    }

    /// Zero every entry for the circle.
    pub fn reset(&mut self, circle: &CircleId, members: &[AccountId]) {
        for m in members {
            self.entries.remove(&(*circle, m.clone()));
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Applying only credits accepted by `credited` never lets an entry
        /// exceed the cap or the sum exceed cap * members.
        #[test]
        fn credits_never_exceed_cap(
            cap in 1u128..1_000,
            ops in prop::collection::vec((0usize..3, 0u128..1_500), 0..60),
        ) {
            let circle = CircleId::derive("prop").unwrap();
            let members = vec![AccountId::new("a"), AccountId::new("b"), AccountId::new("c")];
            let mut ledger = BalanceLedger::new();
            for (who, amount) in ops {
                if let Some(next) = ledger.credited(&circle, &members[who], amount, cap) {
                    ledger.set(circle, &members[who], next);
                }
                let balances = ledger.balances(&circle, &members);
                prop_assert!(balances.iter().all(|b| *b <= cap));
                prop_assert!(balances.iter().sum::<u128>() <= cap * 3);
            }
        }
    }
}
