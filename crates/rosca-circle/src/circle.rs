//! # Circle Records and Round Schedule
//!
//! A circle's schedule is a sequence of back-to-back rounds of
//! `deposit_interval` seconds starting at `circle_start`:
//!
//! ```text
//! round i = [circle_start + interval*i, circle_start + interval*(i+1))
//! ```
//!
//! Deposits are accepted only inside the round selected by `current_index`
//! and only before `circle_start + interval*max_deposits`. All boundary
//! arithmetic is done in `i128` epoch seconds and saturates, so a schedule
//! whose end is unrepresentable simply never ends.

use rosca_core::{AccountId, Amount, AssetId, CircleId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{CircleError, DepositRejection};

/// What a creator submits. The id is derived from `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircleDefinition {
    pub name: String,
    pub owner: AccountId,
    /// Rotation order.
    pub members: Vec<AccountId>,
    /// Must be 0; a definition cannot pre-seed rotation state.
    #[serde(default)]
    pub current_index: usize,
    pub deposit_amount: Amount,
    pub token: AssetId,
    /// Round length in seconds.
    pub deposit_interval: u64,
    pub circle_start: Timestamp,
    pub max_deposits: u64,
}

impl CircleDefinition {
    /// Check everything that does not depend on engine state, in order.
    ///
    /// Id uniqueness and the asset allowlist are checked by the engine before
    /// this runs.
    pub(crate) fn validate_structure(&self) -> Result<(), CircleError> {
        if self.deposit_interval == 0 {
            return Err(CircleError::ZeroDepositInterval);
        }
        if self.deposit_amount == 0 {
            return Err(CircleError::ZeroDepositAmount);
        }
        if self.members.len() < 2 {
            return Err(CircleError::TooFewMembers(self.members.len()));
        }
        for (position, member) in self.members.iter().enumerate() {
            if member.is_null() {
                return Err(CircleError::NullMember(position));
            }
            if self.members[..position].contains(member) {
                return Err(CircleError::DuplicateMember(member.clone()));
            }
        }
        if self.max_deposits == 0 {
            return Err(CircleError::ZeroMaxDeposits);
        }
        if self.circle_start.epoch_secs() <= 0 {
            return Err(CircleError::ZeroCircleStart);
        }
        if self.current_index != 0 {
            return Err(CircleError::NonZeroStartIndex(self.current_index));
        }
        if self.owner.is_null() {
            return Err(CircleError::NullOwner);
        }
        let members = self.members.len();
        let member_count = Amount::try_from(members).unwrap_or(Amount::MAX);
        if self.deposit_amount.checked_mul(member_count).is_none() {
            return Err(CircleError::PayoutOverflow {
                deposit_amount: self.deposit_amount,
                members,
            });
        }
        Ok(())
    }

    /// Reject a definition in which `custody` would own the circle or take
    /// part in rotation. Payouts to the custody account never leave it.
    pub(crate) fn check_reserved(&self, custody: &AccountId) -> Result<(), CircleError> {
        match self
            .members
            .iter()
            .chain(std::iter::once(&self.owner))
            .find(|a| *a == custody)
        {
            Some(account) => Err(CircleError::ReservedAccount(account.clone())),
            None => Ok(()),
        }
    }
}

/// A registered circle.
///
/// `current_index < members.len()` holds for every record in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub id: CircleId,
    pub name: String,
    pub owner: AccountId,
    pub members: Vec<AccountId>,
    pub current_index: usize,
    pub deposit_amount: Amount,
    pub token: AssetId,
    pub deposit_interval: u64,
    pub circle_start: Timestamp,
    pub max_deposits: u64,
}

/// Boundaries of the active round, in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundWindow {
    pub index: usize,
    /// Inclusive.
    pub opens_at: i64,
    /// Exclusive.
    pub closes_at: i64,
    /// No deposit is accepted at or after this instant.
    pub schedule_ends_at: i64,
}

impl Circle {
    pub(crate) fn from_definition(id: CircleId, def: CircleDefinition) -> Self {
        Self {
            id,
            name: def.name,
            owner: def.owner,
            members: def.members,
            current_index: 0,
            deposit_amount: def.deposit_amount,
            token: def.token,
            deposit_interval: def.deposit_interval,
            circle_start: def.circle_start,
            max_deposits: def.max_deposits,
        }
    }

    /// The member entitled to the current round's payout.
    pub fn current_beneficiary(&self) -> &AccountId {
        &self.members[self.current_index]
    }

    /// Total paid out when a round completes.
    pub fn round_payout(&self) -> Amount {
        let members = Amount::try_from(self.members.len()).unwrap_or(Amount::MAX);
        self.deposit_amount.saturating_mul(members)
    }

    /// Epoch second at which round `rounds` begins (equivalently, at which
    /// `rounds` full rounds have elapsed).
    fn boundary(&self, rounds: u128) -> i128 {
        let start = i128::from(self.circle_start.epoch_secs());
        let rounds = i128::try_from(rounds).unwrap_or(i128::MAX);
        start.saturating_add(i128::from(self.deposit_interval).saturating_mul(rounds))
    }

    pub(crate) fn round_opens_at(&self) -> i128 {
        self.boundary(self.current_index as u128)
    }

    pub(crate) fn round_closes_at(&self) -> i128 {
        self.boundary(self.current_index as u128 + 1)
    }

    pub(crate) fn schedule_ends_at(&self) -> i128 {
        self.boundary(u128::from(self.max_deposits))
    }

    pub fn round_window(&self) -> RoundWindow {
        RoundWindow {
            index: self.current_index,
            opens_at: clamp_secs(self.round_opens_at()),
            closes_at: clamp_secs(self.round_closes_at()),
            schedule_ends_at: clamp_secs(self.schedule_ends_at()),
        }
    }

    /// Whether `now` falls inside the active deposit window.
    pub(crate) fn check_deposit_window(&self, now: Timestamp) -> Result<(), DepositRejection> {
        let now = i128::from(now.epoch_secs());
        if now < self.round_opens_at() {
            return Err(DepositRejection::RoundNotOpen);
        }
        if now >= self.schedule_ends_at() {
            return Err(DepositRejection::ScheduleExhausted);
        }
        if now >= self.round_closes_at() {
            return Err(DepositRejection::RoundClosed);
        }
        Ok(())
    }

    /// Whether the current round has started.
    pub(crate) fn round_started(&self, now: Timestamp) -> bool {
        i128::from(now.epoch_secs()) >= self.round_opens_at()
    }

    /// Next rotation index, wrapping over the membership.
    pub(crate) fn next_index(&self) -> usize {
        (self.current_index + 1) % self.members.len()
    }
}

fn clamp_secs(secs: i128) -> i64 {
    i64::try_from(secs).unwrap_or(if secs < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: u64 = 7 * 24 * 60 * 60;
    const T0: i64 = 1_767_225_600; // 2026-01-01T00:00:00Z

    fn definition() -> CircleDefinition {
        CircleDefinition {
            name: "Harvest Circle".to_string(),
            owner: AccountId::new("owner"),
            members: vec![AccountId::new("ada"), AccountId::new("bob"), AccountId::new("cy")],
            current_index: 0,
            deposit_amount: 100,
            token: AssetId::new("USDC"),
            deposit_interval: WEEK,
            circle_start: Timestamp::from_epoch_secs(T0).unwrap(),
            max_deposits: 1000,
        }
    }

    fn circle() -> Circle {
        Circle::from_definition(CircleId::derive("Harvest Circle").unwrap(), definition())
    }

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_epoch_secs(secs).unwrap()
    }

    #[test]
    fn valid_definition_passes() {
        definition().validate_structure().unwrap();
    }

    #[test]
    fn zero_interval_rejected_before_zero_amount() {
        let mut def = definition();
        def.deposit_interval = 0;
        def.deposit_amount = 0;
        assert!(matches!(def.validate_structure(), Err(CircleError::ZeroDepositInterval)));
    }

    #[test]
    fn too_few_members_rejected() {
        let mut def = definition();
        def.members.truncate(1);
        assert!(matches!(def.validate_structure(), Err(CircleError::TooFewMembers(1))));
    }

    #[test]
    fn null_member_reports_position() {
        let mut def = definition();
        def.members[2] = AccountId::null();
        assert!(matches!(def.validate_structure(), Err(CircleError::NullMember(2))));
    }

    #[test]
    fn duplicate_member_rejected() {
        let mut def = definition();
        def.members[2] = AccountId::new("ada");
        match def.validate_structure() {
            Err(CircleError::DuplicateMember(m)) => assert_eq!(m.as_str(), "ada"),
            other => panic!("expected DuplicateMember, got {other:?}"),
        }
    }

    #[test]
    fn remaining_checks_in_order() {
        let mut def = definition();
        def.max_deposits = 0;
        def.current_index = 1;
        assert!(matches!(def.validate_structure(), Err(CircleError::ZeroMaxDeposits)));
        def.max_deposits = 1;
        def.circle_start = at(0);
        assert!(matches!(def.validate_structure(), Err(CircleError::ZeroCircleStart)));
        def.circle_start = at(T0);
        assert!(matches!(def.validate_structure(), Err(CircleError::NonZeroStartIndex(1))));
        def.current_index = 0;
        def.owner = AccountId::null();
        assert!(matches!(def.validate_structure(), Err(CircleError::NullOwner)));
    }

    #[test]
    fn payout_overflow_rejected() {
        let mut def = definition();
        def.deposit_amount = Amount::MAX / 2;
        assert!(matches!(def.validate_structure(), Err(CircleError::PayoutOverflow { .. })));
    }

    #[test]
    fn custody_account_cannot_join_or_own() {
        let vault = AccountId::new("vault");
        definition().check_reserved(&vault).unwrap();

        let mut def = definition();
        def.members.push(vault.clone());
        assert!(matches!(def.check_reserved(&vault), Err(CircleError::ReservedAccount(a)) if a == vault));

        let mut def = definition();
        def.owner = vault.clone();
        assert!(matches!(def.check_reserved(&vault), Err(CircleError::ReservedAccount(_))));
    }

    #[test]
    fn window_bounds_first_round() {
        let c = circle();
        let w = c.round_window();
        assert_eq!(w.index, 0);
        assert_eq!(w.opens_at, T0);
        assert_eq!(w.closes_at, T0 + WEEK as i64);
        assert_eq!(w.schedule_ends_at, T0 + 1000 * WEEK as i64);
    }

    #[test]
    fn deposit_window_is_half_open() {
        let c = circle();
        assert_eq!(c.check_deposit_window(at(T0 - 1)), Err(DepositRejection::RoundNotOpen));
        assert_eq!(c.check_deposit_window(at(T0)), Ok(()));
        assert_eq!(c.check_deposit_window(at(T0 + WEEK as i64 - 1)), Ok(()));
        assert_eq!(
            c.check_deposit_window(at(T0 + WEEK as i64)),
            Err(DepositRejection::RoundClosed)
        );
    }

    #[test]
    fn schedule_end_reported_once_exhausted() {
        let mut c = circle();
        c.max_deposits = 1;
        assert_eq!(
            c.check_deposit_window(at(T0 + WEEK as i64)),
            Err(DepositRejection::ScheduleExhausted)
        );
    }

    #[test]
    fn rotation_wraps() {
        let mut c = circle();
        assert_eq!(c.current_beneficiary().as_str(), "ada");
        c.current_index = c.next_index();
        c.current_index = c.next_index();
        assert_eq!(c.current_beneficiary().as_str(), "cy");
        assert_eq!(c.next_index(), 0);
    }

    #[test]
    fn huge_schedule_saturates() {
        let mut c = circle();
        c.deposit_interval = u64::MAX;
        c.max_deposits = u64::MAX;
        assert_eq!(c.round_window().schedule_ends_at, i64::MAX);
        assert_eq!(c.check_deposit_window(at(T0 + 1)), Ok(()));
    }

    #[test]
    fn round_payout_is_amount_times_members() {
        assert_eq!(circle().round_payout(), 300);
    }
}
