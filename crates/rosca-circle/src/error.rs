//! # Circle Error Types
//!
//! One variant per rejection reason. Callers branch on the variant; the
//! [`ErrorKind`] classifier groups them for retry decisions:
//!
//! - **Validation**: the circle definition is malformed. Retrying with the
//!   same input always fails.
//! - **State**: a precondition does not hold right now (wrong round, wrong
//!   caller, unknown circle). May succeed later.
//! - **Custody**: the external transfer failed. The operation was rolled back.

use rosca_core::{AccountId, Amount, AssetId, CanonicalizationError, CircleId};
use thiserror::Error;

use crate::custody::CustodyError;

/// Coarse classification of a [`CircleError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    State,
    Custody,
}

/// Why a deposit was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepositRejection {
    /// `now` is before the current round opens.
    RoundNotOpen,
    /// `now` is at or past the current round's closing boundary.
    RoundClosed,
    /// `now` is at or past the end of the `max_deposits` schedule.
    ScheduleExhausted,
    /// The credited balance would exceed the deposit amount.
    ExceedsDepositAmount,
    ZeroAmount,
    /// The payer is the engine's own custody account.
    CustodyPayer,
}

impl std::fmt::Display for DepositRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RoundNotOpen => "round not open yet",
            Self::RoundClosed => "round window closed",
            Self::ScheduleExhausted => "deposit schedule exhausted",
            Self::ExceedsDepositAmount => "balance would exceed deposit amount",
            Self::ZeroAmount => "zero amount",
            Self::CustodyPayer => "payer is the custody account",
        };
        f.write_str(s)
    }
}

/// Errors arising from circle operations.
#[derive(Error, Debug)]
pub enum CircleError {
    // ── Validation ──────────────────────────────────────────────────
    #[error("circle {0} is already registered")]
    DuplicateCircle(CircleId),

    #[error("circle id {0} belonged to a decommissioned circle and cannot be reused")]
    RetiredCircleId(CircleId),

    #[error("asset {0} is not allowlisted")]
    AssetNotAllowed(AssetId),

    #[error("deposit interval must be nonzero")]
    ZeroDepositInterval,

    #[error("deposit amount must be nonzero")]
    ZeroDepositAmount,

    #[error("a circle needs at least 2 members, got {0}")]
    TooFewMembers(usize),

    #[error("member at position {0} is the null identity")]
    NullMember(usize),

    #[error("member {0} appears more than once")]
    DuplicateMember(AccountId),

    #[error("max deposits must be nonzero")]
    ZeroMaxDeposits,

    #[error("circle start must be nonzero")]
    ZeroCircleStart,

    #[error("rotation must start at index 0, got {0}")]
    NonZeroStartIndex(usize),

    #[error("owner is the null identity")]
    NullOwner,

    #[error("round payout of {deposit_amount} x {members} members overflows")]
    PayoutOverflow {
        deposit_amount: Amount,
        members: usize,
    },

    #[error("{0} is the custody account and cannot own or join a circle")]
    ReservedAccount(AccountId),

    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    // ── State ───────────────────────────────────────────────────────
    #[error("circle {0} not found")]
    CircleNotFound(CircleId),

    #[error("{member} is not a member of circle {circle}")]
    NotMember { circle: CircleId, member: AccountId },

    #[error("invalid deposit of {amount} to circle {circle}: {reason}")]
    InvalidDeposit {
        circle: CircleId,
        amount: Amount,
        reason: DepositRejection,
    },

    #[error("circle {0} is not withdrawable by this caller at this time")]
    NotWithdrawable(CircleId),

    #[error("{caller} is not the owner of circle {circle}")]
    NotOwner { circle: CircleId, caller: AccountId },

    #[error("{caller} may not decommission circle {circle}: round is not sufficiently overdue")]
    DecommissionNotEligible { circle: CircleId, caller: AccountId },

    #[error("{0} does not hold the administrative capability")]
    NotAdmin(AccountId),

    #[error("reentrant call rejected while another circle operation is in progress on this thread")]
    ReentrantCall,

    // ── Custody ─────────────────────────────────────────────────────
    #[error("custody transfer failed: {0}")]
    Custody(#[from] CustodyError),
}

impl CircleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateCircle(_)
            | Self::RetiredCircleId(_)
            | Self::AssetNotAllowed(_)
            | Self::ZeroDepositInterval
            | Self::ZeroDepositAmount
            | Self::TooFewMembers(_)
            | Self::NullMember(_)
            | Self::DuplicateMember(_)
            | Self::ZeroMaxDeposits
            | Self::ZeroCircleStart
            | Self::NonZeroStartIndex(_)
            | Self::NullOwner
            | Self::PayoutOverflow { .. }
            | Self::ReservedAccount(_)
            | Self::Canonicalization(_) => ErrorKind::Validation,
            Self::CircleNotFound(_)
            | Self::NotMember { .. }
            | Self::InvalidDeposit { .. }
            | Self::NotWithdrawable(_)
            | Self::NotOwner { .. }
            | Self::DecommissionNotEligible { .. }
            | Self::NotAdmin(_)
            | Self::ReentrantCall => ErrorKind::State,
            Self::Custody(_) => ErrorKind::Custody,
        }
    }

    /// Whether the same call may succeed later without changing its input.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::State
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> CircleId {
        CircleId::derive("errors").unwrap()
    }

    #[test]
    fn validation_errors_are_not_retryable() {
        let err = CircleError::ZeroDepositAmount;
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!err.is_retryable());
        assert_eq!(CircleError::DuplicateCircle(id()).kind(), ErrorKind::Validation);
    }

    #[test]
    fn state_errors_are_retryable() {
        let err = CircleError::InvalidDeposit {
            circle: id(),
            amount: 5,
            reason: DepositRejection::RoundNotOpen,
        };
        assert_eq!(err.kind(), ErrorKind::State);
        assert!(err.is_retryable());
        assert!(CircleError::ReentrantCall.is_retryable());
    }

    #[test]
    fn custody_errors_classified() {
        let err: CircleError = CustodyError::AccountBlocked(AccountId::new("ada")).into();
        assert_eq!(err.kind(), ErrorKind::Custody);
        assert!(!err.is_retryable());
    }

    #[test]
    fn invalid_deposit_display_carries_reason() {
        let err = CircleError::InvalidDeposit {
            circle: id(),
            amount: 1,
            reason: DepositRejection::ExceedsDepositAmount,
        };
        let msg = err.to_string();
        assert!(msg.contains("exceed deposit amount"));
        assert!(msg.contains("circle:"));
    }

    #[test]
    fn not_owner_display() {
        let err = CircleError::NotOwner {
            circle: id(),
            caller: AccountId::new("mallory"),
        };
        assert!(err.to_string().contains("mallory"));
    }
}
