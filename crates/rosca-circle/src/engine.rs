//! # Circle Engine
//!
//! The circle lifecycle state machine:
//!
//! ```text
//! Nonexistent --create--> Active(0)
//! Active(i)   --withdraw [all funded, round started, caller = members[i]]--> Active((i+1) mod N)
//! Active(i)   --decommission [authorized]--> Decommissioned (record removed)
//! ```
//!
//! ## Atomicity
//!
//! Every operation runs inside a [`Session`]: one global exclusive lock over
//! all four repositories, taken at entry and released by `Drop` on every exit
//! path. Custody transfers are made while the session is held. Mutations are
//! staged and committed only after the transfer reports success, so a failed
//! transfer leaves no trace in the ledger, the registry, or the event stream.
//!
//! ## Reentrancy
//!
//! A collaborator (custody gateway, event sink, admin capability) that calls
//! back into the engine from inside an operation gets
//! [`CircleError::ReentrantCall`] instead of a deadlock or a view of
//! half-applied state.
//!
//! ## Time
//!
//! The clock is sampled once per operation, after the session is acquired.
//! Nothing runs in the background; rounds advance only when `withdraw` is
//! called.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::thread::ThreadId;

use parking_lot::{Mutex, MutexGuard};
use rosca_core::{AccountId, Amount, AssetId, CircleId, Clock, Timestamp};
use serde::Serialize;

use crate::allowlist::AssetAllowlist;
use crate::capability::AdminCapability;
use crate::circle::{Circle, CircleDefinition, RoundWindow};
use crate::config::{DecommissionPolicy, EngineConfig};
use crate::custody::{CustodyGateway, Payout};
use crate::error::{CircleError, DepositRejection};
use crate::events::{CircleEvent, EventSink};
use crate::ledger::BalanceLedger;
use crate::membership::MembershipIndex;
use crate::registry::CircleRegistry;

/// External capabilities the engine depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub custody: Arc<dyn CustodyGateway>,
    pub admin: Arc<dyn AdminCapability>,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn EventSink>,
}

/// Current-round balances of a circle, parallel to its member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSheet {
    pub members: Vec<AccountId>,
    pub balances: Vec<Amount>,
}

impl BalanceSheet {
    pub fn balance_of(&self, member: &AccountId) -> Option<Amount> {
        self.members
            .iter()
            .position(|m| m == member)
            .and_then(|i| self.balances.get(i).copied())
    }

    pub fn total(&self) -> Amount {
        self.balances.iter().fold(0, |acc, b| acc.saturating_add(*b))
    }
}

/// The four repositories. Only reachable through a [`Session`].
#[derive(Debug, Default)]
struct CircleBook {
    allowlist: AssetAllowlist,
    ledger: BalanceLedger,
    membership: MembershipIndex,
    registry: CircleRegistry,
}

impl CircleBook {
    fn circle(&self, id: &CircleId) -> Result<&Circle, CircleError> {
        self.registry.get(id).ok_or(CircleError::CircleNotFound(*id))
    }

    fn all_funded(&self, circle: &Circle) -> bool {
        self.ledger
            .all_funded(&circle.id, &circle.members, circle.deposit_amount)
    }

    fn is_withdrawable(&self, circle: &Circle, now: Timestamp) -> bool {
        circle.round_started(now) && self.all_funded(circle)
    }
}

/// Exclusive access to the book for the duration of one operation.
struct Session<'a> {
    book: MutexGuard<'a, CircleBook>,
    holder: &'a Mutex<Option<ThreadId>>,
}

impl Deref for Session<'_> {
    type Target = CircleBook;

    fn deref(&self) -> &CircleBook {
        &self.book
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut CircleBook {
        &mut self.book
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        // Cleared before `book` is released, so the next holder never sees a
        // stale thread id.
        *self.holder.lock() = None;
    }
}

/// Rotating savings circle engine.
pub struct CircleEngine {
    config: EngineConfig,
    book: Mutex<CircleBook>,
    holder: Mutex<Option<ThreadId>>,
    custody: Arc<dyn CustodyGateway>,
    admin: Arc<dyn AdminCapability>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for CircleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircleEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CircleEngine {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            book: Mutex::new(CircleBook::default()),
            holder: Mutex::new(None),
            custody: collaborators.custody,
            admin: collaborators.admin,
            clock: collaborators.clock,
            events: collaborators.events,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn session(&self) -> Result<Session<'_>, CircleError> {
        let me = std::thread::current().id();
        if *self.holder.lock() == Some(me) {
            tracing::warn!("reentrant circle operation rejected");
            return Err(CircleError::ReentrantCall);
        }
        let book = self.book.lock();
        *self.holder.lock() = Some(me);
        Ok(Session {
            book,
            holder: &self.holder,
        })
    }

    // ── Asset allowlist ─────────────────────────────────────────────

    /// Allow or disallow `asset` for new circles. Requires the administrative
    /// capability. Emits a notification even when the value is unchanged.
    pub fn set_allowed(&self, caller: &AccountId, asset: &AssetId, allowed: bool) -> Result<(), CircleError> {
        let mut session = self.session()?;
        if !self.admin.is_admin(caller) {
            return Err(CircleError::NotAdmin(caller.clone()));
        }
        let changed = session.allowlist.set(asset, allowed);
        tracing::info!(asset = %asset, caller = %caller, allowed, changed, "asset allowlist updated");
        self.events.emit(&CircleEvent::AssetAllowlistChanged {
            asset: asset.clone(),
            caller: caller.clone(),
            allowed,
        });
        Ok(())
    }

    pub fn is_allowed(&self, asset: &AssetId) -> Result<bool, CircleError> {
        let session = self.session()?;
        Ok(session.allowlist.is_allowed(asset))
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Register a new circle. The whole definition is validated before
    /// anything is written.
    pub fn create(&self, creator: &AccountId, definition: CircleDefinition) -> Result<CircleId, CircleError> {
        let id = CircleId::derive(&definition.name)?;
        let mut session = self.session()?;

        if session.registry.contains(&id) {
            return Err(CircleError::DuplicateCircle(id));
        }
        if self.config.retire_decommissioned_ids && session.registry.is_retired(&id) {
            return Err(CircleError::RetiredCircleId(id));
        }
        if !session.allowlist.is_allowed(&definition.token) {
            return Err(CircleError::AssetNotAllowed(definition.token.clone()));
        }
        definition.validate_structure()?;
        definition.check_reserved(&self.config.custody_account)?;

        let circle = Circle::from_definition(id, definition);
        let event = CircleEvent::CircleCreated {
            circle: id,
            creator: creator.clone(),
            members: circle.members.clone(),
            asset: circle.token.clone(),
            deposit_amount: circle.deposit_amount,
            deposit_interval: circle.deposit_interval,
        };
        session.membership.enroll(id, &circle.members);
        session.registry.insert(circle);

        tracing::info!(circle = %id, creator = %creator, "circle created");
        self.events.emit(&event);
        Ok(id)
    }

    /// Credit `amount` to `beneficiary` for the current round, pulling the
    /// funds from `payer`. Returns the beneficiary's new balance.
    pub fn deposit(
        &self,
        id: &CircleId,
        amount: Amount,
        payer: &AccountId,
        beneficiary: &AccountId,
    ) -> Result<Amount, CircleError> {
        let mut session = self.session()?;
        let now = self.clock.now();
        let circle = session.circle(id)?.clone();

        if !session.membership.is_member(id, beneficiary) {
            return Err(CircleError::NotMember {
                circle: *id,
                member: beneficiary.clone(),
            });
        }
        let reject = |reason| CircleError::InvalidDeposit {
            circle: *id,
            amount,
            reason,
        };
        if amount == 0 {
            return Err(reject(DepositRejection::ZeroAmount));
        }
        if *payer == self.config.custody_account {
            return Err(reject(DepositRejection::CustodyPayer));
        }
        circle.check_deposit_window(now).map_err(reject)?;
        let next = session
            .ledger
            .credited(id, beneficiary, amount, circle.deposit_amount)
            .ok_or_else(|| reject(DepositRejection::ExceedsDepositAmount))?;

        if let Err(e) = self
            .custody
            .transfer_in(&circle.token, payer, &self.config.custody_account, amount)
        {
            tracing::warn!(circle = %id, payer = %payer, amount = %amount, error = %e, "deposit transfer failed; nothing credited");
            return Err(e.into());
        }

        session.ledger.set(*id, beneficiary, next);
        tracing::info!(
            circle = %id,
            payer = %payer,
            beneficiary = %beneficiary,
            amount = %amount,
            balance = %next,
            "deposit credited"
        );
        self.events.emit(&CircleEvent::DepositMade {
            circle: *id,
            payer: payer.clone(),
            beneficiary: beneficiary.clone(),
            amount,
        });
        Ok(next)
    }

    /// Pay the pooled round to the current beneficiary and rotate. Returns the
    /// amount paid.
    ///
    /// Fails with [`CircleError::NotWithdrawable`] both when the round is not
    /// complete and when `caller` is not the beneficiary; the two are not
    /// distinguished.
    pub fn withdraw(&self, id: &CircleId, caller: &AccountId) -> Result<Amount, CircleError> {
        let mut session = self.session()?;
        let now = self.clock.now();
        let circle = session.circle(id)?.clone();

        let eligible = session.is_withdrawable(&circle, now);
        if !eligible || caller != circle.current_beneficiary() {
            tracing::debug!(circle = %id, caller = %caller, eligible, "withdrawal refused");
            return Err(CircleError::NotWithdrawable(*id));
        }

        let payout = circle.round_payout();
        let next_index = circle.next_index();

        if let Err(e) = self.custody.transfer_out(&circle.token, caller, payout) {
            tracing::warn!(circle = %id, beneficiary = %caller, amount = %payout, error = %e, "payout transfer failed; round left intact");
            return Err(e.into());
        }

        session.ledger.reset(id, &circle.members);
        let advanced = session.registry.set_index(id, next_index);
        debug_assert!(advanced, "next rotation index out of range");

        tracing::info!(
            circle = %id,
            beneficiary = %caller,
            amount = %payout,
            round_index = circle.current_index,
            next_index,
            "round paid out"
        );
        self.events.emit(&CircleEvent::WithdrawalMade {
            circle: *id,
            beneficiary: caller.clone(),
            amount: payout,
            round_index: circle.current_index,
        });
        Ok(payout)
    }

    /// Refund every outstanding balance and remove the circle. Returns the
    /// refunds issued, in rotation order.
    pub fn decommission(&self, id: &CircleId, caller: &AccountId) -> Result<Vec<Payout>, CircleError> {
        let mut session = self.session()?;
        let now = self.clock.now();
        let circle = session.circle(id)?.clone();

        self.authorize_decommission(&session, &circle, caller, now)?;

        let refunds = session.ledger.outstanding(id, &circle.members);
        if !refunds.is_empty() {
            if let Err(e) = self.custody.transfer_out_batch(&circle.token, &refunds) {
                tracing::warn!(circle = %id, caller = %caller, legs = refunds.len(), error = %e, "refund batch failed; circle left intact");
                return Err(e.into());
            }
        }

        session.ledger.reset(id, &circle.members);
        session.membership.purge(id, &circle.members);
        session
            .registry
            .remove(id, self.config.retire_decommissioned_ids);

        tracing::info!(circle = %id, caller = %caller, refunds = refunds.len(), "circle decommissioned");
        self.events.emit(&CircleEvent::CircleDecommissioned {
            circle: *id,
            caller: caller.clone(),
            refunds: refunds.clone(),
        });
        Ok(refunds)
    }

    fn authorize_decommission(
        &self,
        book: &CircleBook,
        circle: &Circle,
        caller: &AccountId,
        now: Timestamp,
    ) -> Result<(), CircleError> {
        if *caller == circle.owner {
            return Ok(());
        }
        let not_owner = || CircleError::NotOwner {
            circle: circle.id,
            caller: caller.clone(),
        };
        match self.config.decommission {
            DecommissionPolicy::OwnerOnly => Err(not_owner()),
            DecommissionPolicy::OwnerOrOverdueMember { grace_secs } => {
                if self.admin.is_admin(caller) {
                    return Ok(());
                }
                if !book.membership.is_member(&circle.id, caller) {
                    return Err(not_owner());
                }
                let overdue_at = circle
                    .round_closes_at()
                    .saturating_add(i128::from(grace_secs));
                let overdue = i128::from(now.epoch_secs()) >= overdue_at;
                if overdue && !book.all_funded(circle) {
                    tracing::info!(circle = %circle.id, caller = %caller, "member forcing decommission of overdue round");
                    Ok(())
                } else {
                    Err(CircleError::DecommissionNotEligible {
                        circle: circle.id,
                        caller: caller.clone(),
                    })
                }
            }
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn get_circle(&self, id: &CircleId) -> Result<Circle, CircleError> {
        let session = self.session()?;
        session.circle(id).cloned()
    }

    pub fn get_members(&self, id: &CircleId) -> Result<Vec<AccountId>, CircleError> {
        let session = self.session()?;
        Ok(session.circle(id)?.members.clone())
    }

    pub fn get_balances(&self, id: &CircleId) -> Result<BalanceSheet, CircleError> {
        let session = self.session()?;
        let circle = session.circle(id)?;
        Ok(BalanceSheet {
            members: circle.members.clone(),
            balances: session.ledger.balances(id, &circle.members),
        })
    }

    /// Whether the current round can be paid out now.
    pub fn is_withdrawable(&self, id: &CircleId) -> Result<bool, CircleError> {
        let session = self.session()?;
        let now = self.clock.now();
        let circle = session.circle(id)?;
        Ok(session.is_withdrawable(circle, now))
    }

    /// Whether `member` could withdraw right now.
    pub fn is_withdrawable_by(&self, id: &CircleId, member: &AccountId) -> Result<bool, CircleError> {
        let session = self.session()?;
        let now = self.clock.now();
        let circle = session.circle(id)?;
        if !session.membership.is_member(id, member) {
            return Err(CircleError::NotMember {
                circle: *id,
                member: member.clone(),
            });
        }
        Ok(session.is_withdrawable(circle, now) && circle.current_beneficiary() == member)
    }

    pub fn current_beneficiary(&self, id: &CircleId) -> Result<AccountId, CircleError> {
        let session = self.session()?;
        Ok(session.circle(id)?.current_beneficiary().clone())
    }

    pub fn round_window(&self, id: &CircleId) -> Result<RoundWindow, CircleError> {
        let session = self.session()?;
        Ok(session.circle(id)?.round_window())
    }
}
