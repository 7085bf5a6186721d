//! # Custody Gateway
//!
//! The engine never moves funds itself. It asks a [`CustodyGateway`] to pull
//! contributions into its custody account and to push payouts and refunds
//! out of it. Every call is synchronous; an `Err` means nothing moved.
//!
//! [`InMemoryCustody`] is a complete in-process gateway with per-account
//! balances and fault injection. Tests and the scenario simulator run on it.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use rosca_core::{AccountId, Amount, AssetId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transfer failure reported by a custody gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("{account} holds {available} {asset}, needs {needed}")]
    InsufficientFunds {
        account: AccountId,
        asset: AssetId,
        needed: Amount,
        available: Amount,
    },

    #[error("account {0} is blocked from transfers")]
    AccountBlocked(AccountId),

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// One leg of an outbound batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub to: AccountId,
    pub amount: Amount,
}

/// Synchronous transfer capability for payment assets.
pub trait CustodyGateway: Send + Sync {
    /// Move `amount` of `asset` from `from` into `to` (the engine's custody
    /// account).
    fn transfer_in(
        &self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError>;

    /// Move `amount` of `asset` out of custody to `to`.
    fn transfer_out(&self, asset: &AssetId, to: &AccountId, amount: Amount) -> Result<(), CustodyError>;

    /// Move several amounts out of custody as one unit.
    ///
    /// Implementations must be all-or-nothing: on `Err`, no leg has moved.
    fn transfer_out_batch(&self, asset: &AssetId, payouts: &[Payout]) -> Result<(), CustodyError>;
}

/// In-process custody with per-(asset, account) balances.
#[derive(Debug)]
pub struct InMemoryCustody {
    vault: AccountId,
    balances: Mutex<HashMap<(AssetId, AccountId), Amount>>,
    blocked: Mutex<HashSet<AccountId>>,
}

impl InMemoryCustody {
    /// Create a gateway whose custody account is `vault`.
    pub fn new(vault: AccountId) -> Self {
        Self {
            vault,
            balances: Mutex::new(HashMap::new()),
            blocked: Mutex::new(HashSet::new()),
        }
    }

    pub fn vault(&self) -> &AccountId {
        &self.vault
    }

    /// Credit `amount` to `account` out of thin air.
    pub fn mint(&self, asset: &AssetId, account: &AccountId, amount: Amount) -> Result<(), CustodyError> {
        let mut balances = self.balances.lock();
        let entry = balances.entry((asset.clone(), account.clone())).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Rejected(format!("mint overflows balance of {account}")))?;
        Ok(())
    }

    pub fn balance_of(&self, asset: &AssetId, account: &AccountId) -> Amount {
        self.balances
            .lock()
            .get(&(asset.clone(), account.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Make every transfer touching `account` fail.
    pub fn block(&self, account: &AccountId) {
        self.blocked.lock().insert(account.clone());
    }

    pub fn unblock(&self, account: &AccountId) {
        self.blocked.lock().remove(account);
    }

    fn check_not_blocked(&self, accounts: &[&AccountId]) -> Result<(), CustodyError> {
        let blocked = self.blocked.lock();
        match accounts.iter().find(|a| blocked.contains(**a)) {
            Some(a) => Err(CustodyError::AccountBlocked((*a).clone())),
            None => Ok(()),
        }
    }
}

/// Apply a set of debits and credits to `balances`, or none of them.
fn apply_moves(
    balances: &mut HashMap<(AssetId, AccountId), Amount>,
    asset: &AssetId,
    from: &AccountId,
    credits: &[Payout],
) -> Result<(), CustodyError> {
    let total = credits.iter().try_fold(0 as Amount, |acc, p| {
        acc.checked_add(p.amount)
            .ok_or_else(|| CustodyError::Rejected("batch total overflows".to_string()))
    })?;
    let available = balances.get(&(asset.clone(), from.clone())).copied().unwrap_or(0);
    if available < total {
        return Err(CustodyError::InsufficientFunds {
            account: from.clone(),
            asset: asset.clone(),
            needed: total,
            available,
        });
    }

    // Stage credits against a debited copy of the sender so that a leg
    // crediting the sender itself is accounted for.
    let mut staged: HashMap<AccountId, Amount> = HashMap::new();
    staged.insert(from.clone(), available - total);
    for p in credits {
        let current = match staged.get(&p.to) {
            Some(v) => *v,
            None => balances.get(&(asset.clone(), p.to.clone())).copied().unwrap_or(0),
        };
        let next = current
            .checked_add(p.amount)
            .ok_or_else(|| CustodyError::Rejected(format!("credit overflows balance of {}", p.to)))?;
        staged.insert(p.to.clone(), next);
    }

    for (account, amount) in staged {
        balances.insert((asset.clone(), account), amount);
    }
    Ok(())
}

impl CustodyGateway for InMemoryCustody {
    fn transfer_in(
        &self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        if from == to {
            return Err(CustodyError::Rejected(format!("transfer from {from} to itself")));
        }
        self.check_not_blocked(&[from, to])?;
        let leg = Payout {
            to: to.clone(),
            amount,
        };
        apply_moves(&mut self.balances.lock(), asset, from, std::slice::from_ref(&leg))
    }

    fn transfer_out(&self, asset: &AssetId, to: &AccountId, amount: Amount) -> Result<(), CustodyError> {
        if *to == self.vault {
            return Err(CustodyError::Rejected(format!("payout to custody account {to}")));
        }
        self.check_not_blocked(&[&self.vault, to])?;
        let leg = Payout {
            to: to.clone(),
            amount,
        };
        apply_moves(&mut self.balances.lock(), asset, &self.vault, std::slice::from_ref(&leg))
    }

    fn transfer_out_batch(&self, asset: &AssetId, payouts: &[Payout]) -> Result<(), CustodyError> {
        if let Some(leg) = payouts.iter().find(|p| p.to == self.vault) {
            return Err(CustodyError::Rejected(format!("payout to custody account {}", leg.to)));
        }
        let mut accounts: Vec<&AccountId> = payouts.iter().map(|p| &p.to).collect();
        accounts.push(&self.vault);
        self.check_not_blocked(&accounts)?;
        apply_moves(&mut self.balances.lock(), asset, &self.vault, payouts)
    }
}
