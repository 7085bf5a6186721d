//! # Simulation Scenarios
//!
//! YAML description of one circle's life: who holds what, the circle to
//! create, and an ordered list of steps with their expected outcome.
//!
//! ```yaml
//! start: 2026-01-01T00:00:00Z
//! admins: [root]
//! assets: [USDC]
//! balances:
//!   - { account: ada, asset: USDC, amount: 1000 }
//! circle:
//!   name: Harvest Circle
//!   owner: owner
//!   members: [ada, bob]
//!   deposit_amount: 100
//!   token: USDC
//!   deposit_interval: 604800
//!   circle_start: 2026-01-01T00:00:00Z
//!   max_deposits: 12
//! steps:
//!   - deposit: { payer: ada, amount: 100 }
//!   - advance: { secs: 604800 }
//!   - withdraw: { caller: ada, expect: error }
//! ```
//!
//! Amounts are `u64` in the file and widened on load.

use rosca_circle::{CircleDefinition, EngineConfig};
use rosca_core::{AccountId, Amount, AssetId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Engine configuration. Read from the environment when absent.
    #[serde(default)]
    pub config: Option<EngineConfig>,
    /// Initial clock reading. Defaults to the circle's start.
    #[serde(default)]
    pub start: Option<Timestamp>,
    #[serde(default)]
    pub admins: Vec<AccountId>,
    /// Assets the first admin allowlists before the circle is created.
    #[serde(default)]
    pub assets: Vec<AssetId>,
    #[serde(default)]
    pub balances: Vec<Holding>,
    pub circle: CircleSpec,
    /// Each step is a single-key map (`- deposit: {...}`), not a YAML tag.
    #[serde(
        default,
        deserialize_with = "serde_yaml::with::singleton_map_recursive::deserialize"
    )]
    pub steps: Vec<Step>,
}

/// Funds minted into an account before the run.
#[derive(Debug, Clone, Deserialize)]
pub struct Holding {
    pub account: AccountId,
    pub asset: AssetId,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CircleSpec {
    pub name: String,
    pub owner: AccountId,
    pub members: Vec<AccountId>,
    pub deposit_amount: u64,
    pub token: AssetId,
    pub deposit_interval: u64,
    pub circle_start: Timestamp,
    pub max_deposits: u64,
}

impl CircleSpec {
    pub fn to_definition(&self) -> CircleDefinition {
        CircleDefinition {
            name: self.name.clone(),
            owner: self.owner.clone(),
            members: self.members.clone(),
            current_index: 0,
            deposit_amount: Amount::from(self.deposit_amount),
            token: self.token.clone(),
            deposit_interval: self.deposit_interval,
            circle_start: self.circle_start,
            max_deposits: self.max_deposits,
        }
    }
}

/// Whether a step is supposed to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expectation {
    #[default]
    Ok,
    Error,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Move the manual clock forward.
    Advance { secs: u64 },
    Deposit {
        payer: AccountId,
        /// Defaults to `payer`.
        #[serde(default)]
        beneficiary: Option<AccountId>,
        amount: u64,
        #[serde(default)]
        expect: Expectation,
    },
    Withdraw {
        caller: AccountId,
        #[serde(default)]
        expect: Expectation,
    },
    Decommission {
        caller: AccountId,
        #[serde(default)]
        expect: Expectation,
    },
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Advance { .. } => "advance",
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
            Self::Decommission { .. } => "decommission",
        }
    }

    pub fn expectation(&self) -> Expectation {
        match self {
            Self::Advance { .. } => Expectation::Ok,
            Self::Deposit { expect, .. }
            | Self::Withdraw { expect, .. }
            | Self::Decommission { expect, .. } => *expect,
        }
    }
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}
