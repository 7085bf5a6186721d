//! Engine configuration.
//!
//! Defaults are the conservative policy: only the owner may decommission, and
//! a decommissioned circle's id is never reused. Override via environment
//! variables or explicit construction.

use rosca_core::AccountId;
use serde::{Deserialize, Serialize};

/// Default grace period for the overdue-member decommission policy: one day.
pub const DEFAULT_OVERDUE_GRACE_SECS: u64 = 86_400;

/// Who may decommission a circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum DecommissionPolicy {
    /// Only the circle owner.
    #[default]
    OwnerOnly,
    /// The owner, any administrator, or any member once the current round
    /// closed more than `grace_secs` ago without every member fully funded.
    OwnerOrOverdueMember { grace_secs: u64 },
}

/// Configuration for a [`CircleEngine`](crate::CircleEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Account that holds pooled contributions.
    pub custody_account: AccountId,
    pub decommission: DecommissionPolicy,
    /// Refuse to create a circle under an id that was decommissioned.
    pub retire_decommissioned_ids: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            custody_account: AccountId::new("rosca:custody"),
            decommission: DecommissionPolicy::OwnerOnly,
            retire_decommissioned_ids: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `ROSCA_CUSTODY_ACCOUNT` (default: `rosca:custody`)
    /// - `ROSCA_DECOMMISSION_POLICY`: `owner-only` (default) or `owner-or-overdue-member`
    /// - `ROSCA_OVERDUE_GRACE_SECS` (default: 86400)
    /// - `ROSCA_RETIRE_IDS`: `true` (default) or `false`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let custody_account = match lookup("ROSCA_CUSTODY_ACCOUNT") {
            Some(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::Invalid("ROSCA_CUSTODY_ACCOUNT".to_string(), raw))
            }
            Some(raw) => AccountId::new(raw.trim()),
            None => defaults.custody_account,
        };

        let grace_secs = match lookup("ROSCA_OVERDUE_GRACE_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("ROSCA_OVERDUE_GRACE_SECS".to_string(), raw))?,
            None => DEFAULT_OVERDUE_GRACE_SECS,
        };

        let decommission = match lookup("ROSCA_DECOMMISSION_POLICY").as_deref().map(str::trim) {
            None | Some("owner-only") => DecommissionPolicy::OwnerOnly,
            Some("owner-or-overdue-member") => DecommissionPolicy::OwnerOrOverdueMember { grace_secs },
            Some(other) => {
                return Err(ConfigError::Invalid(
                    "ROSCA_DECOMMISSION_POLICY".to_string(),
                    other.to_string(),
                ))
            }
        };

        let retire_decommissioned_ids = match lookup("ROSCA_RETIRE_IDS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("ROSCA_RETIRE_IDS".to_string(), raw))?,
            None => defaults.retire_decommissioned_ids,
        };

        Ok(Self {
            custody_account,
            decommission,
            retire_decommissioned_ids,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1:?}")]
    Invalid(String, String),
}
