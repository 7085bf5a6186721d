//! # Notifications
//!
//! Every committed mutation produces exactly one [`CircleEvent`]. Rolled-back
//! attempts produce none. The engine hands events to an [`EventSink`] while
//! still holding its operation lock, so sinks observe events in commit order.

use parking_lot::Mutex;
use rosca_core::{AccountId, Amount, AssetId, CircleId};
use serde::Serialize;

use crate::custody::Payout;

/// A committed state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CircleEvent {
    CircleCreated {
        circle: CircleId,
        creator: AccountId,
        members: Vec<AccountId>,
        asset: AssetId,
        deposit_amount: Amount,
        deposit_interval: u64,
    },
    DepositMade {
        circle: CircleId,
        payer: AccountId,
        beneficiary: AccountId,
        amount: Amount,
    },
    WithdrawalMade {
        circle: CircleId,
        beneficiary: AccountId,
        amount: Amount,
        /// Rotation index the payout was made for.
        round_index: usize,
    },
    CircleDecommissioned {
        circle: CircleId,
        caller: AccountId,
        refunds: Vec<Payout>,
    },
    AssetAllowlistChanged {
        asset: AssetId,
        caller: AccountId,
        allowed: bool,
    },
}

impl CircleEvent {
    /// Short name, as used in the serialized `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CircleCreated { .. } => "circle_created",
            Self::DepositMade { .. } => "deposit_made",
            Self::WithdrawalMade { .. } => "withdrawal_made",
            Self::CircleDecommissioned { .. } => "circle_decommissioned",
            Self::AssetAllowlistChanged { .. } => "asset_allowlist_changed",
        }
    }
}

/// Receives committed events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &CircleEvent);
}

/// Writes each event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &CircleEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => tracing::info!(event = event.name(), %payload, "circle event"),
            Err(e) => tracing::warn!(event = event.name(), error = %e, "circle event not serializable"),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<CircleEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far, oldest first.
    pub fn events(&self) -> Vec<CircleEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &CircleEvent) {
        self.events.lock().push(event.clone());
    }
}
