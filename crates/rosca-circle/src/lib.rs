//! # rosca-circle — Rotating Savings Circles
//!
//! A fixed group of members each contributes a fixed amount per round; each
//! round the pooled sum goes to one member, rotating through the membership.
//!
//! - **Engine** (`engine.rs`): The create/deposit/withdraw/decommission state
//!   machine and its queries. All operations are serialized under one lock.
//!
//! - **Circle** (`circle.rs`): Circle records, creation validation, and the
//!   round schedule arithmetic.
//!
//! - **Repositories** (`allowlist.rs`, `ledger.rs`, `membership.rs`,
//!   `registry.rs`): In-memory state owned by the engine. Private to the
//!   crate; every read and write goes through `CircleEngine`.
//!
//! - **Collaborators** (`custody.rs`, `capability.rs`, `events.rs`): The
//!   traits the engine calls out through, with in-memory implementations for
//!   tests and simulation.
//!
//! ## Crate Policy
//!
//! - Depends on `rosca-core` internally.
//! - Circle ids are content-addressed: `CircleId::derive(name)`.
//! - Events are emitted only after a mutation commits.

mod allowlist;
pub mod capability;
pub mod circle;
pub mod config;
pub mod custody;
pub mod engine;
pub mod error;
pub mod events;
mod ledger;
mod membership;
mod registry;

pub use capability::{AdminCapability, StaticAdmins};
pub use circle::{Circle, CircleDefinition, RoundWindow};
pub use config::{ConfigError, DecommissionPolicy, EngineConfig, DEFAULT_OVERDUE_GRACE_SECS};
pub use custody::{CustodyError, CustodyGateway, InMemoryCustody, Payout};
pub use engine::{BalanceSheet, CircleEngine, Collaborators};
pub use error::{CircleError, DepositRejection, ErrorKind};
pub use events::{CircleEvent, EventSink, MemorySink, TracingSink};
