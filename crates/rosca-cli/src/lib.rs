//! # rosca-cli — Rotating Savings Circle Command-Line Interface
//!
//! ## Subcommands
//!
//! - `derive-id` — Print the content-addressed id for a circle name
//! - `simulate` — Run a YAML scenario against in-memory custody and a manual
//!   clock, reporting each step and the emitted events as JSON
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handlers delegate to `rosca-circle`; no circle rules live here.
//! - `anyhow` is used only in this crate.

pub mod derive;
pub mod scenario;
pub mod simulate;
