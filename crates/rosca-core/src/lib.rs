//! # rosca-core — Foundational Types for ROSCA Circles
//!
//! This crate is the leaf of the workspace. It defines the primitives every
//! other crate builds on; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identities.** `AccountId`, `AssetId`, and
//!    `CircleId` are distinct types. You cannot pass an asset where an account
//!    is expected.
//!
//! 2. **Content-addressed circle ids.** A `CircleId` is the SHA-256 digest of
//!    the canonical (JCS) encoding of the circle's name. All digest input flows
//!    through `CanonicalBytes::new()`.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is UTC with seconds precision.
//!    Round windows are computed in whole epoch seconds.
//!
//! 4. **Time is injected.** Anything that needs "now" takes a [`Clock`]. Tests
//!    and simulations drive a [`ManualClock`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `rosca-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, CoreError};
pub use identity::{AccountId, Amount, AssetId, CircleId};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
