//! # Derive-Id Subcommand
//!
//! Prints the circle id a name maps to, so operators can look a circle up
//! before (or without) creating it.

use anyhow::{Context, Result};
use clap::Args;
use rosca_core::CircleId;

/// Arguments for the derive-id subcommand.
#[derive(Args, Debug)]
pub struct DeriveIdArgs {
    /// Circle name, exactly as it will be submitted at creation.
    pub name: String,
}

pub fn run_derive_id(args: &DeriveIdArgs) -> Result<u8> {
    let id = CircleId::derive(&args.name)
        .with_context(|| format!("failed to derive circle id for {:?}", args.name))?;
    tracing::debug!(name = %args.name, circle = %id, "derived circle id");
    println!("{}", id.digest().to_hex());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_id_succeeds() {
        let args = DeriveIdArgs {
            name: "Harvest Circle".to_string(),
        };
        assert_eq!(run_derive_id(&args).unwrap(), 0);
    }
}
