//! # Asset Allowlist
//!
//! The set of payment assets a new circle may be denominated in. Checked only
//! at creation; removing an asset does not affect circles that already use it.

use std::collections::HashSet;

use rosca_core::AssetId;

#[derive(Debug, Default)]
pub struct AssetAllowlist {
    assets: HashSet<AssetId>,
}

impl AssetAllowlist {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set membership. Returns whether the stored value changed.
    pub fn set(&mut self, asset: &AssetId, allowed: bool) -> bool {
        if allowed {
            self.assets.insert(asset.clone())
        } else {
            self.assets.remove(asset)
        }
    }

    pub fn is_allowed(&self, asset: &AssetId) -> bool {
        self.assets.contains(asset)
    }
}
