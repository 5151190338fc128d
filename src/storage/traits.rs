use anyhow::Result;

use super::RegistryState;
use crate::package::Package;

/// Durable home of the package index
pub trait RegistryStore {
    /// Read the primary index. Errors if it does not exist.
    fn load_active(&self) -> Result<Vec<Package>>;

    /// Read the index of deleted packages.
    /// Returns an empty list if none exists yet.
    fn load_deleted(&self) -> Result<Vec<Package>>;

    /// Read both lists.
    fn load(&self) -> Result<RegistryState> {
        Ok(RegistryState::new(self.load_active()?, self.load_deleted()?))
    }

    /// Replace both lists.
    /// Implementations must never leave a partially written file behind.
    fn save(&self, state: &RegistryState) -> Result<()>;
}
