use crate::package::Package;

/// The whole registry for one run, split by lifecycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryState {
    /// Records kept in the primary index
    pub active: Vec<Package>,
    /// Records relocated because their repository no longer exists
    pub deleted: Vec<Package>,
}

impl RegistryState {
    pub fn new(active: Vec<Package>, deleted: Vec<Package>) -> Self {
        Self { active, deleted }
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.deleted.is_empty()
    }
}
