use super::domain::{WeightConfigDraft, WeightConfigId, WeightConfigRecord, WeightConfiguration};

/// Persistence seam for weight configurations.
///
/// Implementations must apply every method as a single atomic step. In
/// particular `insert` with `draft.is_default` set and `activate_exclusive`
/// must never leave zero or two configurations flagged as active.
pub trait WeightConfigStore: Send + Sync {
    /// Persists a validated draft. Names are unique across the store.
    fn insert(&self, draft: WeightConfigDraft) -> Result<WeightConfigRecord, StoreError>;
    fn replace_weights(
        &self,
        id: WeightConfigId,
        weights: WeightConfiguration,
    ) -> Result<WeightConfigRecord, StoreError>;
    fn fetch(&self, id: WeightConfigId) -> Result<Option<WeightConfigRecord>, StoreError>;
    fn list(&self) -> Result<Vec<WeightConfigRecord>, StoreError>;
    fn active(&self) -> Result<Option<WeightConfigRecord>, StoreError>;
    /// Flags `id` active and clears the flag on every other configuration.
    fn activate_exclusive(&self, id: WeightConfigId) -> Result<WeightConfigRecord, StoreError>;
    /// Deletes `id`, refusing with `Active` when it carries the active flag.
    fn remove_inactive(&self, id: WeightConfigId) -> Result<(), StoreError>;
}

/// Error enumeration for weight store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("configuration name already exists")]
    Conflict,
    #[error("configuration not found")]
    NotFound,
    #[error("configuration is active")]
    Active,
    #[error("weight store unavailable: {0}")]
    Unavailable(String),
}
