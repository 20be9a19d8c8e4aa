use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    WeightConfigDraft, WeightConfigId, WeightConfigRecord, WeightConfiguration, WeightLimits,
    WeightSnapshot,
};
use super::repository::{StoreError, WeightConfigStore};
use super::validation::{self, WeightCheck, WeightValidationError};

/// Enforces weight invariants in front of a [`WeightConfigStore`].
pub struct WeightConfigManager<S> {
    store: Arc<S>,
    limits: WeightLimits,
}

impl<S> WeightConfigManager<S>
where
    S: WeightConfigStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_limits(store, WeightLimits::default())
    }

    pub fn with_limits(store: Arc<S>, limits: WeightLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> &WeightLimits {
        &self.limits
    }

    pub fn validate(&self, weights: &WeightConfiguration) -> Result<(), WeightValidationError> {
        validation::validate(weights, &self.limits)
    }

    /// Dry validation that never touches the store.
    pub fn check(&self, weights: &WeightConfiguration) -> WeightCheck {
        validation::check(weights, &self.limits)
    }

    /// Validates then persists. Nothing is written when validation fails.
    pub fn save(&self, draft: WeightConfigDraft) -> Result<WeightConfigRecord, WeightConfigError> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(WeightConfigError::MissingName);
        }
        self.validate(&draft.weights)?;

        let draft = WeightConfigDraft { name, ..draft };
        let record = self.store.insert(draft.clone()).map_err(|error| match error {
            StoreError::Conflict => WeightConfigError::DuplicateName(draft.name.clone()),
            other => WeightConfigError::Store(other),
        })?;

        info!(
            config_id = %record.id,
            name = %record.name,
            active = record.is_default,
            "weight configuration saved"
        );
        Ok(record)
    }

    /// Replaces the weight vector of an existing configuration after re-validation.
    pub fn update_weights(
        &self,
        id: WeightConfigId,
        weights: WeightConfiguration,
    ) -> Result<WeightConfigRecord, WeightConfigError> {
        self.validate(&weights)?;
        self.store
            .replace_weights(id, weights)
            .map_err(|error| map_store_error(error, id))
    }

    /// Makes `id` the single active configuration.
    pub fn activate(&self, id: WeightConfigId) -> Result<WeightConfigRecord, WeightConfigError> {
        let record = self
            .store
            .activate_exclusive(id)
            .map_err(|error| map_store_error(error, id))?;
        info!(config_id = %id, name = %record.name, "weight configuration activated");
        Ok(record)
    }

    /// Active configuration, or the system default when none is flagged.
    /// Store failures propagate.
    pub fn try_active(&self) -> Result<WeightSnapshot, WeightConfigError> {
        let active = self.store.active().map_err(WeightConfigError::Store)?;
        Ok(active
            .as_ref()
            .map(WeightSnapshot::from)
            .unwrap_or_else(WeightSnapshot::system_default))
    }

    /// Read path that always yields a configuration.
    pub fn get_active(&self) -> WeightSnapshot {
        match self.try_active() {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%error, "falling back to system default weights");
                WeightSnapshot::system_default()
            }
        }
    }

    pub fn fetch(&self, id: WeightConfigId) -> Result<WeightConfigRecord, WeightConfigError> {
        self.store
            .fetch(id)
            .map_err(|error| map_store_error(error, id))?
            .ok_or(WeightConfigError::NotFound(id))
    }

    /// Active configuration first, then newest first.
    pub fn list(&self) -> Result<Vec<WeightConfigRecord>, WeightConfigError> {
        let mut records = self.store.list().map_err(WeightConfigError::Store)?;
        records.sort_by(|left, right| {
            right
                .is_default
                .cmp(&left.is_default)
                .then_with(|| right.created_at.cmp(&left.created_at))
                .then_with(|| right.id.cmp(&left.id))
        });
        Ok(records)
    }

    pub fn delete(&self, id: WeightConfigId) -> Result<(), WeightConfigError> {
        self.store
            .remove_inactive(id)
            .map_err(|error| map_store_error(error, id))?;
        info!(config_id = %id, "weight configuration deleted");
        Ok(())
    }
}

fn map_store_error(error: StoreError, id: WeightConfigId) -> WeightConfigError {
    match error {
        StoreError::NotFound => WeightConfigError::NotFound(id),
        StoreError::Active => WeightConfigError::ActiveConfiguration(id),
        other => WeightConfigError::Store(other),
    }
}

/// Error raised by the configuration manager.
#[derive(Debug, thiserror::Error)]
pub enum WeightConfigError {
    #[error(transparent)]
    Invalid(#[from] WeightValidationError),
    #[error("configuration name must not be blank")]
    MissingName,
    #[error("weight configuration {0} not found")]
    NotFound(WeightConfigId),
    #[error("weight configuration {0} is active and cannot be deleted")]
    ActiveConfiguration(WeightConfigId),
    #[error("a weight configuration named '{0}' already exists")]
    DuplicateName(String),
    #[error(transparent)]
    Store(StoreError),
}
