use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::workflows::roster::{DoctorId, DoctorRecord, DoctorRepository, MetricSet, RepositoryError};
use crate::workflows::weights::{
    StoreError, WeightConfigDraft, WeightConfigId, WeightConfigRecord, WeightConfigStore,
    WeightConfiguration,
};

/// Roster held in a mutex-guarded ordered map.
#[derive(Default)]
pub struct InMemoryDoctorRepository {
    records: Mutex<BTreeMap<DoctorId, DoctorRecord>>,
}

impl InMemoryDoctorRepository {
    pub fn with_records(records: impl IntoIterator<Item = DoctorRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: Mutex::new(map),
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, BTreeMap<DoctorId, DoctorRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("roster mutex poisoned".to_string()))
    }
}

impl DoctorRepository for InMemoryDoctorRepository {
    fn fetch(&self, id: &DoctorId) -> Result<Option<DoctorRecord>, RepositoryError> {
        Ok(self.guard()?.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<DoctorRecord>, RepositoryError> {
        Ok(self.guard()?.values().cloned().collect())
    }

    fn upsert(&self, record: DoctorRecord) -> Result<(), RepositoryError> {
        self.guard()?.insert(record.id.clone(), record);
        Ok(())
    }

    fn insert(&self, record: DoctorRecord) -> Result<(), RepositoryError> {
        let mut guard = self.guard()?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn replace_metrics(
        &self,
        id: &DoctorId,
        metrics: MetricSet,
    ) -> Result<DoctorRecord, RepositoryError> {
        let mut guard = self.guard()?;
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.metrics = metrics;
        Ok(record.clone())
    }
}

#[derive(Default)]
struct WeightState {
    last_id: u64,
    records: BTreeMap<WeightConfigId, WeightConfigRecord>,
}

impl WeightState {
    fn clear_active(&mut self) {
        for record in self.records.values_mut() {
            record.is_default = false;
        }
    }
}

/// Weight configurations behind one mutex, so every activation is a single
/// critical section.
#[derive(Default)]
pub struct InMemoryWeightStore {
    state: Mutex<WeightState>,
}

impl InMemoryWeightStore {
    fn guard(&self) -> Result<MutexGuard<'_, WeightState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("weight store mutex poisoned".to_string()))
    }
}

impl WeightConfigStore for InMemoryWeightStore {
    fn insert(&self, draft: WeightConfigDraft) -> Result<WeightConfigRecord, StoreError> {
        let mut state = self.guard()?;
        if state
            .records
            .values()
            .any(|record| record.name.eq_ignore_ascii_case(&draft.name))
        {
            return Err(StoreError::Conflict);
        }

        if draft.is_default {
            state.clear_active();
        }

        state.last_id += 1;
        let now = Utc::now();
        let record = WeightConfigRecord {
            id: WeightConfigId(state.last_id),
            name: draft.name,
            description: draft.description,
            weights: draft.weights,
            is_default: draft.is_default,
            created_at: now,
            updated_at: now,
        };
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    fn replace_weights(
        &self,
        id: WeightConfigId,
        weights: WeightConfiguration,
    ) -> Result<WeightConfigRecord, StoreError> {
        let mut state = self.guard()?;
        let record = state.records.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.weights = weights;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn fetch(&self, id: WeightConfigId) -> Result<Option<WeightConfigRecord>, StoreError> {
        Ok(self.guard()?.records.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<WeightConfigRecord>, StoreError> {
        Ok(self.guard()?.records.values().cloned().collect())
    }

    fn active(&self) -> Result<Option<WeightConfigRecord>, StoreError> {
        Ok(self
            .guard()?
            .records
            .values()
            .find(|record| record.is_default)
            .cloned())
    }

    fn activate_exclusive(&self, id: WeightConfigId) -> Result<WeightConfigRecord, StoreError> {
        let mut state = self.guard()?;
        if !state.records.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        state.clear_active();
        let record = state.records.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.is_default = true;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn remove_inactive(&self, id: WeightConfigId) -> Result<(), StoreError> {
        let mut state = self.guard()?;
        match state.records.get(&id) {
            None => Err(StoreError::NotFound),
            Some(record) if record.is_default => Err(StoreError::Active),
            Some(_) => {
                state.records.remove(&id);
                Ok(())
            }
        }
    }
}
