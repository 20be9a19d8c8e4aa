use super::domain::{DoctorId, DoctorRecord, MetricSet};

/// Storage abstraction for roster entries so workflows can run against any backend.
pub trait DoctorRepository: Send + Sync {
    fn fetch(&self, id: &DoctorId) -> Result<Option<DoctorRecord>, RepositoryError>;
    /// Every stored doctor, ordered by id.
    fn list(&self) -> Result<Vec<DoctorRecord>, RepositoryError>;
    /// Inserts or fully replaces the record with the same id.
    fn upsert(&self, record: DoctorRecord) -> Result<(), RepositoryError>;
    /// Inserts a new record, rejecting ids that already exist with `Conflict`.
    fn insert(&self, record: DoctorRecord) -> Result<(), RepositoryError>;
    /// Swaps the metric set of an existing doctor in one write.
    fn replace_metrics(
        &self,
        id: &DoctorId,
        metrics: MetricSet,
    ) -> Result<DoctorRecord, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
