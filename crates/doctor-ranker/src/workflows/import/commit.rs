use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::validation::ImportRecord;
use crate::workflows::roster::{DoctorId, DoctorRecord, DoctorRepository, RepositoryError};

/// Write semantics for committed rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Replace existing doctors with the same id, so a retried import converges.
    #[default]
    Upsert,
    /// Refuse ids that already exist, reporting each as a row failure.
    InsertOnly,
}

impl CommitMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "upsert" | "overwrite" => Some(Self::Upsert),
            "insert_only" | "insert" => Some(Self::InsertOnly),
            _ => None,
        }
    }
}

/// A valid row the repository refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitFailure {
    pub row: usize,
    pub doctor_id: DoctorId,
    pub reason: String,
}

/// Per-row outcome of a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    pub committed: Vec<DoctorId>,
    pub failures: Vec<CommitFailure>,
}

/// Writes the valid records in fixed-size batches. Rows inside one batch are
/// written concurrently, so at most `batch_size` writes are in flight.
/// Repository errors are collected per row and never abort the commit.
pub fn commit<D>(
    records: &[ImportRecord],
    repository: &D,
    batch_size: usize,
    mode: CommitMode,
) -> CommitOutcome
where
    D: DoctorRepository + ?Sized,
{
    let valid = records
        .iter()
        .filter_map(|entry| entry.record.as_ref().map(|record| (entry.row, record)))
        .collect::<Vec<_>>();

    let mut outcome = CommitOutcome::default();
    for (index, batch) in valid.chunks(batch_size.max(1)).enumerate() {
        let results = batch
            .par_iter()
            .map(|(row, record)| (*row, record.id.clone(), write(repository, record, mode)))
            .collect::<Vec<_>>();

        let mut failed = 0usize;
        for (row, doctor_id, result) in results {
            match result {
                Ok(()) => outcome.committed.push(doctor_id),
                Err(error) => {
                    failed += 1;
                    warn!(row, doctor_id = %doctor_id, %error, "import row not committed");
                    outcome.failures.push(CommitFailure {
                        row,
                        doctor_id,
                        reason: failure_reason(&error),
                    });
                }
            }
        }
        debug!(batch = index + 1, size = batch.len(), failed, "import batch committed");
    }

    outcome
}

fn write<D>(repository: &D, record: &DoctorRecord, mode: CommitMode) -> Result<(), RepositoryError>
where
    D: DoctorRepository + ?Sized,
{
    match mode {
        CommitMode::Upsert => repository.upsert(record.clone()),
        CommitMode::InsertOnly => repository.insert(record.clone()),
    }
}

fn failure_reason(error: &RepositoryError) -> String {
    match error {
        RepositoryError::Conflict => "doctor already exists".to_string(),
        other => other.to_string(),
    }
}
