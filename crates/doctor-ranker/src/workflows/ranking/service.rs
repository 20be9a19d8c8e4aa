use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::info;

use crate::config::RankingConfig;
use crate::workflows::import::{
    CommitMode, CommitOptions, ImportError, ImportReport, ImportSession,
};
use crate::workflows::recalculation::{
    BatchSummary, RankingSnapshot, RecalculationOrchestrator, ScoreBoard, ScoringFailure,
};
use crate::workflows::roster::{DoctorId, DoctorRecord, DoctorRepository, MetricSet, RepositoryError};
use crate::workflows::scoring::{ScoreView, ScoringEngine, Tier, TierThresholds};
use crate::workflows::weights::{
    WeightConfigDraft, WeightConfigError, WeightConfigId, WeightConfigManager, WeightConfigRecord,
    WeightConfigStore, WeightConfiguration,
};

/// Service composing the roster, the weight manager and the standings cache.
///
/// Recalculations run one at a time: each reads the active configuration once,
/// scores the whole roster and publishes before the next may start.
pub struct RankingService<D, W> {
    doctors: Arc<D>,
    weights: WeightConfigManager<W>,
    orchestrator: RecalculationOrchestrator,
    board: ScoreBoard,
    import_batch_size: usize,
    recalculation_gate: Mutex<()>,
}

/// Returned by the recalculate trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculationReport {
    pub processed_count: usize,
    pub failed: Vec<ScoringFailure>,
    pub summary: BatchSummary,
}

/// Current standings plus the state of the cache behind them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standings {
    pub configuration_id: Option<WeightConfigId>,
    pub stale: bool,
    pub entries: Vec<ScoreView>,
}

/// Outcome of an import request. `recalculation` is present when rows were committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    #[serde(flatten)]
    pub report: ImportReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recalculation: Option<RecalculationReport>,
}

impl<D, W> RankingService<D, W>
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    pub fn new(doctors: Arc<D>, weights: Arc<W>, config: &RankingConfig) -> Self {
        let engine = ScoringEngine::new(config.policy());
        Self {
            doctors,
            weights: WeightConfigManager::new(weights),
            orchestrator: RecalculationOrchestrator::new(engine, config.parallel_threshold),
            board: ScoreBoard::default(),
            import_batch_size: config.import_batch_size,
            recalculation_gate: Mutex::new(()),
        }
    }

    pub fn weights(&self) -> &WeightConfigManager<W> {
        &self.weights
    }

    pub fn board(&self) -> &ScoreBoard {
        &self.board
    }

    pub fn thresholds(&self) -> TierThresholds {
        self.orchestrator.engine().policy().thresholds
    }

    /// Saves a configuration; saving one flagged as default counts as activation.
    pub fn save_configuration(
        &self,
        draft: WeightConfigDraft,
    ) -> Result<WeightConfigRecord, RankingServiceError> {
        let record = self.weights.save(draft)?;
        if record.is_default {
            self.recalculate()?;
        }
        Ok(record)
    }

    /// Replaces a configuration's weights; editing the active one rescores the roster.
    pub fn update_configuration(
        &self,
        id: WeightConfigId,
        weights: WeightConfiguration,
    ) -> Result<WeightConfigRecord, RankingServiceError> {
        let record = self.weights.update_weights(id, weights)?;
        if record.is_default {
            self.recalculate()?;
        }
        Ok(record)
    }

    pub fn activate(
        &self,
        id: WeightConfigId,
    ) -> Result<(WeightConfigRecord, RecalculationReport), RankingServiceError> {
        let record = self.weights.activate(id)?;
        let report = self.recalculate()?;
        Ok((record, report))
    }

    /// Rescores the whole roster under the active configuration.
    pub fn recalculate(&self) -> Result<RecalculationReport, RankingServiceError> {
        let _gate = self
            .recalculation_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let snapshot = self.weights.try_active()?;
        let doctors = self.doctors.list()?;
        let batch = self.orchestrator.recalculate_all(&doctors, &snapshot);
        let report = RecalculationReport {
            processed_count: batch.scored.len(),
            failed: batch.failed.clone(),
            summary: batch.summary(),
        };
        self.board
            .publish(RankingSnapshot::from_batch(batch, snapshot.name.clone()));

        info!(
            config = %snapshot.name,
            processed = report.processed_count,
            failed = report.failed.len(),
            "standings published"
        );
        Ok(report)
    }

    /// Validates and commits an import, then rescores when anything was written.
    pub fn import(&self, raw: &str, mode: CommitMode) -> Result<ImportResult, RankingServiceError> {
        let mut session = ImportSession::upload(raw);
        session.validate()?;
        let options = CommitOptions {
            batch_size: self.import_batch_size,
            mode,
        };
        let (report, outcome) = session.commit(self.doctors.as_ref(), options)?;
        let report = report.clone();

        let recalculation = if outcome.committed.is_empty() {
            None
        } else {
            Some(self.recalculate()?)
        };
        Ok(ImportResult {
            report,
            recalculation,
        })
    }

    /// Validation-only pass over an import payload.
    pub fn preview_import(&self, raw: &str) -> Result<ImportReport, RankingServiceError> {
        let mut session = ImportSession::upload(raw);
        Ok(session.validate()?.preview())
    }

    /// Replaces one doctor's metrics and marks the standings stale.
    pub fn update_metrics(
        &self,
        id: &DoctorId,
        metrics: MetricSet,
    ) -> Result<DoctorRecord, RankingServiceError> {
        let record = self.doctors.replace_metrics(id, metrics)?;
        self.board.invalidate();
        Ok(record)
    }

    pub fn doctor(&self, id: &DoctorId) -> Result<DoctorRecord, RankingServiceError> {
        let record = self.doctors.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn standings(&self) -> Standings {
        match self.board.snapshot() {
            Some(snapshot) => Standings {
                configuration_id: snapshot.configuration_id,
                stale: snapshot.stale,
                entries: snapshot.results.iter().map(|result| result.view()).collect(),
            },
            None => Standings {
                configuration_id: None,
                stale: false,
                entries: Vec::new(),
            },
        }
    }

    pub fn tier_of(&self, id: &DoctorId) -> Tier {
        self.board.tier_of(id)
    }

    pub fn recommended(&self, min_score: f64, limit: usize) -> Vec<ScoreView> {
        self.board.recommended(min_score, limit)
    }
}

/// Error raised by the ranking service.
#[derive(Debug, thiserror::Error)]
pub enum RankingServiceError {
    #[error(transparent)]
    Weights(#[from] WeightConfigError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Import(#[from] ImportError),
}
