use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{BatchResult, BatchSummary, ScoringFailure};
use crate::workflows::roster::DoctorId;
use crate::workflows::scoring::{ScoreResult, ScoreView, Tier};
use crate::workflows::weights::WeightConfigId;

/// Published outcome of the latest recalculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingSnapshot {
    pub configuration_id: Option<WeightConfigId>,
    pub configuration_name: String,
    pub computed_at: DateTime<Utc>,
    /// Set when metrics changed after this snapshot was computed.
    pub stale: bool,
    pub results: Vec<ScoreResult>,
    pub failed: Vec<ScoringFailure>,
    pub summary: BatchSummary,
}

impl RankingSnapshot {
    pub fn from_batch(batch: BatchResult, configuration_name: impl Into<String>) -> Self {
        let summary = batch.summary();
        Self {
            configuration_id: batch.configuration_id,
            configuration_name: configuration_name.into(),
            computed_at: Utc::now(),
            stale: false,
            results: batch.scored,
            failed: batch.failed,
            summary,
        }
    }
}

/// Cache of derived standings. Only a recalculation replaces it; reads never
/// trigger one.
#[derive(Debug, Default)]
pub struct ScoreBoard {
    current: RwLock<Option<RankingSnapshot>>,
}

impl ScoreBoard {
    pub fn publish(&self, snapshot: RankingSnapshot) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(snapshot);
    }

    /// Flags the current standings as out of date.
    pub fn invalidate(&self) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(snapshot) = guard.as_mut() {
            snapshot.stale = true;
        }
    }

    pub fn snapshot(&self) -> Option<RankingSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn standings(&self) -> Vec<ScoreView> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|snapshot| snapshot.results.iter().map(ScoreResult::view).collect())
            .unwrap_or_default()
    }

    /// Tier of `id` in the latest standings, `Unscored` when it has no result.
    pub fn tier_of(&self, id: &DoctorId) -> Tier {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|snapshot| {
                snapshot
                    .results
                    .iter()
                    .find(|result| &result.doctor_id == id)
                    .map(|result| result.tier)
            })
            .unwrap_or(Tier::Unscored)
    }

    /// Entries scoring at least `min_score`, in rank order, at most `limit`.
    pub fn recommended(&self, min_score: f64, limit: usize) -> Vec<ScoreView> {
        self.standings()
            .into_iter()
            .filter(|view| view.composite_score >= min_score)
            .take(limit)
            .collect()
    }
}
