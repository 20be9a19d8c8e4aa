//! Whole-population recalculation under one configuration snapshot.

mod board;

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::workflows::roster::{DoctorId, DoctorRecord};
use crate::workflows::scoring::{
    standings, AccountClass, PopulationRange, ScoreInput, ScoreResult, ScoringEngine, Tier,
};
use crate::workflows::weights::{ComponentKind, WeightConfigId, WeightSnapshot};

pub use board::{RankingSnapshot, ScoreBoard};

/// A doctor left out of a batch, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringFailure {
    pub doctor_id: DoctorId,
    pub reason: String,
}

/// Ranked results plus the doctors that could not be scored.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub configuration_id: Option<WeightConfigId>,
    pub scored: Vec<ScoreResult>,
    pub failed: Vec<ScoringFailure>,
}

impl BatchResult {
    pub fn failed_ids(&self) -> Vec<DoctorId> {
        self.failed
            .iter()
            .map(|failure| failure.doctor_id.clone())
            .collect()
    }

    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn summary(&self) -> BatchSummary {
        let processed_count = self.scored.len();
        let composites = self
            .scored
            .iter()
            .map(|result| result.composite_score)
            .collect::<Vec<_>>();

        let mut component_totals: BTreeMap<ComponentKind, (f64, usize)> = BTreeMap::new();
        let mut tier_counts = BTreeMap::new();
        let mut account_counts = BTreeMap::new();
        for result in &self.scored {
            for sub in &result.sub_scores {
                let entry = component_totals.entry(sub.component).or_insert((0.0, 0));
                entry.0 += sub.normalized;
                entry.1 += 1;
            }
            *tier_counts.entry(result.tier).or_insert(0) += 1;
            *account_counts.entry(result.account_class).or_insert(0) += 1;
        }

        BatchSummary {
            configuration_id: self.configuration_id,
            processed_count,
            failed_count: self.failed.len(),
            average_composite: mean(&composites),
            max_composite: composites.iter().copied().reduce(f64::max),
            min_composite: composites.iter().copied().reduce(f64::min),
            average_sub_scores: component_totals
                .into_iter()
                .map(|(component, (sum, count))| (component, sum / count as f64))
                .collect(),
            tier_counts,
            account_counts,
        }
    }
}

/// Aggregate view of one recalculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub configuration_id: Option<WeightConfigId>,
    pub processed_count: usize,
    pub failed_count: usize,
    pub average_composite: Option<f64>,
    pub max_composite: Option<f64>,
    pub min_composite: Option<f64>,
    pub average_sub_scores: BTreeMap<ComponentKind, f64>,
    pub tier_counts: BTreeMap<Tier, usize>,
    pub account_counts: BTreeMap<AccountClass, usize>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Drives the scoring engine across a population. Batches above
/// `parallel_threshold` are scored on the rayon pool.
#[derive(Debug, Clone)]
pub struct RecalculationOrchestrator {
    engine: ScoringEngine,
    parallel_threshold: usize,
}

impl RecalculationOrchestrator {
    pub fn new(engine: ScoringEngine, parallel_threshold: usize) -> Self {
        Self {
            engine,
            parallel_threshold,
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Scores every doctor under `weights`. Failures are collected per doctor
    /// and never abort the batch; ranks are assigned after all scoring is done.
    pub fn recalculate_all(&self, doctors: &[DoctorRecord], weights: &WeightSnapshot) -> BatchResult {
        let extracted = self.fan_out(doctors, |record| {
            ScoreInput::from_record(record, weights).map_err(|error| ScoringFailure {
                doctor_id: record.id.clone(),
                reason: error.to_string(),
            })
        });

        let mut inputs = Vec::with_capacity(extracted.len());
        let mut failed = Vec::new();
        for outcome in extracted {
            match outcome {
                Ok(input) => inputs.push(input),
                Err(failure) => {
                    warn!(doctor_id = %failure.doctor_id, reason = %failure.reason, "doctor skipped during recalculation");
                    failed.push(failure);
                }
            }
        }

        let range = PopulationRange::observe(inputs.iter().map(|input| &input.signals));
        let mut scored = self.fan_out(&inputs, |input| self.engine.compose(input, weights, &range));
        standings::rank(&mut scored);

        debug!(
            parallel = doctors.len() > self.parallel_threshold,
            "recalculation batch scored"
        );
        info!(
            config = %weights.name,
            processed = scored.len(),
            failed = failed.len(),
            "recalculation complete"
        );

        BatchResult {
            configuration_id: weights.id,
            scored,
            failed,
        }
    }

    fn fan_out<T, U, F>(&self, items: &[T], map: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        if items.len() > self.parallel_threshold {
            items.par_iter().map(map).collect()
        } else {
            items.iter().map(map).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::roster::{DoctorProfile, MetricSet, QualityScores};
    use crate::workflows::scoring::{Normalization, ScoringPolicy};
    use crate::workflows::weights::{StandardWeights, WeightConfiguration};

    fn doctor(id: &str, followers: u64, quality: f64) -> DoctorRecord {
        DoctorRecord {
            id: DoctorId::from(id),
            profile: DoctorProfile {
                name: format!("Doctor {id}"),
                title: "主治医师".to_string(),
                affiliation: "Union Hospital".to_string(),
                department: "骨科".to_string(),
                region: None,
                agency: None,
            },
            metrics: MetricSet {
                total_followers: followers,
                total_likes: followers / 4,
                total_works: 40,
                quality: QualityScores {
                    performance: Some(quality),
                    ..QualityScores::default()
                },
                ..MetricSet::default()
            },
        }
    }

    fn weights() -> WeightSnapshot {
        WeightSnapshot {
            id: Some(WeightConfigId(3)),
            name: "reach".to_string(),
            weights: WeightConfiguration::Standard(StandardWeights {
                influence_weight: 0.5,
                activity_weight: 0.2,
                quality_weight: 0.3,
                price_weight: None,
                title_weight: Some(0.5),
            }),
        }
    }

    fn population() -> Vec<DoctorRecord> {
        vec![
            doctor("d-1", 1_200_000, 80.0),
            doctor("d-2", 40_000, 95.0),
            doctor("d-3", 250_000, 60.0),
            doctor("d-4", 600_000, 70.0),
        ]
    }

    #[test]
    fn malformed_doctor_is_reported_without_aborting() {
        let mut doctors = population();
        doctors[1].metrics.quality.performance = Some(250.0);
        let orchestrator = RecalculationOrchestrator::new(ScoringEngine::default(), 64);

        let batch = orchestrator.recalculate_all(&doctors, &weights());

        assert_eq!(batch.scored.len(), 3);
        assert_eq!(batch.failed_ids(), vec![DoctorId::from("d-2")]);
        assert!(batch.is_partial());
        let ranks = batch
            .scored
            .iter()
            .map(|result| result.rank)
            .collect::<Vec<_>>();
        assert_eq!(ranks, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn recalculation_is_idempotent() {
        let orchestrator = RecalculationOrchestrator::new(ScoringEngine::default(), 64);
        let doctors = population();

        let first = orchestrator.recalculate_all(&doctors, &weights());
        let second = orchestrator.recalculate_all(&doctors, &weights());

        assert_eq!(first, second);
    }

    #[test]
    fn parallel_and_sequential_paths_agree() {
        let policy = ScoringPolicy {
            normalization: Normalization::MinMax,
            ..ScoringPolicy::default()
        };
        let doctors = population();

        let sequential = RecalculationOrchestrator::new(ScoringEngine::new(policy), usize::MAX)
            .recalculate_all(&doctors, &weights());
        let parallel = RecalculationOrchestrator::new(ScoringEngine::new(policy), 0)
            .recalculate_all(&doctors, &weights());

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn summary_aggregates_tiers_and_accounts() {
        let orchestrator = RecalculationOrchestrator::new(ScoringEngine::default(), 64);
        let batch = orchestrator.recalculate_all(&population(), &weights());
        let summary = batch.summary();

        assert_eq!(summary.processed_count, 4);
        assert_eq!(summary.failed_count, 0);
        assert_eq!(summary.configuration_id, Some(WeightConfigId(3)));
        assert_eq!(summary.tier_counts.values().sum::<usize>(), 4);
        assert_eq!(summary.account_counts.get(&AccountClass::Head), Some(&2));
        assert_eq!(summary.average_sub_scores.len(), 3);
        let max = summary.max_composite.expect("max");
        let min = summary.min_composite.expect("min");
        assert!(max >= summary.average_composite.expect("avg") && min <= max);
    }

    #[test]
    fn empty_population_yields_empty_summary() {
        let orchestrator = RecalculationOrchestrator::new(ScoringEngine::default(), 64);
        let batch = orchestrator.recalculate_all(&[], &weights());
        let summary = batch.summary();

        assert!(batch.scored.is_empty());
        assert_eq!(summary.average_composite, None);
        assert!(summary.tier_counts.is_empty());
    }
}
