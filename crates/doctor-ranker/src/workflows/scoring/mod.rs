//! Pure scoring: signals per weight component, normalization, the weighted
//! composite with an optional seniority multiplier, tiers and ranking.

pub mod normalize;
pub mod seniority;
pub mod signals;
pub mod standings;
pub mod tiers;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::workflows::roster::{DoctorId, DoctorRecord};
use crate::workflows::weights::{ComponentKind, WeightConfigId, WeightSnapshot};

pub use normalize::{Normalization, PopulationRange};
pub use seniority::TitleCategory;
pub use signals::{ComponentSignals, ScoringError};
pub use tiers::{AccountClass, ThresholdError, Tier, TierThresholds};

/// Batch-wide scoring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoringPolicy {
    pub normalization: Normalization,
    pub thresholds: TierThresholds,
}

/// Everything the composite needs from one doctor, extracted up front so the
/// population range can be observed before any composite is computed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreInput {
    pub doctor_id: DoctorId,
    pub title: TitleCategory,
    pub followers: u64,
    pub signals: ComponentSignals,
}

impl ScoreInput {
    pub fn from_record(
        record: &DoctorRecord,
        weights: &WeightSnapshot,
    ) -> Result<Self, ScoringError> {
        Ok(Self {
            doctor_id: record.id.clone(),
            title: TitleCategory::from_title(&record.profile.title),
            followers: record.metrics.total_followers,
            signals: signals::extract(record, &weights.weights)?,
        })
    }
}

/// Contribution of one component to a composite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubScore {
    pub component: ComponentKind,
    pub raw: f64,
    pub normalized: f64,
    /// Component weight divided by the configuration's declared total.
    pub weight_fraction: f64,
    pub contribution: f64,
}

/// Derived score for one doctor. Rebuilt on every recalculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub doctor_id: DoctorId,
    pub configuration_id: Option<WeightConfigId>,
    pub composite_score: f64,
    pub sub_scores: Vec<SubScore>,
    pub seniority_multiplier: f64,
    pub tier: Tier,
    pub account_class: AccountClass,
    /// Assigned once the whole batch has been scored.
    pub rank: Option<u32>,
}

impl ScoreResult {
    pub fn view(&self) -> ScoreView {
        ScoreView {
            id: self.doctor_id.clone(),
            composite_score: self.composite_score,
            sub_scores: self
                .sub_scores
                .iter()
                .map(|sub| (sub.component, sub.normalized))
                .collect(),
            tier: self.tier,
            rank: self.rank,
        }
    }
}

/// Ranking entry exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreView {
    pub id: DoctorId,
    pub composite_score: f64,
    pub sub_scores: BTreeMap<ComponentKind, f64>,
    pub tier: Tier,
    pub rank: Option<u32>,
}

/// Stateless scorer parameterised by a [`ScoringPolicy`].
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    policy: ScoringPolicy,
}

impl ScoringEngine {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Scores a single doctor. Under min-max normalization a lone doctor is
    /// its own population, so every sub-score lands on the midpoint.
    pub fn score(
        &self,
        record: &DoctorRecord,
        weights: &WeightSnapshot,
    ) -> Result<ScoreResult, ScoringError> {
        let input = ScoreInput::from_record(record, weights)?;
        let range = PopulationRange::observe([&input.signals]);
        Ok(self.compose(&input, weights, &range))
    }

    /// Weighted composite of normalized signals, scaled by the seniority
    /// multiplier when the configuration carries a title weight.
    pub fn compose(
        &self,
        input: &ScoreInput,
        weights: &WeightSnapshot,
        range: &PopulationRange,
    ) -> ScoreResult {
        let total = weights.weights.declared_total();
        let sub_scores = weights
            .weights
            .components()
            .into_iter()
            .map(|(component, weight)| {
                let raw = input.signals.get(component).unwrap_or(0.0);
                let normalized = self.policy.normalization.apply(component, raw, range);
                let weight_fraction = weight / total;
                SubScore {
                    component,
                    raw,
                    normalized,
                    weight_fraction,
                    contribution: weight_fraction * normalized,
                }
            })
            .collect::<Vec<_>>();

        let seniority_multiplier = weights
            .weights
            .title_weight()
            .map(|title_weight| 1.0 + input.title.seniority_factor() * title_weight)
            .unwrap_or(1.0);
        let weighted = sub_scores.iter().map(|sub| sub.contribution).sum::<f64>();
        let composite_score = (weighted * seniority_multiplier).clamp(0.0, 100.0);

        ScoreResult {
            doctor_id: input.doctor_id.clone(),
            configuration_id: weights.id,
            composite_score,
            sub_scores,
            seniority_multiplier,
            tier: self.policy.thresholds.classify(composite_score),
            account_class: AccountClass::from_followers(input.followers),
            rank: None,
        }
    }
}
