//! Named medical weight strategies and a distribution check for medical weight vectors.

use serde::{Deserialize, Serialize};

use super::domain::{ComponentKind, MedicalWeights};

/// Above this share a single component makes the configuration high risk.
const HIGH_CONCENTRATION: f64 = 50.0;
const MEDIUM_CONCENTRATION: f64 = 40.0;
const MIN_CREDIBILITY: f64 = 5.0;
const MIN_CONTENT_QUALITY: f64 = 20.0;
const MAX_COST_EFFECTIVENESS: f64 = 45.0;
const MAX_VARIANCE: f64 = 200.0;

/// Preset allocation strategies for the medical layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightStrategy {
    Conservative,
    Aggressive,
    Balanced,
    BrandFocused,
}

impl WeightStrategy {
    pub const ALL: [WeightStrategy; 4] = [
        Self::Conservative,
        Self::Aggressive,
        Self::Balanced,
        Self::BrandFocused,
    ];

    pub fn weights(self) -> MedicalWeights {
        let (influence, cost, content, credibility, roi) = match self {
            Self::Conservative => (20.0, 40.0, 25.0, 12.0, 3.0),
            Self::Aggressive => (30.0, 25.0, 25.0, 8.0, 12.0),
            Self::Balanced => (22.0, 35.0, 28.0, 10.0, 5.0),
            Self::BrandFocused => (18.0, 20.0, 35.0, 22.0, 5.0),
        };
        MedicalWeights {
            account_influence_weight: influence,
            cost_effectiveness_weight: cost,
            content_quality_weight: content,
            medical_credibility_weight: credibility,
            roi_prediction_weight: roi,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Conservative => "Conservative placement",
            Self::Aggressive => "Aggressive placement",
            Self::Balanced => "Balanced placement",
            Self::BrandFocused => "Brand-focused placement",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Conservative => {
                "New partnerships; favours cost effectiveness and professional credibility"
            }
            Self::Aggressive => "Proven doctors; favours reach and predicted return",
            Self::Balanced => "General medical campaigns with evenly spread weights",
            Self::BrandFocused => "Brand building; favours content quality and credibility",
        }
    }

    pub const fn scenarios(self) -> &'static [&'static str] {
        match self {
            Self::Conservative => &["new doctor partnership", "limited budget", "risk control"],
            Self::Aggressive => &["performance driven", "head accounts", "rapid expansion"],
            Self::Balanced => &["general purpose", "all-round assessment", "long-term partnership"],
            Self::BrandFocused => &["brand building", "authority endorsement", "professional image"],
        }
    }
}

/// A strategy together with its weights, as offered to operators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightPreset {
    pub strategy: WeightStrategy,
    pub name: &'static str,
    pub description: &'static str,
    pub weights: MedicalWeights,
    pub suitable_scenarios: &'static [&'static str],
}

pub fn presets() -> Vec<WeightPreset> {
    WeightStrategy::ALL
        .into_iter()
        .map(|strategy| WeightPreset {
            strategy,
            name: strategy.label(),
            description: strategy.description(),
            weights: strategy.weights(),
            suitable_scenarios: strategy.scenarios(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// How concentrated a medical weight vector is, with advice for rebalancing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightImpact {
    pub dominant_factor: ComponentKind,
    pub max_weight: f64,
    /// 100 for weights no larger than 20 each, minus 2 per point above that.
    pub balance_score: f64,
    pub variance: f64,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
}

pub fn analyze(weights: &MedicalWeights) -> WeightImpact {
    // Tie order: cost effectiveness wins, then reach, content, credibility, roi.
    let ordered = [
        (
            ComponentKind::CostEffectiveness,
            weights.cost_effectiveness_weight,
        ),
        (
            ComponentKind::AccountInfluence,
            weights.account_influence_weight,
        ),
        (ComponentKind::ContentQuality, weights.content_quality_weight),
        (
            ComponentKind::MedicalCredibility,
            weights.medical_credibility_weight,
        ),
        (ComponentKind::RoiPrediction, weights.roi_prediction_weight),
    ];

    let max_weight = ordered
        .iter()
        .map(|(_, value)| *value)
        .fold(f64::MIN, f64::max);
    let dominant_factor = ordered
        .iter()
        .find(|(_, value)| *value >= max_weight)
        .map(|(component, _)| *component)
        .unwrap_or(ComponentKind::CostEffectiveness);

    let mean = ordered.iter().map(|(_, value)| value).sum::<f64>() / ordered.len() as f64;
    let variance = ordered
        .iter()
        .map(|(_, value)| (value - mean).powi(2))
        .sum::<f64>()
        / ordered.len() as f64;

    let risk_level = if max_weight > HIGH_CONCENTRATION {
        RiskLevel::High
    } else if max_weight > MEDIUM_CONCENTRATION {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    WeightImpact {
        dominant_factor,
        max_weight,
        balance_score: 100.0 - (max_weight - 20.0).max(0.0) * 2.0,
        variance,
        risk_level,
        recommendations: recommendations(weights, max_weight, variance),
    }
}

fn recommendations(weights: &MedicalWeights, max_weight: f64, variance: f64) -> Vec<String> {
    let mut advice = Vec::new();

    if max_weight > HIGH_CONCENTRATION {
        advice.push("keep every single component at or below 50 to preserve an all-round assessment");
    }
    if weights.medical_credibility_weight < MIN_CREDIBILITY {
        advice.push("raise medical credibility to at least 5 so professional standing is assessed");
    }
    if weights.content_quality_weight < MIN_CONTENT_QUALITY {
        advice.push("raise content quality to at least 20; medical content must stay accurate");
    }
    if weights.cost_effectiveness_weight > MAX_COST_EFFECTIVENESS {
        advice.push("cost effectiveness above 45 can crowd out quality; consider lowering it");
    }
    if variance > MAX_VARIANCE {
        advice.push("weights are spread unevenly; consider rebalancing the components");
    }
    if advice.is_empty() {
        advice.push("distribution is sound for medical evaluation");
    }

    advice.into_iter().map(str::to_string).collect()
}
