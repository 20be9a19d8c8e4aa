use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Allowed distance between the component sum and the declared total.
pub const SUM_TOLERANCE: f64 = 0.01;

/// Individual weight components across both configuration shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Influence,
    Activity,
    Quality,
    Price,
    AccountInfluence,
    CostEffectiveness,
    ContentQuality,
    MedicalCredibility,
    RoiPrediction,
}

impl ComponentKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Influence => "influence",
            Self::Activity => "activity",
            Self::Quality => "quality",
            Self::Price => "price",
            Self::AccountInfluence => "account_influence",
            Self::CostEffectiveness => "cost_effectiveness",
            Self::ContentQuality => "content_quality",
            Self::MedicalCredibility => "medical_credibility",
            Self::RoiPrediction => "roi_prediction",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which of the two weight layouts a configuration uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightShape {
    Standard,
    Medical,
}

impl WeightShape {
    pub const fn declared_total(self) -> f64 {
        match self {
            Self::Standard => 1.0,
            Self::Medical => 100.0,
        }
    }
}

/// Fractional weights summing to 1.0. `title_weight` scales the seniority
/// multiplier and is excluded from the sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandardWeights {
    pub influence_weight: f64,
    pub activity_weight: f64,
    pub quality_weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_weight: Option<f64>,
}

/// Percentage weights summing to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MedicalWeights {
    pub account_influence_weight: f64,
    pub cost_effectiveness_weight: f64,
    pub content_quality_weight: f64,
    pub medical_credibility_weight: f64,
    pub roi_prediction_weight: f64,
}

impl MedicalWeights {
    /// Starting point offered to operators configuring the medical layout.
    pub fn recommended() -> Self {
        Self {
            account_influence_weight: 25.0,
            cost_effectiveness_weight: 30.0,
            content_quality_weight: 25.0,
            medical_credibility_weight: 10.0,
            roi_prediction_weight: 10.0,
        }
    }
}

/// A weight vector in either shape. The shape is inferred from the component
/// field names present in the payload; keys from both shapes match neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightConfiguration {
    Standard(StandardWeights),
    Medical(MedicalWeights),
}

impl WeightConfiguration {
    /// Weights applied when no configuration has been activated.
    pub fn system_default() -> Self {
        Self::Standard(StandardWeights {
            influence_weight: 0.35,
            activity_weight: 0.25,
            quality_weight: 0.25,
            price_weight: Some(0.15),
            title_weight: None,
        })
    }

    pub fn shape(&self) -> WeightShape {
        match self {
            Self::Standard(_) => WeightShape::Standard,
            Self::Medical(_) => WeightShape::Medical,
        }
    }

    pub fn declared_total(&self) -> f64 {
        self.shape().declared_total()
    }

    /// Summed components paired with their kind, in declaration order.
    pub fn components(&self) -> Vec<(ComponentKind, f64)> {
        match self {
            Self::Standard(weights) => {
                let mut components = vec![
                    (ComponentKind::Influence, weights.influence_weight),
                    (ComponentKind::Activity, weights.activity_weight),
                    (ComponentKind::Quality, weights.quality_weight),
                ];
                if let Some(price) = weights.price_weight {
                    components.push((ComponentKind::Price, price));
                }
                components
            }
            Self::Medical(weights) => vec![
                (
                    ComponentKind::AccountInfluence,
                    weights.account_influence_weight,
                ),
                (
                    ComponentKind::CostEffectiveness,
                    weights.cost_effectiveness_weight,
                ),
                (ComponentKind::ContentQuality, weights.content_quality_weight),
                (
                    ComponentKind::MedicalCredibility,
                    weights.medical_credibility_weight,
                ),
                (ComponentKind::RoiPrediction, weights.roi_prediction_weight),
            ],
        }
    }

    pub fn weight_sum(&self) -> f64 {
        self.components().iter().map(|(_, weight)| weight).sum()
    }

    pub fn title_weight(&self) -> Option<f64> {
        match self {
            Self::Standard(weights) => weights.title_weight,
            Self::Medical(_) => None,
        }
    }
}

/// Inclusive bounds for a single weight component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBounds {
    pub min: f64,
    pub max: f64,
}

impl WeightBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Per-component bounds. Components without an override accept the full
/// range of their shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeightLimits {
    overrides: BTreeMap<ComponentKind, WeightBounds>,
    title: Option<WeightBounds>,
}

impl WeightLimits {
    pub fn with_bound(mut self, component: ComponentKind, bounds: WeightBounds) -> Self {
        self.overrides.insert(component, bounds);
        self
    }

    pub fn with_title_bound(mut self, bounds: WeightBounds) -> Self {
        self.title = Some(bounds);
        self
    }

    pub fn bounds_for(&self, component: ComponentKind, shape: WeightShape) -> WeightBounds {
        self.overrides
            .get(&component)
            .copied()
            .unwrap_or(WeightBounds::new(0.0, shape.declared_total()))
    }

    pub fn title_bounds(&self) -> WeightBounds {
        self.title.unwrap_or(WeightBounds::new(0.0, 1.0))
    }
}

/// Store-assigned identifier of a saved configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightConfigId(pub u64);

impl fmt::Display for WeightConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inbound payload for creating a configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightConfigDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub weights: WeightConfiguration,
    #[serde(default)]
    pub is_default: bool,
}

/// Persisted configuration. `is_default` marks the single active entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightConfigRecord {
    pub id: WeightConfigId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub weights: WeightConfiguration,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Configuration snapshot handed to scoring; `id` is `None` for the system default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightSnapshot {
    pub id: Option<WeightConfigId>,
    pub name: String,
    pub weights: WeightConfiguration,
}

impl WeightSnapshot {
    pub fn system_default() -> Self {
        Self {
            id: None,
            name: "system default".to_string(),
            weights: WeightConfiguration::system_default(),
        }
    }
}

impl From<&WeightConfigRecord> for WeightSnapshot {
    fn from(record: &WeightConfigRecord) -> Self {
        Self {
            id: Some(record.id),
            name: record.name.clone(),
            weights: record.weights.clone(),
        }
    }
}
