use std::fmt;

use serde::Serialize;

use super::domain::{WeightConfiguration, WeightLimits, WeightShape, SUM_TOLERANCE};

/// A single broken weight invariant.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightViolation {
    #[error("weights sum to {actual}, expected {expected}")]
    InvalidWeightSum { expected: f64, actual: f64 },
    #[error("{component} weight {value} is outside [{min}, {max}]")]
    WeightOutOfRange {
        component: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Every violation found in one configuration, sum check first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightValidationError {
    pub violations: Vec<WeightViolation>,
}

impl fmt::Display for WeightValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages = self
            .violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        write!(f, "invalid weight configuration: {}", messages.join("; "))
    }
}

impl std::error::Error for WeightValidationError {}

/// Outcome of a dry validation, suitable for returning to callers verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightCheck {
    pub shape: WeightShape,
    pub valid: bool,
    pub declared_total: f64,
    pub weight_sum: f64,
    pub violations: Vec<WeightViolation>,
}

pub fn validate(
    config: &WeightConfiguration,
    limits: &WeightLimits,
) -> Result<(), WeightValidationError> {
    let violations = collect_violations(config, limits);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(WeightValidationError { violations })
    }
}

pub fn check(config: &WeightConfiguration, limits: &WeightLimits) -> WeightCheck {
    let violations = collect_violations(config, limits);
    WeightCheck {
        shape: config.shape(),
        valid: violations.is_empty(),
        declared_total: config.declared_total(),
        weight_sum: config.weight_sum(),
        violations,
    }
}

fn collect_violations(config: &WeightConfiguration, limits: &WeightLimits) -> Vec<WeightViolation> {
    let mut violations = Vec::new();
    let shape = config.shape();
    let expected = shape.declared_total();
    let actual = config.weight_sum();

    if !actual.is_finite() || (actual - expected).abs() > SUM_TOLERANCE {
        violations.push(WeightViolation::InvalidWeightSum { expected, actual });
    }

    for (component, value) in config.components() {
        let bounds = limits.bounds_for(component, shape);
        if !bounds.contains(value) {
            violations.push(WeightViolation::WeightOutOfRange {
                component: component.label().to_string(),
                value,
                min: bounds.min,
                max: bounds.max,
            });
        }
    }

    if let Some(title_weight) = config.title_weight() {
        let bounds = limits.title_bounds();
        if !bounds.contains(title_weight) {
            violations.push(WeightViolation::WeightOutOfRange {
                component: "title".to_string(),
                value: title_weight,
                min: bounds.min,
                max: bounds.max,
            });
        }
    }

    violations
}
