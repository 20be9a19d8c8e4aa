use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::signals::ComponentSignals;
use crate::workflows::weights::ComponentKind;

/// How raw signals are mapped onto the 0-100 sub-score scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Raw signals are already on a 0-100 scale and are only clamped.
    #[default]
    Linear,
    /// Rescales each component against the lowest and highest value in the batch.
    MinMax,
}

impl Normalization {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "linear" => Some(Self::Linear),
            "min_max" | "minmax" => Some(Self::MinMax),
            _ => None,
        }
    }

    pub fn apply(self, component: ComponentKind, raw: f64, range: &PopulationRange) -> f64 {
        match self {
            Self::Linear => raw.clamp(0.0, 100.0),
            Self::MinMax => match range.bounds(component) {
                Some((min, max)) if (max - min).abs() > f64::EPSILON => {
                    ((raw - min) / (max - min)).clamp(0.0, 1.0) * 100.0
                }
                // A flat population carries no ordering information.
                _ => 50.0,
            },
        }
    }
}

/// Lowest and highest raw value observed per component across one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationRange {
    bounds: BTreeMap<ComponentKind, (f64, f64)>,
}

impl PopulationRange {
    pub fn observe<'a>(signals: impl IntoIterator<Item = &'a ComponentSignals>) -> Self {
        let mut bounds: BTreeMap<ComponentKind, (f64, f64)> = BTreeMap::new();
        for entry in signals {
            for (component, value) in entry.iter() {
                bounds
                    .entry(component)
                    .and_modify(|(min, max)| {
                        *min = min.min(value);
                        *max = max.max(value);
                    })
                    .or_insert((value, value));
            }
        }
        Self { bounds }
    }

    pub fn bounds(&self, component: ComponentKind) -> Option<(f64, f64)> {
        self.bounds.get(&component).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_policy_names() {
        assert_eq!(Normalization::parse("Linear"), Some(Normalization::Linear));
        assert_eq!(Normalization::parse("min-max"), Some(Normalization::MinMax));
        assert_eq!(Normalization::parse("zscore"), None);
    }

    #[test]
    fn min_max_rescales_against_population() {
        let population = [
            ComponentSignals::from_values([(ComponentKind::Influence, 20.0)]),
            ComponentSignals::from_values([(ComponentKind::Influence, 60.0)]),
            ComponentSignals::from_values([(ComponentKind::Influence, 40.0)]),
        ];
        let range = PopulationRange::observe(population.iter());

        assert_eq!(range.bounds(ComponentKind::Influence), Some((20.0, 60.0)));
        assert_eq!(
            Normalization::MinMax.apply(ComponentKind::Influence, 40.0, &range),
            50.0
        );
        assert_eq!(
            Normalization::MinMax.apply(ComponentKind::Influence, 60.0, &range),
            100.0
        );
    }

    #[test]
    fn flat_population_maps_to_midpoint() {
        let population = [ComponentSignals::from_values([(ComponentKind::Quality, 70.0)])];
        let range = PopulationRange::observe(population.iter());
        assert_eq!(
            Normalization::MinMax.apply(ComponentKind::Quality, 70.0, &range),
            50.0
        );
    }

    #[test]
    fn linear_clamps_only() {
        let range = PopulationRange::default();
        assert_eq!(
            Normalization::Linear.apply(ComponentKind::Activity, 130.0, &range),
            100.0
        );
        assert_eq!(
            Normalization::Linear.apply(ComponentKind::Activity, 42.5, &range),
            42.5
        );
    }
}
