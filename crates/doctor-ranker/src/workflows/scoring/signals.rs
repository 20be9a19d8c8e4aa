//! Raw 0-100 signals derived from a doctor's metrics, one per weight component.

use std::collections::BTreeMap;

use serde::Serialize;

use super::seniority::{department_score, TitleCategory};
use crate::workflows::roster::{DoctorProfile, DoctorRecord, MetricSet, MetricWindow, WindowCounts};
use crate::workflows::weights::{ComponentKind, WeightConfiguration};

/// Raw signal values keyed by component.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentSignals {
    values: BTreeMap<ComponentKind, f64>,
}

impl ComponentSignals {
    pub fn from_values(values: impl IntoIterator<Item = (ComponentKind, f64)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn get(&self, component: ComponentKind) -> Option<f64> {
        self.values.get(&component).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentKind, f64)> + '_ {
        self.values.iter().map(|(component, value)| (*component, *value))
    }
}

/// Per-doctor scoring failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("metric {field} holds malformed value {value}")]
    MalformedMetric { field: &'static str, value: f64 },
}

/// Signals for every component of `weights`, after rejecting malformed metrics.
pub fn extract(
    record: &DoctorRecord,
    weights: &WeightConfiguration,
) -> Result<ComponentSignals, ScoringError> {
    check_metrics(&record.metrics)?;
    Ok(ComponentSignals::from_values(
        weights
            .components()
            .into_iter()
            .map(|(component, _)| (component, raw_signal(component, record))),
    ))
}

pub fn raw_signal(component: ComponentKind, record: &DoctorRecord) -> f64 {
    let metrics = &record.metrics;
    match component {
        ComponentKind::Influence | ComponentKind::AccountInfluence => influence(metrics),
        ComponentKind::Activity => activity(metrics),
        ComponentKind::Quality | ComponentKind::ContentQuality => content_quality(metrics),
        ComponentKind::Price | ComponentKind::CostEffectiveness => cost_effectiveness(metrics),
        ComponentKind::MedicalCredibility => credibility(&record.profile),
        ComponentKind::RoiPrediction => roi_prediction(metrics),
    }
}

fn check_metrics(metrics: &MetricSet) -> Result<(), ScoringError> {
    for (field, value) in metrics.quality.entries() {
        if let Some(value) = value {
            if !(value.is_finite() && (0.0..=100.0).contains(&value)) {
                return Err(ScoringError::MalformedMetric { field, value });
            }
        }
    }
    if let Some(price) = metrics.price {
        if !(price.is_finite() && price >= 0.0) {
            return Err(ScoringError::MalformedMetric {
                field: "price",
                value: price,
            });
        }
    }
    if let Some(rate) = metrics.response_rate {
        if !(rate.is_finite() && (0.0..=100.0).contains(&rate)) {
            return Err(ScoringError::MalformedMetric {
                field: "response_rate",
                value: rate,
            });
        }
    }
    Ok(())
}

fn influence(metrics: &MetricSet) -> f64 {
    let reach = match metrics.total_followers {
        0 => 0.0,
        f if f >= 1_000_000 => 100.0,
        f if f >= 500_000 => 85.0,
        f if f >= 100_000 => 70.0,
        f if f >= 50_000 => 55.0,
        _ => 40.0,
    };

    let engagement = if metrics.total_works == 0 || metrics.total_followers == 0 {
        0.0
    } else {
        let likes_per_work = metrics.total_likes as f64 / metrics.total_works as f64;
        match likes_per_work / metrics.total_followers as f64 * 100.0 {
            rate if rate >= 5.0 => 100.0,
            rate if rate >= 3.0 => 80.0,
            rate if rate >= 1.0 => 60.0,
            _ => 30.0,
        }
    };

    reach * 0.7 + engagement * 0.3
}

fn activity(metrics: &MetricSet) -> f64 {
    let likes = growth_trend(metrics, |window| window.likes);
    let followers = growth_trend(metrics, |window| window.followers);
    let trend = likes * 0.4 + followers * 0.4 + works_efficiency(metrics) * 0.2;

    match metrics.response_rate {
        Some(rate) => trend * 0.8 + rate * 0.2,
        None => trend,
    }
}

/// Log-scaled daily rate, weighting recent windows more heavily.
fn growth_trend(metrics: &MetricSet, counter: impl Fn(&WindowCounts) -> u64) -> f64 {
    let daily = MetricWindow::ALL
        .iter()
        .zip([0.5, 0.3, 0.2])
        .map(|(window, weight)| {
            counter(metrics.window(*window)) as f64 / f64::from(window.days()) * weight
        })
        .sum::<f64>();

    if daily <= 0.0 {
        0.0
    } else {
        (daily.ln() * 15.0 + 50.0).clamp(0.0, 100.0)
    }
}

fn works_efficiency(metrics: &MetricSet) -> f64 {
    let windows = MetricWindow::ALL.map(|window| metrics.window(window));
    if windows.iter().any(|counts| counts.works == 0) {
        return 0.0;
    }

    let average = windows
        .iter()
        .map(|counts| counts.likes as f64 / counts.works as f64)
        .sum::<f64>()
        / windows.len() as f64;

    if average <= 0.0 {
        0.0
    } else {
        (average.ln() * 20.0 + 50.0).clamp(0.0, 100.0)
    }
}

fn content_quality(metrics: &MetricSet) -> f64 {
    const RATING_WEIGHTS: [f64; 4] = [0.30, 0.25, 0.25, 0.20];

    if !metrics.quality.is_empty() {
        let (weighted, total) = metrics
            .quality
            .entries()
            .iter()
            .zip(RATING_WEIGHTS)
            .filter_map(|((_, value), weight)| value.map(|value| (value * weight, weight)))
            .fold((0.0, 0.0), |(sum, weights), (value, weight)| {
                (sum + value, weights + weight)
            });
        return weighted / total;
    }

    if metrics.total_works == 0 {
        return 0.0;
    }
    match metrics.total_likes as f64 / metrics.total_works as f64 {
        per_work if per_work >= 10_000.0 => 100.0,
        per_work if per_work >= 5_000.0 => 80.0,
        per_work if per_work >= 1_000.0 => 60.0,
        _ => 40.0,
    }
}

/// Price per thousand followers, with a bonus for strong engagement.
/// Unpriced doctors sit at a neutral 50.
fn cost_effectiveness(metrics: &MetricSet) -> f64 {
    let price = match metrics.price {
        Some(price) if price > 0.0 => price,
        _ => return 50.0,
    };
    if metrics.total_followers == 0 {
        return 0.0;
    }

    let followers = metrics.total_followers as f64;
    let base: f64 = match price / (followers / 1_000.0) {
        per_k if per_k <= 50.0 => 95.0,
        per_k if per_k <= 100.0 => 85.0,
        per_k if per_k <= 200.0 => 75.0,
        per_k if per_k <= 500.0 => 65.0,
        per_k if per_k <= 1_000.0 => 55.0,
        _ => 35.0,
    };
    let bonus = match metrics.total_likes as f64 / followers * 100.0 {
        rate if rate >= 10.0 => 10.0,
        rate if rate >= 5.0 => 5.0,
        rate if rate >= 2.0 => 2.0,
        _ => 0.0,
    };

    (base + bonus).min(100.0)
}

fn credibility(profile: &DoctorProfile) -> f64 {
    TitleCategory::from_title(&profile.title).credibility() * 0.6
        + department_score(&profile.department) * 0.4
}

fn roi_prediction(metrics: &MetricSet) -> f64 {
    let growth = if metrics.total_followers == 0 {
        0.0
    } else {
        metrics.last_7d.followers as f64 / metrics.total_followers as f64 * 100.0
    };
    let projected = match growth {
        rate if rate >= 2.0 => 100.0,
        rate if rate >= 1.0 => 80.0,
        rate if rate >= 0.5 => 60.0,
        _ => 40.0,
    };

    match metrics.response_rate {
        Some(rate) => projected * 0.7 + rate * 0.3,
        None => projected,
    }
}
