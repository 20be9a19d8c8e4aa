use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Professional title bands recognised by the scoring tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleCategory {
    Chief,
    AssociateChief,
    Attending,
    Resident,
    Unranked,
}

impl TitleCategory {
    pub fn from_title(title: &str) -> Self {
        title_map()
            .get(&normalize_label(title))
            .copied()
            .unwrap_or(Self::Unranked)
    }

    /// Bonus fraction fed into `1 + factor * title_weight`.
    pub const fn seniority_factor(self) -> f64 {
        match self {
            Self::Chief => 0.20,
            Self::AssociateChief => 0.10,
            Self::Attending => 0.05,
            Self::Resident | Self::Unranked => 0.0,
        }
    }

    /// Credibility rating on a 0-100 scale.
    pub const fn credibility(self) -> f64 {
        match self {
            Self::Chief => 100.0,
            Self::AssociateChief => 85.0,
            Self::Attending => 70.0,
            Self::Resident => 55.0,
            Self::Unranked => 40.0,
        }
    }
}

static TITLE_MAP: OnceLock<HashMap<String, TitleCategory>> = OnceLock::new();
static DEPARTMENT_MAP: OnceLock<HashMap<String, f64>> = OnceLock::new();

const UNLISTED_DEPARTMENT_SCORE: f64 = 75.0;

/// Specialty rating on a 0-100 scale; unlisted departments score 75.
pub fn department_score(department: &str) -> f64 {
    department_map()
        .get(&normalize_label(department))
        .copied()
        .unwrap_or(UNLISTED_DEPARTMENT_SCORE)
}

fn title_map() -> &'static HashMap<String, TitleCategory> {
    TITLE_MAP.get_or_init(|| {
        const TITLES: &[(&str, TitleCategory)] = &[
            ("主任医师", TitleCategory::Chief),
            ("教授", TitleCategory::Chief),
            ("Chief Physician", TitleCategory::Chief),
            ("Professor", TitleCategory::Chief),
            ("副主任医师", TitleCategory::AssociateChief),
            ("副教授", TitleCategory::AssociateChief),
            ("Associate Chief Physician", TitleCategory::AssociateChief),
            ("Associate Professor", TitleCategory::AssociateChief),
            ("主治医师", TitleCategory::Attending),
            ("Attending Physician", TitleCategory::Attending),
            ("Attending", TitleCategory::Attending),
            ("住院医师", TitleCategory::Resident),
            ("Resident Physician", TitleCategory::Resident),
            ("Resident", TitleCategory::Resident),
        ];

        TITLES
            .iter()
            .map(|(label, category)| (normalize_label(label), *category))
            .collect()
    })
}

fn department_map() -> &'static HashMap<String, f64> {
    DEPARTMENT_MAP.get_or_init(|| {
        const DEPARTMENTS: &[(&str, f64)] = &[
            // Core internal medicine
            ("心血管内科", 95.0),
            ("神经内科", 95.0),
            ("消化内科", 95.0),
            ("呼吸内科", 95.0),
            ("Cardiology", 95.0),
            ("Neurology", 95.0),
            ("Gastroenterology", 95.0),
            ("Respiratory Medicine", 95.0),
            // Chronic care
            ("内分泌科", 90.0),
            ("肾内科", 90.0),
            ("血液科", 90.0),
            ("Endocrinology", 90.0),
            ("Nephrology", 90.0),
            ("Hematology", 90.0),
            // Surgical
            ("骨科", 85.0),
            ("外科", 85.0),
            ("妇产科", 85.0),
            ("Orthopedics", 85.0),
            ("Surgery", 85.0),
            ("Obstetrics and Gynecology", 85.0),
        ];

        DEPARTMENTS
            .iter()
            .map(|(label, score)| (normalize_label(label), *score))
            .collect()
    })
}

fn normalize_label(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
