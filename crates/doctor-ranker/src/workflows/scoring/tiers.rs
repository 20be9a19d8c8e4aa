use std::fmt;

use serde::{Deserialize, Serialize};

/// Investment tier assigned from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Priority,
    Moderate,
    Watch,
    /// No current score, e.g. the doctor failed scoring in the latest batch.
    Unscored,
}

impl Tier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Moderate => "moderate",
            Self::Watch => "watch",
            Self::Unscored => "unscored",
        }
    }
}

/// Lower composite bounds of the priority and moderate tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierThresholds {
    priority: f64,
    moderate: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            priority: 80.0,
            moderate: 60.0,
        }
    }
}

impl TierThresholds {
    pub fn new(priority: f64, moderate: f64) -> Result<Self, ThresholdError> {
        let ordered = priority.is_finite()
            && moderate.is_finite()
            && 0.0 <= moderate
            && moderate < priority
            && priority <= 100.0;
        if ordered {
            Ok(Self { priority, moderate })
        } else {
            Err(ThresholdError { priority, moderate })
        }
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn moderate(&self) -> f64 {
        self.moderate
    }

    pub fn classify(&self, composite: f64) -> Tier {
        if composite >= self.priority {
            Tier::Priority
        } else if composite >= self.moderate {
            Tier::Moderate
        } else {
            Tier::Watch
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdError {
    pub priority: f64,
    pub moderate: f64,
}

impl fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tier thresholds must satisfy 0 <= moderate < priority <= 100 (priority {}, moderate {})",
            self.priority, self.moderate
        )
    }
}

impl std::error::Error for ThresholdError {}

/// Account size class by follower count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountClass {
    Head,
    Middle,
    Tail,
}

impl AccountClass {
    pub fn from_followers(followers: u64) -> Self {
        match followers {
            f if f >= 500_000 => Self::Head,
            f if f >= 100_000 => Self::Middle,
            _ => Self::Tail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_on_inclusive_lower_bounds() {
        let thresholds = TierThresholds::default();
        assert_eq!(thresholds.classify(80.0), Tier::Priority);
        assert_eq!(thresholds.classify(79.99), Tier::Moderate);
        assert_eq!(thresholds.classify(60.0), Tier::Moderate);
        assert_eq!(thresholds.classify(12.0), Tier::Watch);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        assert!(TierThresholds::new(50.0, 70.0).is_err());
        assert!(TierThresholds::new(101.0, 70.0).is_err());
        let custom = TierThresholds::new(90.0, 40.0).expect("ordered thresholds");
        assert_eq!(custom.classify(45.0), Tier::Moderate);
    }

    #[test]
    fn account_classes_follow_follower_counts() {
        assert_eq!(AccountClass::from_followers(500_000), AccountClass::Head);
        assert_eq!(AccountClass::from_followers(100_000), AccountClass::Middle);
        assert_eq!(AccountClass::from_followers(99_999), AccountClass::Tail);
    }
}
