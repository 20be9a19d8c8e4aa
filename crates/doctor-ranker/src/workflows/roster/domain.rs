use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a doctor on the roster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoctorId(pub String);

impl DoctorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DoctorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DoctorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Trailing observation windows tracked for engagement counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricWindow {
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "15d")]
    Days15,
    #[serde(rename = "30d")]
    Days30,
}

impl MetricWindow {
    pub const ALL: [MetricWindow; 3] = [Self::Days7, Self::Days15, Self::Days30];

    pub const fn days(self) -> u32 {
        match self {
            Self::Days7 => 7,
            Self::Days15 => 15,
            Self::Days30 => 30,
        }
    }
}

/// Counters accumulated over one trailing window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCounts {
    pub likes: u64,
    pub followers: u64,
    pub shares: u64,
    pub comments: u64,
    pub works: u64,
}

/// Manually entered content ratings. Each score sits on a 0-100 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_quality: Option<f64>,
}

impl QualityScores {
    /// Present ratings paired with their field names, in a fixed order.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("performance_score", self.performance),
            ("affinity_score", self.affinity),
            ("editing_score", self.editing),
            ("video_quality_score", self.video_quality),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, value)| value.is_none())
    }
}

/// Raw counters for a single doctor. Replaced as a whole, never patched field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub total_followers: u64,
    pub total_likes: u64,
    pub total_works: u64,
    #[serde(default)]
    pub last_7d: WindowCounts,
    #[serde(default)]
    pub last_15d: WindowCounts,
    #[serde(default)]
    pub last_30d: WindowCounts,
    #[serde(default)]
    pub quality: QualityScores,
    /// Quoted price per commissioned piece.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Share of inbound messages answered, as a percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_rate: Option<f64>,
}

impl MetricSet {
    pub fn window(&self, window: MetricWindow) -> &WindowCounts {
        match window {
            MetricWindow::Days7 => &self.last_7d,
            MetricWindow::Days15 => &self.last_15d,
            MetricWindow::Days30 => &self.last_30d,
        }
    }

    pub fn window_mut(&mut self, window: MetricWindow) -> &mut WindowCounts {
        match window {
            MetricWindow::Days7 => &mut self.last_7d,
            MetricWindow::Days15 => &mut self.last_15d,
            MetricWindow::Days30 => &mut self.last_30d,
        }
    }
}

/// Identity attributes captured alongside the metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub name: String,
    pub title: String,
    pub affiliation: String,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
}

/// Roster entry combining identity with the current metric set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub id: DoctorId,
    pub profile: DoctorProfile,
    pub metrics: MetricSet,
}
