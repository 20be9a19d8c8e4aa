use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use serde::Serialize;

use super::normalizer::normalize_header;
use crate::workflows::roster::MetricWindow;

/// Closed set of import columns the roster understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Id,
    Name,
    Title,
    Affiliation,
    Department,
    Region,
    Agency,
    Price,
    TotalFollowers,
    TotalLikes,
    TotalWorks,
    #[serde(rename = "likes_7d")]
    Likes7d,
    #[serde(rename = "followers_7d")]
    Followers7d,
    #[serde(rename = "shares_7d")]
    Shares7d,
    #[serde(rename = "comments_7d")]
    Comments7d,
    #[serde(rename = "works_7d")]
    Works7d,
    #[serde(rename = "likes_15d")]
    Likes15d,
    #[serde(rename = "followers_15d")]
    Followers15d,
    #[serde(rename = "shares_15d")]
    Shares15d,
    #[serde(rename = "comments_15d")]
    Comments15d,
    #[serde(rename = "works_15d")]
    Works15d,
    #[serde(rename = "likes_30d")]
    Likes30d,
    #[serde(rename = "followers_30d")]
    Followers30d,
    #[serde(rename = "shares_30d")]
    Shares30d,
    #[serde(rename = "comments_30d")]
    Comments30d,
    #[serde(rename = "works_30d")]
    Works30d,
    PerformanceScore,
    AffinityScore,
    EditingScore,
    VideoQualityScore,
    ResponseRate,
}

/// Counters tracked per trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCounter {
    Likes,
    Followers,
    Shares,
    Comments,
    Works,
}

impl WindowCounter {
    const ALL: [WindowCounter; 5] = [
        Self::Likes,
        Self::Followers,
        Self::Shares,
        Self::Comments,
        Self::Works,
    ];

    fn labels(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Likes => ("likes", &["点赞", "获赞"]),
            Self::Followers => ("followers", &["粉丝", "涨粉"]),
            Self::Shares => ("shares", &["分享", "转发"]),
            Self::Comments => ("comments", &["评论"]),
            Self::Works => ("works", &["作品", "作品数"]),
        }
    }
}

/// How a column's cell text is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Non-negative whole number.
    Count,
    /// Optional rating clamped to 0-100.
    Score,
    /// Optional non-negative amount.
    Money,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 31] = [
        Self::Id,
        Self::Name,
        Self::Title,
        Self::Affiliation,
        Self::Department,
        Self::Region,
        Self::Agency,
        Self::Price,
        Self::TotalFollowers,
        Self::TotalLikes,
        Self::TotalWorks,
        Self::Likes7d,
        Self::Followers7d,
        Self::Shares7d,
        Self::Comments7d,
        Self::Works7d,
        Self::Likes15d,
        Self::Followers15d,
        Self::Shares15d,
        Self::Comments15d,
        Self::Works15d,
        Self::Likes30d,
        Self::Followers30d,
        Self::Shares30d,
        Self::Comments30d,
        Self::Works30d,
        Self::PerformanceScore,
        Self::AffinityScore,
        Self::EditingScore,
        Self::VideoQualityScore,
        Self::ResponseRate,
    ];

    pub const REQUIRED: [CanonicalField; 4] = [
        Self::Name,
        Self::Title,
        Self::Affiliation,
        Self::Department,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Title => "title",
            Self::Affiliation => "affiliation",
            Self::Department => "department",
            Self::Region => "region",
            Self::Agency => "agency",
            Self::Price => "price",
            Self::TotalFollowers => "total_followers",
            Self::TotalLikes => "total_likes",
            Self::TotalWorks => "total_works",
            Self::Likes7d => "likes_7d",
            Self::Followers7d => "followers_7d",
            Self::Shares7d => "shares_7d",
            Self::Comments7d => "comments_7d",
            Self::Works7d => "works_7d",
            Self::Likes15d => "likes_15d",
            Self::Followers15d => "followers_15d",
            Self::Shares15d => "shares_15d",
            Self::Comments15d => "comments_15d",
            Self::Works15d => "works_15d",
            Self::Likes30d => "likes_30d",
            Self::Followers30d => "followers_30d",
            Self::Shares30d => "shares_30d",
            Self::Comments30d => "comments_30d",
            Self::Works30d => "works_30d",
            Self::PerformanceScore => "performance_score",
            Self::AffinityScore => "affinity_score",
            Self::EditingScore => "editing_score",
            Self::VideoQualityScore => "video_quality_score",
            Self::ResponseRate => "response_rate",
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Self::Id
            | Self::Name
            | Self::Title
            | Self::Affiliation
            | Self::Department
            | Self::Region
            | Self::Agency => FieldKind::Text,
            Self::Price => FieldKind::Money,
            Self::PerformanceScore
            | Self::AffinityScore
            | Self::EditingScore
            | Self::VideoQualityScore
            | Self::ResponseRate => FieldKind::Score,
            _ => FieldKind::Count,
        }
    }

    /// Window and counter for the windowed engagement columns.
    pub fn window_slot(self) -> Option<(MetricWindow, WindowCounter)> {
        use MetricWindow::{Days15, Days30, Days7};
        use WindowCounter::{Comments, Followers, Likes, Shares, Works};

        let slot = match self {
            Self::Likes7d => (Days7, Likes),
            Self::Followers7d => (Days7, Followers),
            Self::Shares7d => (Days7, Shares),
            Self::Comments7d => (Days7, Comments),
            Self::Works7d => (Days7, Works),
            Self::Likes15d => (Days15, Likes),
            Self::Followers15d => (Days15, Followers),
            Self::Shares15d => (Days15, Shares),
            Self::Comments15d => (Days15, Comments),
            Self::Works15d => (Days15, Works),
            Self::Likes30d => (Days30, Likes),
            Self::Followers30d => (Days30, Followers),
            Self::Shares30d => (Days30, Shares),
            Self::Comments30d => (Days30, Comments),
            Self::Works30d => (Days30, Works),
            _ => return None,
        };
        Some(slot)
    }

    fn from_window_slot(window: MetricWindow, counter: WindowCounter) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.window_slot() == Some((window, counter)))
            .unwrap_or(Self::Id)
    }
}

/// Resolved header row: which column feeds each canonical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    headers: Vec<String>,
    columns: BTreeMap<CanonicalField, usize>,
    ignored: Vec<String>,
}

impl FieldMapping {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column(&self, field: CanonicalField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Headers that matched no canonical field, or repeated an earlier match.
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    pub fn missing_required(&self) -> Vec<CanonicalField> {
        CanonicalField::REQUIRED
            .iter()
            .copied()
            .filter(|field| !self.columns.contains_key(field))
            .collect()
    }
}

/// Maps a header row onto canonical fields. Matching ignores case, spacing
/// and underscores; the first column claiming a field wins.
pub fn map_fields(headers: &[String]) -> FieldMapping {
    let mut columns = BTreeMap::new();
    let mut ignored = Vec::new();

    for (index, header) in headers.iter().enumerate() {
        let normalized = normalize_header(header);
        if normalized.is_empty() {
            continue;
        }
        match field_for_normalized(&normalized) {
            Some(field) if !columns.contains_key(&field) => {
                columns.insert(field, index);
            }
            _ => ignored.push(header.trim().to_string()),
        }
    }

    FieldMapping {
        headers: headers.to_vec(),
        columns,
        ignored,
    }
}

static SYNONYM_MAP: OnceLock<HashMap<String, CanonicalField>> = OnceLock::new();

pub(crate) fn field_for_normalized(normalized: &str) -> Option<CanonicalField> {
    synonym_map().get(normalized).copied()
}

fn synonym_map() -> &'static HashMap<String, CanonicalField> {
    SYNONYM_MAP.get_or_init(|| {
        const SYNONYMS: &[(&str, CanonicalField)] = &[
            // Identity
            ("doctor id", CanonicalField::Id),
            ("医生id", CanonicalField::Id),
            ("医生编号", CanonicalField::Id),
            ("编号", CanonicalField::Id),
            ("doctor name", CanonicalField::Name),
            ("full name", CanonicalField::Name),
            ("姓名", CanonicalField::Name),
            ("医生姓名", CanonicalField::Name),
            ("医生", CanonicalField::Name),
            ("job title", CanonicalField::Title),
            ("professional title", CanonicalField::Title),
            ("职称", CanonicalField::Title),
            ("institution", CanonicalField::Affiliation),
            ("hospital", CanonicalField::Affiliation),
            ("organization", CanonicalField::Affiliation),
            ("医院", CanonicalField::Affiliation),
            ("所属医院", CanonicalField::Affiliation),
            ("执业机构", CanonicalField::Affiliation),
            ("机构", CanonicalField::Affiliation),
            ("单位", CanonicalField::Affiliation),
            ("dept", CanonicalField::Department),
            ("科室", CanonicalField::Department),
            ("所属科室", CanonicalField::Department),
            ("city", CanonicalField::Region),
            ("area", CanonicalField::Region),
            ("地区", CanonicalField::Region),
            ("城市", CanonicalField::Region),
            ("区域", CanonicalField::Region),
            ("agency name", CanonicalField::Agency),
            ("mcn", CanonicalField::Agency),
            ("mcn机构", CanonicalField::Agency),
            ("经纪机构", CanonicalField::Agency),
            // Commercial
            ("quote", CanonicalField::Price),
            ("agency price", CanonicalField::Price),
            ("报价", CanonicalField::Price),
            ("机构报价", CanonicalField::Price),
            ("价格", CanonicalField::Price),
            // Cumulative totals
            ("followers", CanonicalField::TotalFollowers),
            ("fans", CanonicalField::TotalFollowers),
            ("总粉丝", CanonicalField::TotalFollowers),
            ("总粉丝量", CanonicalField::TotalFollowers),
            ("粉丝数", CanonicalField::TotalFollowers),
            ("粉丝量", CanonicalField::TotalFollowers),
            ("likes", CanonicalField::TotalLikes),
            ("总获赞", CanonicalField::TotalLikes),
            ("总获赞量", CanonicalField::TotalLikes),
            ("总点赞", CanonicalField::TotalLikes),
            ("获赞数", CanonicalField::TotalLikes),
            ("works", CanonicalField::TotalWorks),
            ("videos", CanonicalField::TotalWorks),
            ("总作品", CanonicalField::TotalWorks),
            ("总作品数", CanonicalField::TotalWorks),
            ("作品数", CanonicalField::TotalWorks),
            // Manual ratings
            ("performance", CanonicalField::PerformanceScore),
            ("表现力", CanonicalField::PerformanceScore),
            ("表现力评分", CanonicalField::PerformanceScore),
            ("affinity", CanonicalField::AffinityScore),
            ("亲和力", CanonicalField::AffinityScore),
            ("亲和力评分", CanonicalField::AffinityScore),
            ("editing", CanonicalField::EditingScore),
            ("剪辑", CanonicalField::EditingScore),
            ("剪辑水平", CanonicalField::EditingScore),
            ("剪辑水平评分", CanonicalField::EditingScore),
            ("video quality", CanonicalField::VideoQualityScore),
            ("画面质量", CanonicalField::VideoQualityScore),
            ("画面质量评分", CanonicalField::VideoQualityScore),
            ("视频质量评分", CanonicalField::VideoQualityScore),
            ("reply rate", CanonicalField::ResponseRate),
            ("回复率", CanonicalField::ResponseRate),
            ("响应率", CanonicalField::ResponseRate),
        ];

        let mut map = HashMap::new();
        for field in CanonicalField::ALL {
            map.insert(normalize_header(field.key()), field);
        }
        for (label, field) in SYNONYMS {
            map.insert(normalize_header(label), *field);
        }
        for window in MetricWindow::ALL {
            let days = window.days();
            for counter in WindowCounter::ALL {
                let field = CanonicalField::from_window_slot(window, counter);
                let (english, chinese) = counter.labels();
                map.insert(format!("{days}d {english}"), field);
                map.insert(format!("{english} {days} days"), field);
                for label in chinese {
                    map.insert(format!("{days}天{label}"), field);
                    map.insert(format!("{days}天新增{label}"), field);
                    map.insert(format!("近{days}天{label}"), field);
                }
            }
        }
        map
    })
}
