use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::mapping::{CanonicalField, FieldMapping, WindowCounter};
use super::normalizer::clean_numeric;
use super::parser::RawRow;
use crate::workflows::roster::{
    DoctorId, DoctorProfile, DoctorRecord, MetricSet, QualityScores, WindowCounts,
};

/// Fatal problem with one row. `field` is absent for row-level problems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl RowIssue {
    pub fn field(row: usize, field: CanonicalField, message: impl Into<String>) -> Self {
        Self {
            row,
            field: Some(field.key().to_string()),
            message: message.into(),
        }
    }

    pub fn row(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            field: None,
            message: message.into(),
        }
    }
}

/// One input row with its typed projection once valid.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    pub row: usize,
    pub raw: BTreeMap<String, String>,
    pub record: Option<DoctorRecord>,
    pub errors: Vec<RowIssue>,
    pub warnings: Vec<String>,
}

impl ImportRecord {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.record.is_some()
    }

    /// Demotes the row to invalid after a cross-row check fails.
    pub(crate) fn reject(&mut self, issue: RowIssue) {
        self.errors.push(issue);
        self.record = None;
    }
}

/// Validates and coerces one row. Missing required text is fatal; numeric
/// problems are repaired and reported as warnings.
pub fn validate_row(row: &RawRow, mapping: &FieldMapping) -> ImportRecord {
    let mut raw = BTreeMap::new();
    for (header, cell) in mapping.headers().iter().zip(&row.cells) {
        raw.entry(header.trim().to_string())
            .or_insert_with(|| cell.clone());
    }

    let mut reader = CellReader {
        row,
        mapping,
        warnings: Vec::new(),
    };
    let mut errors = Vec::new();

    if let Some(error) = &row.error {
        errors.push(RowIssue::row(row.row, format!("unreadable row: {error}")));
    }
    for field in CanonicalField::REQUIRED {
        if reader.text(field).is_none() && row.error.is_none() {
            errors.push(RowIssue::field(row.row, field, "required"));
        }
    }

    let metrics = read_metrics(&mut reader);
    let record = if errors.is_empty() {
        let profile = DoctorProfile {
            name: reader.text(CanonicalField::Name).unwrap_or_default().to_string(),
            title: reader.text(CanonicalField::Title).unwrap_or_default().to_string(),
            affiliation: reader
                .text(CanonicalField::Affiliation)
                .unwrap_or_default()
                .to_string(),
            department: reader
                .text(CanonicalField::Department)
                .unwrap_or_default()
                .to_string(),
            region: reader.text(CanonicalField::Region).map(str::to_string),
            agency: reader.text(CanonicalField::Agency).map(str::to_string),
        };
        let id = reader
            .text(CanonicalField::Id)
            .map(DoctorId::from)
            .unwrap_or_else(|| derive_doctor_id(&profile));
        Some(DoctorRecord {
            id,
            profile,
            metrics,
        })
    } else {
        None
    };

    ImportRecord {
        row: row.row,
        raw,
        record,
        errors,
        warnings: reader.warnings,
    }
}

/// Stable id for rows that carry none: a digest of name, affiliation and department.
pub fn derive_doctor_id(profile: &DoctorProfile) -> DoctorId {
    let key = [&profile.name, &profile.affiliation, &profile.department]
        .iter()
        .map(|part| part.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("|");
    let digest = Sha256::digest(key.as_bytes());
    let hex = digest
        .iter()
        .take(6)
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    DoctorId(format!("doc-{hex}"))
}

fn read_metrics(reader: &mut CellReader<'_>) -> MetricSet {
    let mut metrics = MetricSet {
        total_followers: reader.count(CanonicalField::TotalFollowers),
        total_likes: reader.count(CanonicalField::TotalLikes),
        total_works: reader.count(CanonicalField::TotalWorks),
        last_7d: WindowCounts::default(),
        last_15d: WindowCounts::default(),
        last_30d: WindowCounts::default(),
        quality: QualityScores {
            performance: reader.score(CanonicalField::PerformanceScore),
            affinity: reader.score(CanonicalField::AffinityScore),
            editing: reader.score(CanonicalField::EditingScore),
            video_quality: reader.score(CanonicalField::VideoQualityScore),
        },
        price: reader.money(CanonicalField::Price),
        response_rate: reader.score(CanonicalField::ResponseRate),
    };

    for field in CanonicalField::ALL {
        if let Some((window, counter)) = field.window_slot() {
            let value = reader.count(field);
            let counts = metrics.window_mut(window);
            match counter {
                WindowCounter::Likes => counts.likes = value,
                WindowCounter::Followers => counts.followers = value,
                WindowCounter::Shares => counts.shares = value,
                WindowCounter::Comments => counts.comments = value,
                WindowCounter::Works => counts.works = value,
            }
        }
    }

    metrics
}

struct CellReader<'a> {
    row: &'a RawRow,
    mapping: &'a FieldMapping,
    warnings: Vec<String>,
}

impl<'a> CellReader<'a> {
    fn text(&self, field: CanonicalField) -> Option<&'a str> {
        let row = self.row;
        self.mapping
            .column(field)
            .and_then(|index| row.cells.get(index))
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
    }

    fn warn(&mut self, field: CanonicalField, message: String) {
        self.warnings
            .push(format!("row {}: {} {}", self.row.row, field.key(), message));
    }

    /// Blank cells yield `None` silently; unparseable text becomes 0 with a warning.
    fn number(&mut self, field: CanonicalField) -> Option<f64> {
        let text = self.text(field)?;
        match clean_numeric(text).digits.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                self.warn(field, format!("value '{text}' is not a number, defaulted to 0"));
                Some(0.0)
            }
        }
    }

    fn count(&mut self, field: CanonicalField) -> u64 {
        let Some(value) = self.number(field) else {
            return 0;
        };
        if value < 0.0 {
            self.warn(field, format!("value {value} clamped to 0"));
            return 0;
        }
        // `u64::MAX as f64` rounds up to 2^64, which is already out of range.
        if value >= u64::MAX as f64 {
            self.warn(field, format!("value {value} clamped to {}", u64::MAX));
            return u64::MAX;
        }
        if value.fract() != 0.0 {
            self.warn(field, format!("value {value} rounded to a whole number"));
        }
        value.round() as u64
    }

    fn score(&mut self, field: CanonicalField) -> Option<f64> {
        let value = self.number(field)?;
        let clamped = value.clamp(0.0, 100.0);
        if clamped != value {
            self.warn(field, format!("value {value} clamped to {clamped}"));
        }
        Some(clamped)
    }

    fn money(&mut self, field: CanonicalField) -> Option<f64> {
        let value = self.number(field)?;
        if value < 0.0 {
            self.warn(field, format!("value {value} clamped to 0"));
            return Some(0.0);
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::import::mapping::map_fields;

    fn mapping(headers: &[&str]) -> FieldMapping {
        map_fields(&headers.iter().map(|h| h.to_string()).collect::<Vec<_>>())
    }

    fn raw_row(row: usize, cells: &[&str]) -> RawRow {
        RawRow {
            row,
            cells: cells.iter().map(|c| c.to_string()).collect(),
            error: None,
        }
    }

    const HEADERS: &[&str] = &[
        "姓名",
        "职称",
        "医院",
        "科室",
        "总粉丝",
        "回复率",
        "表现力评分",
        "7天获赞",
    ];

    #[test]
    fn valid_row_projects_into_a_doctor_record() {
        let record = validate_row(
            &raw_row(1, &["李明", "主任医师", "协和医院", "心血管内科", "1,250,000", "85%", "92", "3,400"]),
            &mapping(HEADERS),
        );

        assert!(record.is_valid(), "{:?}", record.errors);
        assert!(record.warnings.is_empty());
        let doctor = record.record.expect("typed record");
        assert_eq!(doctor.profile.name, "李明");
        assert_eq!(doctor.metrics.total_followers, 1_250_000);
        assert_eq!(doctor.metrics.response_rate, Some(85.0));
        assert_eq!(doctor.metrics.quality.performance, Some(92.0));
        assert_eq!(doctor.metrics.last_7d.likes, 3_400);
        assert!(doctor.id.as_str().starts_with("doc-"));
        assert_eq!(doctor.id.as_str().len(), 16);
        assert_eq!(record.raw.get("姓名").map(String::as_str), Some("李明"));
    }

    #[test]
    fn missing_required_fields_are_reported_per_field() {
        let record = validate_row(
            &raw_row(2, &["", "主治医师", "协和医院", " "]),
            &mapping(HEADERS),
        );

        assert!(!record.is_valid());
        assert!(record.record.is_none());
        assert_eq!(
            record.errors,
            vec![
                RowIssue::field(2, CanonicalField::Name, "required"),
                RowIssue::field(2, CanonicalField::Department, "required"),
            ]
        );
    }

    #[test]
    fn out_of_range_rating_is_clamped_with_warning() {
        let record = validate_row(
            &raw_row(1, &["A", "住院医师", "B", "C", "10", "150", "", ""]),
            &mapping(HEADERS),
        );

        assert!(record.is_valid());
        let doctor = record.record.as_ref().expect("typed record");
        assert_eq!(doctor.metrics.response_rate, Some(100.0));
        assert_eq!(doctor.metrics.quality.performance, None);
        assert_eq!(record.warnings.len(), 1);
        assert!(record.warnings[0].contains("response_rate"));
    }

    #[test]
    fn malformed_optional_numbers_default_to_zero() {
        let record = validate_row(
            &raw_row(3, &["A", "住院医师", "B", "C", "lots", "", "n/a", "-5"]),
            &mapping(HEADERS),
        );

        assert!(record.is_valid());
        let doctor = record.record.as_ref().expect("typed record");
        assert_eq!(doctor.metrics.total_followers, 0);
        assert_eq!(doctor.metrics.quality.performance, Some(0.0));
        assert_eq!(doctor.metrics.last_7d.likes, 0);
        assert_eq!(record.warnings.len(), 3);
        assert!(record.warnings.iter().all(|warning| warning.starts_with("row 3:")));
    }

    #[test]
    fn oversized_counts_are_clamped_with_warning() {
        let record = validate_row(
            &raw_row(4, &["A", "住院医师", "B", "C", "99999999999999999999999", "", "", ""]),
            &mapping(HEADERS),
        );

        assert!(record.is_valid());
        let doctor = record.record.as_ref().expect("typed record");
        assert_eq!(doctor.metrics.total_followers, u64::MAX);
        assert_eq!(record.warnings.len(), 1);
        assert!(record.warnings[0].starts_with("row 4: total_followers"));
        assert!(record.warnings[0].ends_with(&format!("clamped to {}", u64::MAX)));
    }

    #[test]
    fn explicit_id_wins_over_derived_id() {
        let record = validate_row(
            &raw_row(1, &["D-77", "A", "住院医师", "B", "C"]),
            &mapping(&["id", "name", "title", "affiliation", "department"]),
        );
        assert_eq!(
            record.record.map(|doctor| doctor.id),
            Some(DoctorId::from("D-77"))
        );
    }

    #[test]
    fn derived_ids_ignore_case_and_padding() {
        let profile = |name: &str| DoctorProfile {
            name: name.to_string(),
            title: "Resident".to_string(),
            affiliation: "City Hospital".to_string(),
            department: "Surgery".to_string(),
            region: None,
            agency: None,
        };
        assert_eq!(
            derive_doctor_id(&profile("Chen Jie")),
            derive_doctor_id(&profile("  chen jie "))
        );
        assert_ne!(
            derive_doctor_id(&profile("Chen Jie")),
            derive_doctor_id(&profile("Chen Jun"))
        );
    }

    #[test]
    fn unreadable_rows_are_fatal() {
        let row = RawRow {
            row: 4,
            cells: Vec::new(),
            error: Some("invalid utf-8".to_string()),
        };
        let record = validate_row(&row, &mapping(HEADERS));
        assert_eq!(record.errors.len(), 1);
        assert_eq!(record.errors[0].field, None);
    }
}
