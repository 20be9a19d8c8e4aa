use serde::Serialize;

use super::mapping::{CanonicalField, FieldKind};
use super::ImportError;

/// Column guide for operators preparing an import file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportTemplate {
    pub headers: Vec<&'static str>,
    pub fields: Vec<TemplateField>,
    pub rules: Vec<&'static str>,
    pub sample: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateField {
    pub field: CanonicalField,
    pub required: bool,
    pub description: &'static str,
}

impl ImportTemplate {
    /// Header plus the sample row as comma-separated text.
    pub fn to_csv(&self) -> Result<String, ImportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        writer.write_record(&self.sample)?;
        let bytes = writer
            .into_inner()
            .map_err(|error| ImportError::Template(error.to_string()))?;
        String::from_utf8(bytes).map_err(|error| ImportError::Template(error.to_string()))
    }
}

pub fn template() -> ImportTemplate {
    let fields = CanonicalField::ALL
        .iter()
        .map(|field| TemplateField {
            field: *field,
            required: field.is_required(),
            description: describe(*field),
        })
        .collect();

    ImportTemplate {
        headers: CanonicalField::ALL.iter().map(|field| field.key()).collect(),
        fields,
        rules: vec![
            "name, title, affiliation and department are required",
            "rows without an id receive one derived from name, affiliation and department",
            "numbers may use thousands separators; ratings and response_rate may end with %",
            "ratings and response_rate are clamped to 0-100 with a warning",
            "unparseable optional numbers default to 0 with a warning",
            "columns may use Chinese or English header names; unknown columns are ignored",
        ],
        sample: vec![
            "",
            "张医生",
            "主任医师",
            "北京协和医院",
            "心血管内科",
            "北京",
            "健康传媒",
            "5000",
            "1,250,000",
            "3,400,000",
            "180",
            "12000",
            "8500",
            "600",
            "450",
            "3",
            "26000",
            "17000",
            "1300",
            "980",
            "6",
            "51000",
            "33000",
            "2600",
            "1900",
            "12",
            "92",
            "88",
            "85",
            "90",
            "95%",
        ],
    }
}

fn describe(field: CanonicalField) -> &'static str {
    match field.kind() {
        FieldKind::Text => match field {
            CanonicalField::Id => "stable doctor identifier (optional)",
            CanonicalField::Name => "doctor's full name",
            CanonicalField::Title => "professional title, e.g. 主任医师 or Attending Physician",
            CanonicalField::Affiliation => "hospital or institution",
            CanonicalField::Department => "clinical department",
            CanonicalField::Region => "city or region (optional)",
            _ => "representing agency (optional)",
        },
        FieldKind::Money => "quoted price per commissioned piece (optional)",
        FieldKind::Score if field == CanonicalField::ResponseRate => {
            "share of messages answered, 0-100 (optional)"
        }
        FieldKind::Score => "manual rating, 0-100 (optional)",
        FieldKind::Count if field.window_slot().is_some() => "count within the trailing window",
        FieldKind::Count => "cumulative count",
    }
}
