//! Bulk roster import: parse delimited text, map bilingual headers, validate
//! rows, then commit the valid ones in bounded batches.
//!
//! An [`ImportSession`] walks `Uploaded -> Parsed -> Validated` and ends in
//! `Committed` or `Discarded`. Restarting drops every intermediate artefact.

pub mod commit;
pub mod mapping;
mod normalizer;
pub mod parser;
pub mod template;
pub mod validation;

use std::collections::HashMap;
use std::mem;

use serde::Serialize;
use tracing::info;

use crate::workflows::roster::{DoctorId, DoctorRepository};

pub use commit::{CommitFailure, CommitMode, CommitOutcome};
pub use mapping::{map_fields, CanonicalField, FieldMapping};
pub use parser::{parse, ParsedTable, RawRow};
pub use template::{template, ImportTemplate};
pub use validation::{derive_doctor_id, validate_row, ImportRecord, RowIssue};

/// Whole-operation import failures. Row problems are reported in
/// [`ImportReport`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("import payload is empty")]
    EmptyInput,
    #[error("import payload has no header row")]
    MissingHeader,
    #[error("invalid delimited data: {0}")]
    Csv(#[from] csv::Error),
    #[error("import session is {state}; cannot {action}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
    #[error("unable to render import template: {0}")]
    Template(String),
}

/// Lifecycle position of an [`ImportSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    Uploaded,
    Parsed,
    Validated,
    Committed,
    Discarded,
}

impl ImportState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Parsed => "parsed",
            Self::Validated => "validated",
            Self::Committed => "committed",
            Self::Discarded => "discarded",
        }
    }
}

/// Caller-facing import result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total_records: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub errors: Vec<RowIssue>,
    pub warnings: Vec<String>,
}

/// Partitioned rows after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub mapping: FieldMapping,
    pub records: Vec<ImportRecord>,
}

impl ValidationReport {
    pub fn valid(&self) -> impl Iterator<Item = &ImportRecord> {
        self.records.iter().filter(|record| record.is_valid())
    }

    pub fn invalid(&self) -> impl Iterator<Item = &ImportRecord> {
        self.records.iter().filter(|record| !record.is_valid())
    }

    pub fn warned(&self) -> impl Iterator<Item = &ImportRecord> {
        self.records
            .iter()
            .filter(|record| !record.warnings.is_empty())
    }

    /// Report for a dry run: every valid row counts as a success.
    pub fn preview(&self) -> ImportReport {
        let success_count = self.valid().count();
        ImportReport {
            total_records: self.records.len(),
            success_count,
            failed_count: self.records.len() - success_count,
            errors: self.errors(),
            warnings: self.warnings(),
        }
    }

    fn errors(&self) -> Vec<RowIssue> {
        self.records
            .iter()
            .flat_map(|record| record.errors.iter().cloned())
            .collect()
    }

    fn warnings(&self) -> Vec<String> {
        let mut warnings = self
            .mapping
            .ignored()
            .iter()
            .map(|header| format!("column '{header}' was ignored"))
            .collect::<Vec<_>>();
        warnings.extend(
            self.records
                .iter()
                .flat_map(|record| record.warnings.iter().cloned()),
        );
        warnings
    }
}

/// Commit settings supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOptions {
    pub batch_size: usize,
    pub mode: CommitMode,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            mode: CommitMode::Upsert,
        }
    }
}

enum Stage {
    Uploaded(String),
    Parsed(ParsedTable),
    Validated(ValidationReport),
    Committed {
        report: ImportReport,
        outcome: CommitOutcome,
    },
    Discarded,
}

impl Stage {
    fn state(&self) -> ImportState {
        match self {
            Stage::Uploaded(_) => ImportState::Uploaded,
            Stage::Parsed(_) => ImportState::Parsed,
            Stage::Validated(_) => ImportState::Validated,
            Stage::Committed { .. } => ImportState::Committed,
            Stage::Discarded => ImportState::Discarded,
        }
    }
}

/// One import attempt over a single payload.
pub struct ImportSession {
    stage: Stage,
}

impl ImportSession {
    pub fn upload(raw: impl Into<String>) -> Self {
        Self {
            stage: Stage::Uploaded(raw.into()),
        }
    }

    pub fn state(&self) -> ImportState {
        self.stage.state()
    }

    /// Replaces the payload and returns to `Uploaded`, dropping earlier results.
    pub fn restart(&mut self, raw: impl Into<String>) {
        self.stage = Stage::Uploaded(raw.into());
    }

    pub fn discard(&mut self) {
        self.stage = Stage::Discarded;
    }

    pub fn parse(&mut self) -> Result<&ParsedTable, ImportError> {
        if let Stage::Uploaded(raw) = &self.stage {
            let table = parser::parse(raw)?;
            self.stage = Stage::Parsed(table);
        }
        match &self.stage {
            Stage::Parsed(table) => Ok(table),
            other => Err(transition(other, "parse")),
        }
    }

    /// Maps headers and validates every row. Parses first when needed.
    pub fn validate(&mut self) -> Result<&ValidationReport, ImportError> {
        if matches!(self.stage, Stage::Uploaded(_)) {
            self.parse()?;
        }
        if let Stage::Parsed(table) = &self.stage {
            let report = validate_table(table);
            self.stage = Stage::Validated(report);
        }
        match &self.stage {
            Stage::Validated(report) => Ok(report),
            other => Err(transition(other, "validate")),
        }
    }

    /// Writes the valid rows. Only a validated session can be committed.
    pub fn commit<D>(
        &mut self,
        repository: &D,
        options: CommitOptions,
    ) -> Result<(&ImportReport, &CommitOutcome), ImportError>
    where
        D: DoctorRepository + ?Sized,
    {
        let report = match mem::replace(&mut self.stage, Stage::Discarded) {
            Stage::Validated(report) => report,
            other => {
                let error = transition(&other, "commit");
                self.stage = other;
                return Err(error);
            }
        };

        let outcome = commit::commit(&report.records, repository, options.batch_size, options.mode);
        let import_report = merge_outcome(&report, &outcome);
        info!(
            total = import_report.total_records,
            committed = import_report.success_count,
            failed = import_report.failed_count,
            mode = ?options.mode,
            "import committed"
        );

        self.stage = Stage::Committed {
            report: import_report,
            outcome,
        };
        match &self.stage {
            Stage::Committed { report, outcome } => Ok((report, outcome)),
            other => Err(transition(other, "commit")),
        }
    }
}

fn transition(stage: &Stage, action: &'static str) -> ImportError {
    ImportError::InvalidTransition {
        state: stage.state().label(),
        action,
    }
}

fn validate_table(table: &ParsedTable) -> ValidationReport {
    let mapping = map_fields(&table.headers);
    let mut records = table
        .rows
        .iter()
        .map(|row| validate_row(row, &mapping))
        .collect::<Vec<_>>();

    // The same doctor twice in one payload would race inside a commit batch.
    let mut first_seen: HashMap<DoctorId, usize> = HashMap::new();
    for record in &mut records {
        let Some(id) = record.record.as_ref().map(|doctor| doctor.id.clone()) else {
            continue;
        };
        match first_seen.get(&id) {
            Some(first_row) => {
                let issue = RowIssue::field(
                    record.row,
                    CanonicalField::Id,
                    format!("duplicate of row {first_row} ({id})"),
                );
                record.reject(issue);
            }
            None => {
                first_seen.insert(id, record.row);
            }
        }
    }

    ValidationReport { mapping, records }
}

fn merge_outcome(report: &ValidationReport, outcome: &CommitOutcome) -> ImportReport {
    let mut preview = report.preview();
    preview.success_count = outcome.committed.len();
    preview.failed_count = preview.total_records - preview.success_count;
    preview.errors.extend(outcome.failures.iter().map(|failure| {
        RowIssue::row(
            failure.row,
            format!("{}: {}", failure.doctor_id, failure.reason),
        )
    }));
    preview.errors.sort_by_key(|issue| issue.row);
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryDoctorRepository;

    const PAYLOAD: &str = "name,title,affiliation,department,total_followers\n\
        Wang Fang,主任医师,Union Hospital,Cardiology,820000\n\
        ,主治医师,City Hospital,Neurology,120000\n\
        Zhou Lei,住院医师,County Hospital,Surgery,9000\n";

    #[test]
    fn session_walks_through_every_stage() {
        let repository = InMemoryDoctorRepository::default();
        let mut session = ImportSession::upload(PAYLOAD);
        assert_eq!(session.state(), ImportState::Uploaded);

        assert_eq!(session.parse().expect("parse").rows.len(), 3);
        assert_eq!(session.state(), ImportState::Parsed);

        let report = session.validate().expect("validate");
        assert_eq!(report.valid().count(), 2);
        assert_eq!(report.invalid().count(), 1);
        assert_eq!(session.state(), ImportState::Validated);

        let (report, outcome) = session
            .commit(&repository, CommitOptions::default())
            .expect("commit");
        assert_eq!(report.total_records, 3);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.failed_count, 1);
        assert_eq!(
            report.errors,
            vec![RowIssue::field(2, CanonicalField::Name, "required")]
        );
        assert_eq!(outcome.committed.len(), 2);
        assert_eq!(session.state(), ImportState::Committed);
    }

    #[test]
    fn commit_requires_validation() {
        let repository = InMemoryDoctorRepository::default();
        let mut session = ImportSession::upload(PAYLOAD);

        let error = session
            .commit(&repository, CommitOptions::default())
            .expect_err("not validated yet");
        assert!(matches!(
            error,
            ImportError::InvalidTransition {
                state: "uploaded",
                action: "commit"
            }
        ));
        assert_eq!(session.state(), ImportState::Uploaded);
        assert!(repository.list().expect("list").is_empty());
    }

    #[test]
    fn discarded_session_can_restart_cleanly() {
        let mut session = ImportSession::upload("name\n");
        session.validate().expect("validate");
        session.discard();
        assert!(session.validate().is_err());

        session.restart(PAYLOAD);
        assert_eq!(session.state(), ImportState::Uploaded);
        assert_eq!(session.validate().expect("validate").records.len(), 3);
    }

    #[test]
    fn failed_parse_keeps_the_session_uploaded() {
        let mut session = ImportSession::upload("");
        assert!(matches!(session.parse(), Err(ImportError::EmptyInput)));
        assert_eq!(session.state(), ImportState::Uploaded);
    }

    #[test]
    fn duplicate_doctors_in_one_payload_are_rejected() {
        let payload = "id,name,title,affiliation,department\n\
            d-1,A,Resident,H,Surgery\n\
            d-1,B,Resident,H,Surgery\n";
        let mut session = ImportSession::upload(payload);
        let report = session.validate().expect("validate").preview();

        assert_eq!(report.success_count, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, 2);
        assert_eq!(report.errors[0].field.as_deref(), Some("id"));
    }

    #[test]
    fn errors_after_a_separator_row_point_at_the_source_row() {
        let payload = "name,title,affiliation,department\n\
            A,Resident,H,Surgery\n\
            ,,,\n\
            ,Resident,H,Surgery\n";
        let mut session = ImportSession::upload(payload);
        let report = session.validate().expect("validate").preview();

        assert_eq!(report.total_records, 2);
        assert_eq!(
            report.errors,
            vec![RowIssue::field(3, CanonicalField::Name, "required")]
        );
    }

    #[test]
    fn ignored_columns_surface_as_warnings() {
        let payload = "name,title,affiliation,department,shoe size\nA,Resident,H,Surgery,42\n";
        let mut session = ImportSession::upload(payload);
        let report = session.validate().expect("validate").preview();

        assert_eq!(report.warnings, vec!["column 'shoe size' was ignored"]);
    }

    #[test]
    fn template_round_trips_without_findings() {
        let csv = template().to_csv().expect("template renders");
        let mut session = ImportSession::upload(csv);
        let report = session.validate().expect("validate").preview();

        assert_eq!(report.total_records, 1);
        assert_eq!(report.success_count, 1);
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }
}
