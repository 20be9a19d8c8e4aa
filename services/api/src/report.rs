use crate::infra::in_memory_service;
use clap::{Args, ValueEnum};
use doctor_ranker::config::AppConfig;
use doctor_ranker::error::AppError;
use doctor_ranker::workflows::import::{template, CommitMode, ImportReport};
use doctor_ranker::workflows::ranking::Standings;
use doctor_ranker::workflows::weights::WeightConfigDraft;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Roster export (CSV, TSV or semicolon separated) with a header row
    pub(crate) path: PathBuf,
    /// Write the valid rows and print the resulting standings. Without it the file is only validated.
    #[arg(long)]
    pub(crate) commit: bool,
    /// How rows whose doctor already exists are handled
    #[arg(long, value_enum, default_value_t = ModeArg::Upsert)]
    pub(crate) mode: ModeArg,
    /// JSON weight configuration to activate before scoring
    #[arg(long)]
    pub(crate) weights: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct TemplateArgs {
    /// Write the template here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ModeArg {
    Upsert,
    InsertOnly,
}

impl From<ModeArg> for CommitMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Upsert => CommitMode::Upsert,
            ModeArg::InsertOnly => CommitMode::InsertOnly,
        }
    }
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let raw = fs::read_to_string(&args.path)?;
    let service = in_memory_service(&config.ranking);

    if !args.commit {
        let report = service.preview_import(&raw)?;
        println!("Import preview for {}", args.path.display());
        print!("{}", format_import_report(&report));
        return Ok(());
    }

    if let Some(path) = args.weights.as_deref() {
        let mut draft = load_weights(path)?;
        draft.is_default = true;
        let record = service.save_configuration(draft)?;
        println!("Activated weight configuration '{}' ({})", record.name, record.id);
    }

    let result = service.import(&raw, args.mode.into())?;
    println!("Import of {}", args.path.display());
    print!("{}", format_import_report(&result.report));
    if let Some(recalculation) = &result.recalculation {
        if !recalculation.failed.is_empty() {
            println!(
                "- {} doctors could not be scored and are listed as unscored",
                recalculation.failed.len()
            );
        }
    }
    print!("{}", format_standings(&service.standings()));
    Ok(())
}

pub(crate) fn run_template(args: TemplateArgs) -> Result<(), AppError> {
    let csv = template().to_csv()?;
    match args.output {
        Some(path) => {
            fs::write(&path, csv)?;
            println!("Template written to {}", path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

fn load_weights(path: &Path) -> Result<WeightConfigDraft, AppError> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|err| {
        AppError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is not a weight configuration: {err}", path.display()),
        ))
    })
}

pub(crate) fn format_import_report(report: &ImportReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "- {} rows | {} accepted | {} rejected",
        report.total_records, report.success_count, report.failed_count
    );
    if !report.errors.is_empty() {
        let _ = writeln!(out, "Errors:");
        for issue in &report.errors {
            match &issue.field {
                Some(field) => {
                    let _ = writeln!(out, "  - row {} {}: {}", issue.row, field, issue.message);
                }
                None => {
                    let _ = writeln!(out, "  - row {}: {}", issue.row, issue.message);
                }
            }
        }
    }
    if !report.warnings.is_empty() {
        let _ = writeln!(out, "Warnings:");
        for warning in &report.warnings {
            let _ = writeln!(out, "  - {warning}");
        }
    }
    out
}

pub(crate) fn format_standings(standings: &Standings) -> String {
    let mut out = String::new();
    let label = match standings.configuration_id {
        Some(id) => format!("configuration {id}"),
        None => "system default weights".to_string(),
    };
    let _ = writeln!(out, "\nStandings under {label}");
    if standings.stale {
        let _ = writeln!(out, "  (stale: metrics changed since the last recalculation)");
    }
    for entry in &standings.entries {
        let rank = entry
            .rank
            .map(|rank| rank.to_string())
            .unwrap_or_else(|| "-".to_string());
        let components = entry
            .sub_scores
            .iter()
            .map(|(component, score)| format!("{component} {score:.1}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            out,
            "  {rank:>3}. {} {:.1} [{}] {components}",
            entry.id,
            entry.composite_score,
            entry.tier.label()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctor_ranker::workflows::import::RowIssue;

    #[test]
    fn report_lists_errors_and_warnings() {
        let report = ImportReport {
            total_records: 3,
            success_count: 2,
            failed_count: 1,
            errors: vec![RowIssue {
                row: 2,
                field: Some("name".to_string()),
                message: "required".to_string(),
            }],
            warnings: vec!["row 3: response_rate value 150 clamped to 100".to_string()],
        };

        let rendered = format_import_report(&report);

        assert!(rendered.starts_with("- 3 rows | 2 accepted | 1 rejected"));
        assert!(rendered.contains("  - row 2 name: required"));
        assert!(rendered.contains("response_rate value 150 clamped to 100"));
    }

    #[test]
    fn empty_standings_name_default_weights() {
        let standings = Standings {
            configuration_id: None,
            stale: true,
            entries: Vec::new(),
        };

        let rendered = format_standings(&standings);

        assert!(rendered.contains("system default weights"));
        assert!(rendered.contains("stale"));
    }
}
