use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_flow::*;

use std::io;
use std::path::{Path, PathBuf};

use crate::args::Args;
use crate::survey::audit::AuditReport;
use crate::survey::config_reader::*;
use crate::survey::io_common::ExpertLabels;
use crate::survey::renderer::*;
use crate::survey::scripted::ScriptedRenderer;
use crate::survey::terminal::TerminalRenderer;

mod audit;
pub mod config_reader;
mod io_common;
mod io_csv;
mod io_jsonl;
mod io_xlsx;
pub mod renderer;
mod scripted;
mod terminal;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error parsing JSON content at line {lineno}"))]
    ParsingJsonLine {
        source: serde_json::Error,
        lineno: usize,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error opening response sheet {path}"))]
    OpeningSheet {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading or writing the CSV sheet {path}"))]
    CsvSheet { source: csv::Error, path: String },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file has no worksheet to read"))]
    EmptyExcel {},
    #[snafu(display("Excel line {lineno}: could not understand cell {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Error reading or writing the terminal"))]
    Terminal { source: std::io::Error },
    #[snafu(display("{source}"))]
    Flow { source: FlowErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// Runs one session from the first page to the last one.
///
/// Rejected actions are reported to the renderer and the respondent can try
/// again. Returns `None` when the respondent leaves before the end, in which
/// case nothing is stored.
pub fn run_survey<R: FormRenderer, S: ResponseSink + ?Sized>(
    config: &SurveyConfig,
    session: &mut Session,
    renderer: &mut R,
    sink: &mut S,
) -> SurveyResult<Option<CommitOutcome>> {
    while !session.is_finished() {
        let action = {
            let view = page_view(config, session);
            renderer.render(&view)?;
            renderer.read_action(&view)?
        };
        debug!("run_survey: page {:?} action {:?}", session.page(), action);
        let res = match action {
            UserAction::SetExpert(value) => record_expert_flag(session, value),
            UserAction::SetRanking { index, value } => update_ranking(session, index, value),
            UserAction::SetRating { index, value } => update_rating(session, index, value),
            UserAction::Confirm if session.page() == Page::Ratings => {
                finish(session, sink).map(|_| ())
            }
            UserAction::Confirm => advance(session).map(|_| ()),
            UserAction::Quit => {
                info!(
                    "The respondent left on page {:?}, nothing is saved",
                    session.page()
                );
                return Ok(None);
            }
        };
        if let Err(e) = res {
            warn!("run_survey: rejected {:?}: {}", action, e);
            renderer.reject(&guidance(config, &e))?;
        }
    }

    // Showing the terminal page again must not store a second row.
    commit_once(session, sink).context(FlowSnafu {})?;
    let view = page_view(config, session);
    renderer.render(&view)?;
    Ok(session.commit_outcome().cloned())
}

fn load_config(config_path: &Option<String>) -> SurveyResult<(SurveyConfig, PathBuf)> {
    match config_path {
        Some(path) => {
            let config = read_config(path)?;
            let root = Path::new(path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            Ok((config, root))
        }
        None => {
            info!("No configuration provided, using the built-in suture survey");
            Ok((SurveyConfig::default(), PathBuf::new()))
        }
    }
}

fn open_sink(
    config: &SurveyConfig,
    rules: &SurveyRules,
    root: &Path,
    args: &Args,
) -> SurveyResult<Box<dyn ResponseSink>> {
    let provider = args
        .out_type
        .clone()
        .unwrap_or_else(|| config.response_sheet.provider.clone());
    let p: PathBuf = match &args.out {
        Some(out) => PathBuf::from(out),
        None => root.join(&config.response_sheet.file_path),
    };
    let p2 = p.as_path().display().to_string();
    info!("Responses are appended to {:?} ({})", p2, provider);
    let labels = expert_labels(config);
    match provider.as_str() {
        "csv" => Ok(Box::new(io_csv::CsvSheet::new(p2, rules, labels))),
        "jsonl" => Ok(Box::new(io_jsonl::JsonLinesSheet::new(p2, labels))),
        x => whatever!("Sheet provider not implemented {:?}", x),
    }
}

/// Runs one interactive (or scripted) session as described by the arguments.
pub fn run_session(args: &Args) -> SurveyResult<Option<CommitOutcome>> {
    let (config, root) = load_config(&args.config)?;
    let rules = validate_config(&config)?;
    info!("Survey {:?}: {:?}", config.survey_name, rules);

    let mut sink = open_sink(&config, &rules, &root, args)?;
    let mut session = Session::new(&rules).context(FlowSnafu {})?;

    if let Some(answers_path) = &args.answers {
        let mut renderer = ScriptedRenderer::from_path(answers_path)?;
        let res = run_survey(&config, &mut session, &mut renderer, sink.as_mut())?;
        for msg in renderer.rejected() {
            warn!("The scripted answers were rejected: {}", msg);
        }
        // A replay has no respondent who could fix the answers.
        if res.is_none() {
            whatever!(
                "The scripted answers in {} stopped on page {:?}: {}",
                answers_path,
                session.page(),
                renderer.rejected().join(" / ")
            );
        }
        Ok(res)
    } else {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut renderer = TerminalRenderer::new(stdin.lock(), stdout.lock());
        run_survey(&config, &mut session, &mut renderer, sink.as_mut())
    }
}

fn provider_from_extension(path: &str) -> String {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("xlsx") => "xlsx".to_string(),
        Some("jsonl") | Some("json") => "jsonl".to_string(),
        _ => "csv".to_string(),
    }
}

/// Checks every row of an existing response sheet and prints the report in
/// JSON format.
pub fn run_audit(args: &Args, sheet_path: &str) -> SurveyResult<AuditReport> {
    let (config, _) = load_config(&args.config)?;
    let rules = validate_config(&config)?;
    let labels: ExpertLabels = expert_labels(&config);
    let provider = args
        .out_type
        .clone()
        .unwrap_or_else(|| provider_from_extension(sheet_path));
    info!("Auditing {:?} ({})", sheet_path, provider);
    let rows = match provider.as_str() {
        "csv" => io_csv::read_csv_sheet(sheet_path, &rules, &labels)?,
        "jsonl" => io_jsonl::read_jsonl_sheet(sheet_path, &rules, &labels)?,
        "xlsx" => io_xlsx::read_excel_sheet(
            sheet_path,
            args.excel_worksheet_name.clone(),
            &rules,
            &labels,
        )?,
        x => whatever!("Sheet provider not implemented {:?}", x),
    };
    let report = audit::audit_rows(&rows, &rules);
    for p in report.problems.iter() {
        warn!("line {}: {}", p.line, p.problem);
    }
    let pretty_js = serde_json::to_string_pretty(&report).context(ParsingJsonSnafu {})?;
    println!("{}", pretty_js);
    Ok(report)
}
