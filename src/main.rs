use clap::Parser;
use log::{debug, warn};
use snafu::ErrorCompat;

use survey_flow::CommitOutcome;

mod args;
mod survey;

use crate::args::Args;
use crate::survey::SurveyResult;

fn run(args: &Args) -> SurveyResult<i32> {
    if let Some(sheet_path) = &args.audit {
        let report = survey::run_audit(args, sheet_path)?;
        debug!("main: audit report: {:?}", report);
        return Ok(if report.problems.is_empty() { 0 } else { 3 });
    }
    match survey::run_session(args)? {
        Some(CommitOutcome::Saved { subject_id }) => {
            println!("Response saved for subject {}", subject_id);
            Ok(0)
        }
        Some(CommitOutcome::Failed {
            subject_id,
            message,
        }) => {
            eprintln!(
                "The response of subject {:?} could not be saved: {}",
                subject_id, message
            );
            Ok(2)
        }
        None => {
            println!("Survey left before the end, nothing was saved");
            Ok(0)
        }
    }
}

fn main() {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    debug!("main: args: {:?}", args);

    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            warn!("Error occured {:?}", e);
            eprintln!("An error occured {}", e);
            if let Some(bt) = ErrorCompat::backtrace(&e) {
                eprintln!("trace: {}", bt);
            }
            std::process::exit(1);
        }
    }
}
