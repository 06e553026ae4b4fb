pub mod batch;
pub mod cli;
pub mod inspect;
pub mod score;

use std::path::Path;

use planeval_core::error::{CliError, EvalError};
use planeval_core::event::StreamEvent;
use planeval_core::pipeline::{build_report, format_text, RunReport};
use planeval_core::stream_log::{parse_log_str, parse_log_str_lenient, ParseOptions};

use cli::OutputFormat;

pub(crate) async fn read_log(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        CliError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read {}: {e}", path.display()),
        ))
    })
}

/// Parses a log, reporting a malformed tail on stderr when `lenient`.
pub(crate) fn parse_events(
    log: &str,
    opts: &ParseOptions,
    lenient: bool,
) -> Result<Vec<StreamEvent>, CliError> {
    if !lenient {
        return parse_log_str(log, opts).map_err(|e| CliError::Eval(EvalError::from(e)));
    }
    let outcome = parse_log_str_lenient(log, opts);
    if let Some(w) = outcome.warning {
        eprintln!("warning: {w}; continuing with {} event(s)", outcome.events.len());
    }
    Ok(outcome.events)
}

pub(crate) fn print_report(runs: &[RunReport], format: OutputFormat) -> Result<(), CliError> {
    let report = build_report(runs);
    match format {
        OutputFormat::Json => {
            let s = serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::Command(e.to_string()))?;
            println!("{s}");
        }
        OutputFormat::Text => print!("{}", format_text(&report)),
    }
    Ok(())
}

/// Exit code of the first failed run, in report order.
pub(crate) fn exit_code_for_runs(runs: &[RunReport]) -> i32 {
    runs.iter()
        .find_map(|r| r.error.as_ref())
        .map(|e| i32::from(e.code))
        .unwrap_or(0)
}
