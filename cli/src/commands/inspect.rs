use planeval_core::config::AppConfig;
use planeval_core::error::CliError;
use planeval_core::event::{EventPayload, StreamEvent};
use planeval_core::plan::reconstruct;
use planeval_core::task::TaskDescriptor;

use super::cli::{OutputFormat, ParseArgs, PlanArgs};
use super::{parse_events, read_log};

const TEXT_PREVIEW_CHARS: usize = 80;

fn preview(s: &str) -> String {
    let one_line = s.replace('\n', " ");
    if one_line.chars().count() <= TEXT_PREVIEW_CHARS {
        return one_line;
    }
    let head: String = one_line.chars().take(TEXT_PREVIEW_CHARS).collect();
    format!("{head}…")
}

fn describe_event(e: &StreamEvent) -> String {
    let detail = match &e.payload {
        EventPayload::Planning { text } | EventPayload::FinalAnswer { text } => preview(text),
        EventPayload::ToolCall(call) => format!(
            "{} [{}] args={} output={}",
            call.name,
            call.call_id,
            call.args,
            preview(&call.output.to_string())
        ),
    };
    format!("{:>4}  {:<12} {}", e.seq, e.kind().as_str(), detail)
}

pub async fn run_parse(args: ParseArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let log = read_log(&args.log.log).await?;
    let events = parse_events(&log, &cfg.parser, args.log.lenient)?;
    tracing::info!(
        target: "planeval.parse",
        stage = "parse.done",
        events = events.len()
    );

    match args.format {
        OutputFormat::Json => {
            let s = serde_json::to_string_pretty(&events)
                .map_err(|e| CliError::Command(e.to_string()))?;
            println!("{s}");
        }
        OutputFormat::Text => {
            for e in &events {
                println!("{}", describe_event(e));
            }
        }
    }
    Ok(0)
}

pub async fn run_plan(args: PlanArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let log = read_log(&args.log.log).await?;
    let events = parse_events(&log, &cfg.parser, args.log.lenient)?;
    let task = TaskDescriptor::from_text(args.task);
    let plan = reconstruct(&events, &task);

    println!("source: {}", plan.source().as_str());
    for (i, step) in plan.steps().iter().enumerate() {
        println!("{:>2}. {step}", i + 1);
    }
    Ok(0)
}
