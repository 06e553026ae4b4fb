//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `planeval_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load_default, load_from_path, AppConfig, InstrumentationKind, JudgeConfig, JudgeProvider,
    JudgeServiceConfig, LoggingConfig, ReplayConfig, ScoringConfig,
};
pub use crate::error::{
    CliError, ErrorCode, EvalError, InstrumentationError, JudgeError, MalformedLogError,
    MalformedLogKind,
};
pub use crate::event::{EventKind, EventPayload, EventsExt, StreamEvent, ToolCall};
pub use crate::pipeline::{build_report, format_text, Evaluator, Pipeline, RunError, RunReport, Scored};
pub use crate::plan::{reconstruct, PlanSource, ReconstructedPlan};
pub use crate::replay::{
    evaluate, DisabledInstrumentation, EvalItem, Golden, InMemoryInstrumentation, Instrumentation,
    MetricVerdict, PlanQualityMetric, ReplayEngine, ReplayOutcome, ReplayTrace, ScopeTags, Span,
    SpanKind, TraceSession,
};
pub use crate::scoring::{
    parse_judge_response, CustomPlanScorer, JudgeModel, JudgeVerdict, PlanPrompt, ScoreResult,
    ToolActivity,
};
pub use crate::stream_log::{
    parse, parse_lenient, parse_lines, parse_log_str, parse_log_str_lenient, ParseOptions,
    ParseOutcome, PreToolText, RawRecord, TextChannel,
};
pub use crate::task::TaskDescriptor;
