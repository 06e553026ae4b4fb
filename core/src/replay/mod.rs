pub mod engine;
pub mod instrumentation;
pub mod metric;
pub mod trace;

pub use engine::{ReplayEngine, ReplayOutcome, REPLAY_SOURCE};
pub use instrumentation::{
    DisabledInstrumentation, InMemoryInstrumentation, Instrumentation, TraceSession,
    DEFAULT_TRACE_NAME,
};
pub use metric::{evaluate, EvalItem, Evaluation, Golden, MetricVerdict, PlanQualityMetric};
pub use trace::{ReplayTrace, ScopeId, ScopeTags, Span, SpanKind, TraceBuilder};
