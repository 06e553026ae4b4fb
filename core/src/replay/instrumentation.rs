use serde_json::Value;

use crate::error::InstrumentationError;

use super::trace::{ReplayTrace, ScopeId, ScopeTags, SpanKind, TraceBuilder};

pub const DEFAULT_TRACE_NAME: &str = "ReplayAgentTrace";

/// Scope operations of one instrumented run. Used by a single replay at a
/// time, in event order.
pub trait TraceSession: Send {
    fn open_trace_scope(&mut self, input: Value) -> Result<ScopeId, InstrumentationError>;

    fn open_child_scope(&mut self, kind: SpanKind, name: &str)
        -> Result<ScopeId, InstrumentationError>;

    fn close_scope(&mut self, id: ScopeId, tags: ScopeTags) -> Result<(), InstrumentationError>;

    /// Finalizes the trace. Called by the evaluation entry point only.
    fn finish(self: Box<Self>) -> Result<ReplayTrace, InstrumentationError>;
}

/// The tracing container a replay runs inside.
pub trait Instrumentation: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fails with `Unavailable` when the container cannot be opened.
    fn session(&self) -> Result<Box<dyn TraceSession>, InstrumentationError>;
}

impl TraceSession for TraceBuilder {
    fn open_trace_scope(&mut self, input: Value) -> Result<ScopeId, InstrumentationError> {
        TraceBuilder::open_trace_scope(self, input)
    }

    fn open_child_scope(
        &mut self,
        kind: SpanKind,
        name: &str,
    ) -> Result<ScopeId, InstrumentationError> {
        TraceBuilder::open_child_scope(self, kind, name)
    }

    fn close_scope(&mut self, id: ScopeId, tags: ScopeTags) -> Result<(), InstrumentationError> {
        TraceBuilder::close_scope(self, id, tags)
    }

    fn finish(self: Box<Self>) -> Result<ReplayTrace, InstrumentationError> {
        TraceBuilder::finish(*self)
    }
}

/// Builds traces in process.
#[derive(Debug, Clone)]
pub struct InMemoryInstrumentation {
    trace_name: String,
}

impl InMemoryInstrumentation {
    pub fn new(trace_name: impl Into<String>) -> Self {
        Self {
            trace_name: trace_name.into(),
        }
    }
}

impl Default for InMemoryInstrumentation {
    fn default() -> Self {
        Self::new(DEFAULT_TRACE_NAME)
    }
}

impl Instrumentation for InMemoryInstrumentation {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    fn session(&self) -> Result<Box<dyn TraceSession>, InstrumentationError> {
        Ok(Box::new(TraceBuilder::new(self.trace_name.clone())))
    }
}

/// Stands in for a container that is not configured. Every session fails.
#[derive(Debug, Clone)]
pub struct DisabledInstrumentation {
    reason: String,
}

impl DisabledInstrumentation {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for DisabledInstrumentation {
    fn default() -> Self {
        Self::new("instrumentation disabled by configuration")
    }
}

impl Instrumentation for DisabledInstrumentation {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn session(&self) -> Result<Box<dyn TraceSession>, InstrumentationError> {
        Err(InstrumentationError::Unavailable(self.reason.clone()))
    }
}
