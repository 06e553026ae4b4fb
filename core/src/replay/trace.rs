use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::InstrumentationError;

/// Handle to a scope opened on a trace session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeId(usize);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    Agent,
    Planning,
    Tool,
}

/// Annotations applied when a scope closes. Unset fields leave the scope
/// as it was.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeTags {
    input: Option<Value>,
    output: Option<Value>,
    tools_called: Option<Vec<String>>,
    metadata: Option<Value>,
}

impl ScopeTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, v: impl Into<Value>) -> Self {
        self.input = Some(v.into());
        self
    }

    pub fn output(mut self, v: impl Into<Value>) -> Self {
        self.output = Some(v.into());
        self
    }

    /// Only meaningful on the trace scope.
    pub fn tools_called(mut self, names: Vec<String>) -> Self {
        self.tools_called = Some(names);
        self
    }

    /// Only meaningful on the trace scope.
    pub fn metadata(mut self, v: Value) -> Self {
        self.metadata = Some(v);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Span {
    id: String,
    parent: Option<String>,
    kind: SpanKind,
    name: String,
    input: Value,
    output: Value,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    open_index: usize,
    close_index: usize,
}

impl Span {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> &Value {
        &self.input
    }

    pub fn output(&self) -> &Value {
        &self.output
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    /// Position of this span's open among all scope operations.
    pub fn open_index(&self) -> usize {
        self.open_index
    }

    /// Position of this span's close among all scope operations.
    pub fn close_index(&self) -> usize {
        self.close_index
    }
}

/// A finalized, pipeline-valid trace. Only `TraceBuilder::finish` makes one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayTrace {
    trace_id: String,
    name: String,
    input: Value,
    output: Value,
    tools_called: Vec<String>,
    metadata: Value,
    spans: Vec<Span>,
}

impl ReplayTrace {
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> &Value {
        &self.input
    }

    pub fn output(&self) -> &Value {
        &self.output
    }

    pub fn tools_called(&self) -> &[String] {
        &self.tools_called
    }

    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    /// Spans in open order; the trace's own agent span comes first.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn planning_span(&self) -> Option<&Span> {
        self.spans.iter().find(|s| s.kind == SpanKind::Planning)
    }

    pub fn tool_spans(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter().filter(|s| s.kind == SpanKind::Tool)
    }
}

struct OpenScope {
    span_id: String,
    parent: Option<String>,
    kind: SpanKind,
    name: String,
    input: Value,
    output: Value,
    started_at: DateTime<Utc>,
    open_index: usize,
    closed: Option<(DateTime<Utc>, usize)>,
}

/// Builds a trace from scope operations, strictly in order.
///
/// Scopes nest: a child opens inside the innermost open scope and must close
/// before its parent. Closing anything but the innermost scope is rejected.
pub struct TraceBuilder {
    name: String,
    trace_id: String,
    scopes: Vec<OpenScope>,
    stack: Vec<ScopeId>,
    ops: usize,
    tools_called: Vec<String>,
    metadata: Value,
}

impl TraceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trace_id: Uuid::new_v4().to_string(),
            scopes: Vec::new(),
            stack: Vec::new(),
            ops: 0,
            tools_called: Vec::new(),
            metadata: Value::Null,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Number of scopes currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn open_trace_scope(&mut self, input: Value) -> Result<ScopeId, InstrumentationError> {
        if !self.scopes.is_empty() {
            return Err(InstrumentationError::TraceAlreadyOpen);
        }
        let name = self.name.clone();
        Ok(self.push_scope(SpanKind::Agent, name, input))
    }

    pub fn open_child_scope(
        &mut self,
        kind: SpanKind,
        name: &str,
    ) -> Result<ScopeId, InstrumentationError> {
        if self.stack.is_empty() {
            return Err(InstrumentationError::NoOpenTrace);
        }
        Ok(self.push_scope(kind, name.to_string(), Value::Null))
    }

    pub fn close_scope(&mut self, id: ScopeId, tags: ScopeTags) -> Result<(), InstrumentationError> {
        let Some(&innermost) = self.stack.last() else {
            return Err(InstrumentationError::NoOpenTrace);
        };
        if innermost != id {
            return Err(InstrumentationError::OutOfOrderClose {
                closing: id.index(),
                innermost: innermost.index(),
            });
        }
        self.stack.pop();

        let close_index = self.next_op();
        let scope = &mut self.scopes[id.index()];
        if let Some(input) = tags.input {
            scope.input = input;
        }
        if let Some(output) = tags.output {
            scope.output = output;
        }
        scope.closed = Some((Utc::now(), close_index));
        let kind = scope.kind;

        if kind == SpanKind::Agent {
            if let Some(names) = tags.tools_called {
                self.tools_called = names;
            }
            if let Some(meta) = tags.metadata {
                self.metadata = meta;
            }
        }
        tracing::debug!(
            target: "planeval.replay",
            stage = "replay.scope.close",
            scope = id.index(),
            kind = ?kind,
            op = close_index
        );
        Ok(())
    }

    pub fn finish(self) -> Result<ReplayTrace, InstrumentationError> {
        if !self.stack.is_empty() {
            return Err(InstrumentationError::ScopesStillOpen(self.stack.len()));
        }
        let mut scopes = self.scopes.into_iter();
        let Some(root) = scopes.next() else {
            return Err(InstrumentationError::NoOpenTrace);
        };
        let input = root.input.clone();
        let output = root.output.clone();

        let spans: Vec<Span> = std::iter::once(root)
            .chain(scopes)
            .filter_map(|s| {
                let (ended_at, close_index) = s.closed?;
                Some(Span {
                    id: s.span_id,
                    parent: s.parent,
                    kind: s.kind,
                    name: s.name,
                    input: s.input,
                    output: s.output,
                    started_at: s.started_at,
                    ended_at,
                    open_index: s.open_index,
                    close_index,
                })
            })
            .collect();

        tracing::debug!(
            target: "planeval.replay",
            stage = "replay.trace.finish",
            trace_id = %self.trace_id,
            spans = spans.len()
        );
        Ok(ReplayTrace {
            trace_id: self.trace_id,
            name: self.name,
            input,
            output,
            tools_called: self.tools_called,
            metadata: self.metadata,
            spans,
        })
    }

    fn next_op(&mut self) -> usize {
        let op = self.ops;
        self.ops += 1;
        op
    }

    fn push_scope(&mut self, kind: SpanKind, name: String, input: Value) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        let open_index = self.next_op();
        let parent = self
            .stack
            .last()
            .map(|p| self.scopes[p.index()].span_id.clone());
        tracing::debug!(
            target: "planeval.replay",
            stage = "replay.scope.open",
            scope = id.index(),
            kind = ?kind,
            name = %name,
            op = open_index
        );
        self.scopes.push(OpenScope {
            span_id: Uuid::new_v4().to_string(),
            parent,
            kind,
            name,
            input,
            output: Value::Null,
            started_at: Utc::now(),
            open_index,
            closed: None,
        });
        self.stack.push(id);
        id
    }
}
