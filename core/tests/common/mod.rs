#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use planeval_core::error::{InstrumentationError, JudgeError};
use planeval_core::replay::{
    EvalItem, Instrumentation, MetricVerdict, PlanQualityMetric, ReplayTrace, ScopeId, ScopeTags,
    SpanKind, TraceBuilder, TraceSession,
};
use planeval_core::scoring::{parse_judge_response, JudgeModel, PlanPrompt, ToolActivity};

pub const ORDER_TASK: &str = "I want to order 2 laptops to Jakarta, use discount code WELCOME10, \
                              pay with credit card, email: john@example.com";

pub const GENERIC_PLAN: &str =
    "Check inventory → Apply discount → Calculate shipping → Process payment → Send confirmation";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("planeval=debug")
        .with_test_writer()
        .try_init();
}

/// Judge that answers every prompt through `reply` and keeps the prompts.
pub struct ScriptedJudge {
    reply: Box<dyn Fn(&str) -> Result<String, JudgeError> + Send + Sync>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedJudge {
    pub fn new<F>(reply: F) -> Arc<Self>
    where
        F: Fn(&str) -> Result<String, JudgeError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            reply: Box::new(reply),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn constant(text: &str) -> Arc<Self> {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl JudgeModel for ScriptedJudge {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String, JudgeError> {
        if let Ok(mut p) = self.prompts.lock() {
            p.push(prompt.to_string());
        }
        (self.reply)(prompt)
    }
}

/// Task details a specific plan for `ORDER_TASK` mentions.
pub const ORDER_DETAILS: &[&str] = &[
    "LAPTOP-001",
    "WELCOME10",
    "Jakarta",
    "credit_card",
    "john@example.com",
];

/// Scores only the "Plan:" section of a prompt: 0.25 for a plan naming none
/// of `ORDER_DETAILS`, plus 0.15 per detail named.
pub fn specificity_judge() -> Arc<ScriptedJudge> {
    ScriptedJudge::new(|prompt| {
        let plan = plan_section(prompt);
        let hits = ORDER_DETAILS.iter().filter(|d| plan.contains(*d)).count();
        let score = 0.25 + 0.15 * hits as f64;
        Ok(format!(
            "Evaluation follows.\n```json\n{{\"score\": {score}, \"reason\": \"{hits} task details referenced\"}}\n```"
        ))
    })
}

pub fn plan_section(prompt: &str) -> &str {
    let Some(start) = prompt.find("Plan:\n") else {
        return "";
    };
    let rest = &prompt[start + "Plan:\n".len()..];
    match rest.find("\n\nTools executed:") {
        Some(end) => &rest[..end],
        None => rest,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScopeOp {
    OpenTrace(ScopeId),
    OpenChild(ScopeId, SpanKind, String),
    Close(ScopeId),
    Finish,
}

/// In-memory instrumentation that also logs every scope operation.
#[derive(Clone, Default)]
pub struct RecordingInstrumentation {
    pub ops: Arc<Mutex<Vec<ScopeOp>>>,
}

impl RecordingInstrumentation {
    pub fn ops(&self) -> Vec<ScopeOp> {
        self.ops.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

struct RecordingSession {
    inner: TraceBuilder,
    ops: Arc<Mutex<Vec<ScopeOp>>>,
}

impl RecordingSession {
    fn record(&self, op: ScopeOp) {
        if let Ok(mut ops) = self.ops.lock() {
            ops.push(op);
        }
    }
}

impl TraceSession for RecordingSession {
    fn open_trace_scope(&mut self, input: Value) -> Result<ScopeId, InstrumentationError> {
        let id = self.inner.open_trace_scope(input)?;
        self.record(ScopeOp::OpenTrace(id));
        Ok(id)
    }

    fn open_child_scope(
        &mut self,
        kind: SpanKind,
        name: &str,
    ) -> Result<ScopeId, InstrumentationError> {
        let id = self.inner.open_child_scope(kind, name)?;
        self.record(ScopeOp::OpenChild(id, kind, name.to_string()));
        Ok(id)
    }

    fn close_scope(&mut self, id: ScopeId, tags: ScopeTags) -> Result<(), InstrumentationError> {
        self.inner.close_scope(id, tags)?;
        self.record(ScopeOp::Close(id));
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<ReplayTrace, InstrumentationError> {
        self.record(ScopeOp::Finish);
        let this = *self;
        this.inner.finish()
    }
}

impl Instrumentation for RecordingInstrumentation {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn session(&self) -> Result<Box<dyn TraceSession>, InstrumentationError> {
        Ok(Box::new(RecordingSession {
            inner: TraceBuilder::new("ReplayAgentTrace"),
            ops: self.ops.clone(),
        }))
    }
}

/// Plan-quality metric that reads the trace and asks a judge, the way a
/// built-in metric would.
pub struct TraceJudgeMetric {
    pub judge: Arc<dyn JudgeModel>,
    pub threshold: f64,
    pub seen: Mutex<Vec<ReplayTrace>>,
}

impl TraceJudgeMetric {
    pub fn new(judge: Arc<dyn JudgeModel>) -> Arc<Self> {
        Arc::new(Self {
            judge,
            threshold: 0.5,
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PlanQualityMetric for TraceJudgeMetric {
    fn name(&self) -> &str {
        "trace_judge"
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    async fn measure(&self, item: &EvalItem) -> anyhow::Result<MetricVerdict> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(item.trace.clone());
        }
        let plan = item
            .trace
            .planning_span()
            .and_then(|s| s.output().as_str())
            .unwrap_or_default()
            .to_string();
        let tools: Vec<ToolActivity> = item
            .trace
            .tool_spans()
            .map(|s| ToolActivity {
                name: s.name().to_string(),
                args: s.input().clone(),
                result: s.output().clone(),
            })
            .collect();
        let prompt = PlanPrompt {
            task: &item.golden.input,
            plan: &plan,
            tools: &tools,
            final_output: item.trace.output().as_str(),
        }
        .render();
        let text = self.judge.complete(&prompt).await?;
        let verdict = parse_judge_response(&text)?;
        Ok(MetricVerdict {
            score: verdict.score,
            reason: verdict.reason,
        })
    }
}

pub struct FailingMetric;

#[async_trait]
impl PlanQualityMetric for FailingMetric {
    fn name(&self) -> &str {
        "failing"
    }

    fn threshold(&self) -> f64 {
        0.5
    }

    async fn measure(&self, _item: &EvalItem) -> anyhow::Result<MetricVerdict> {
        anyhow::bail!("metric backend rejected the trace")
    }
}
