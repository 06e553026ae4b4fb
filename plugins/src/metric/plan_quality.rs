use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use planeval_core::replay::{EvalItem, MetricVerdict, PlanQualityMetric, ReplayTrace};
use planeval_core::scoring::{
    complete_with_timeout, parse_judge_response, truncate_value, JudgeModel, PlanPrompt,
    ToolActivity, DEFAULT_JUDGE_TIMEOUT, DEFAULT_MAX_OUTPUT_CHARS,
};
use serde_json::Value;

/// Plan-quality metric over a finalized replay trace.
///
/// Reads the plan from the planning span and tool activity from the tool
/// spans, then asks the judge with the same rubric as the log scorer.
pub struct JudgePlanQualityMetric {
    judge: Arc<dyn JudgeModel>,
    threshold: f64,
    timeout: Duration,
    max_output_chars: usize,
}

impl JudgePlanQualityMetric {
    pub fn new(judge: Arc<dyn JudgeModel>, threshold: f64) -> Self {
        Self {
            judge,
            threshold,
            timeout: DEFAULT_JUDGE_TIMEOUT,
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_output_chars(mut self, max_output_chars: usize) -> Self {
        self.max_output_chars = max_output_chars;
        self
    }

    fn tool_activity(&self, trace: &ReplayTrace) -> Vec<ToolActivity> {
        trace
            .tool_spans()
            .map(|span| ToolActivity {
                name: span.name().to_string(),
                args: span.input().clone(),
                result: truncate_value(span.output(), self.max_output_chars),
            })
            .collect()
    }
}

fn as_text(v: &Value) -> &str {
    v.as_str().unwrap_or_default()
}

#[async_trait]
impl PlanQualityMetric for JudgePlanQualityMetric {
    fn name(&self) -> &str {
        "PlanQuality"
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    async fn measure(&self, item: &EvalItem) -> anyhow::Result<MetricVerdict> {
        let trace = &item.trace;
        let Some(planning) = trace.planning_span() else {
            anyhow::bail!("trace '{}' has no planning span", trace.name());
        };
        let tools = self.tool_activity(trace);
        let final_output = as_text(trace.output());
        let prompt = PlanPrompt {
            task: &item.golden.input,
            plan: as_text(planning.output()),
            tools: &tools,
            final_output: (!final_output.is_empty()).then_some(final_output),
        }
        .render();

        let response = complete_with_timeout(self.judge.as_ref(), &prompt, self.timeout).await?;
        let verdict = parse_judge_response(&response)?;
        tracing::debug!(
            target: "planeval.judge",
            stage = "metric.plan_quality.done",
            model = %self.judge.model_name(),
            tools = tools.len(),
            score = verdict.score
        );
        Ok(MetricVerdict {
            score: verdict.score,
            reason: verdict.reason,
        })
    }
}
