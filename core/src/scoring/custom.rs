use std::sync::Arc;
use std::time::Duration;

use crate::error::EvalError;
use crate::event::{EventsExt, StreamEvent};
use crate::plan::{reconstruct, ReconstructedPlan};
use crate::task::TaskDescriptor;

use super::judge::{complete_with_timeout, JudgeModel};
use super::prompt::{summarize_tool_activity, PlanPrompt};
use super::response::parse_judge_response;
use super::result::ScoreResult;

pub const DEFAULT_MAX_OUTPUT_CHARS: usize = 500;
pub const DEFAULT_JUDGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Scores plan quality straight from parsed events, without any
/// instrumentation. One judge call per run.
pub struct CustomPlanScorer {
    judge: Arc<dyn JudgeModel>,
    timeout: Duration,
    max_output_chars: usize,
    include_final_output: bool,
}

impl CustomPlanScorer {
    pub fn new(judge: Arc<dyn JudgeModel>) -> Self {
        Self {
            judge,
            timeout: DEFAULT_JUDGE_TIMEOUT,
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
            include_final_output: true,
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

    pub fn with_final_output(mut self, include: bool) -> Self {
        self.include_final_output = include;
        self
    }

    pub fn name(&self) -> &'static str {
        "PlanQualityFromLogs"
    }

    pub async fn score_from_logs(
        &self,
        events: &[StreamEvent],
        task: &TaskDescriptor,
        threshold: f64,
    ) -> Result<ScoreResult, EvalError> {
        let plan = reconstruct(events, task);
        self.score_plan(events, task, &plan, None, threshold).await
    }

    /// Same as `score_from_logs` for a plan the caller already reconstructed.
    /// `final_answer`, when given, replaces the one found in `events`.
    pub async fn score_plan(
        &self,
        events: &[StreamEvent],
        task: &TaskDescriptor,
        plan: &ReconstructedPlan,
        final_answer: Option<&str>,
        threshold: f64,
    ) -> Result<ScoreResult, EvalError> {
        let tools = summarize_tool_activity(events, self.max_output_chars);
        let final_output = if self.include_final_output {
            final_answer.or_else(|| events.final_answer())
        } else {
            None
        };
        let prompt = PlanPrompt {
            task: &task.text,
            plan: plan.text(),
            tools: &tools,
            final_output,
        }
        .render();

        let response = complete_with_timeout(self.judge.as_ref(), &prompt, self.timeout).await?;
        let verdict = parse_judge_response(&response)?;
        let result = ScoreResult::new(verdict.score, verdict.reason, threshold);

        tracing::info!(
            target: "planeval.score",
            stage = "score.custom.done",
            plan_source = plan.source().as_str(),
            tools = tools.len(),
            raw_score = verdict.score,
            score = result.score(),
            passed = result.passed()
        );
        Ok(result)
    }
}
