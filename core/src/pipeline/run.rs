use crate::error::EvalError;
use crate::event::{EventsExt, StreamEvent};
use crate::plan::{reconstruct, PlanSource};
use crate::replay::ReplayEngine;
use crate::scoring::{CustomPlanScorer, ScoreResult};
use crate::stream_log::{parse_log_str, ParseOptions};
use crate::task::TaskDescriptor;

use super::model::{Pipeline, RunError, RunReport};

/// A scored run and how it was scored.
#[derive(Debug, Clone)]
pub struct Scored {
    pub result: ScoreResult,
    pub scored_by: Pipeline,
    pub plan_source: PlanSource,
}

/// Runs either pipeline for one agent run, falling back from replay to the
/// custom scorer when instrumentation is unavailable and fallback is on.
pub struct Evaluator {
    replay: Option<ReplayEngine>,
    scorer: CustomPlanScorer,
    threshold: f64,
    fallback_to_custom: bool,
    parse: ParseOptions,
    lenient: bool,
}

impl Evaluator {
    pub fn new(scorer: CustomPlanScorer, threshold: f64) -> Self {
        Self {
            replay: None,
            scorer,
            threshold,
            fallback_to_custom: true,
            parse: ParseOptions::default(),
            lenient: false,
        }
    }

    pub fn with_replay(mut self, engine: ReplayEngine) -> Self {
        self.replay = Some(engine);
        self
    }

    pub fn with_fallback(mut self, fallback_to_custom: bool) -> Self {
        self.fallback_to_custom = fallback_to_custom;
        self
    }

    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    /// Continue with the partial events of a malformed log.
    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub async fn score(
        &self,
        pipeline: Pipeline,
        events: &[StreamEvent],
        task: &TaskDescriptor,
        final_answer: Option<&str>,
    ) -> Result<Scored, EvalError> {
        if pipeline == Pipeline::Replay {
            let outcome = match &self.replay {
                Some(engine) => engine.replay_detailed(events, task, final_answer).await,
                None => Err(EvalError::InstrumentationUnavailable(
                    "no replay engine configured".to_string(),
                )),
            };
            match outcome {
                Ok(o) => {
                    // Both pipelines decide `passed` against the evaluator's threshold.
                    let result = ScoreResult::new(
                        o.result.score(),
                        o.result.reason().to_string(),
                        self.threshold,
                    );
                    return Ok(Scored {
                        result,
                        scored_by: Pipeline::Replay,
                        plan_source: o.plan_source,
                    })
                }
                Err(EvalError::InstrumentationUnavailable(msg)) if self.fallback_to_custom => {
                    tracing::warn!(
                        target: "planeval.score",
                        stage = "score.fallback",
                        reason = %msg,
                        "instrumentation unavailable; scoring from logs"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let plan = reconstruct(events, task);
        let result = self
            .scorer
            .score_plan(events, task, &plan, final_answer, self.threshold)
            .await?;
        Ok(Scored {
            result,
            scored_by: Pipeline::Custom,
            plan_source: plan.source(),
        })
    }

    /// Parses `log` and scores it. Never fails: errors end up in the report.
    pub async fn evaluate_log(
        &self,
        id: &str,
        log: &str,
        task: &TaskDescriptor,
        final_answer: Option<&str>,
        pipeline: Pipeline,
    ) -> RunReport {
        let mut report = RunReport::new(id, pipeline);

        let events = match parse_log_str(log, &self.parse) {
            Ok(events) => events,
            Err(err) if self.lenient => {
                tracing::warn!(
                    target: "planeval.parse",
                    stage = "parse.partial",
                    run = %id,
                    error = %err,
                    "continuing with partial parse"
                );
                report.parse_warning = Some(err.to_string());
                err.into_partial()
            }
            Err(err) => {
                report.error = Some(RunError::from(&EvalError::from(err)));
                return report;
            }
        };
        report.tool_calls = events.tool_calls().len();

        match self.score(pipeline, &events, task, final_answer).await {
            Ok(scored) => {
                report.scored_by = Some(scored.scored_by);
                report.plan_source = Some(scored.plan_source);
                report.result = Some(scored.result);
            }
            Err(err) => {
                tracing::error!(
                    target: "planeval.score",
                    stage = "score.failed",
                    run = %id,
                    kind = err.kind_name(),
                    error = %err
                );
                report.error = Some(RunError::from(&err));
            }
        }
        report
    }
}
