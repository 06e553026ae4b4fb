use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, InstrumentationError};

use super::instrumentation::{Instrumentation, TraceSession};
use super::trace::ReplayTrace;

/// The dataset item a run is evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Golden {
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
}

impl Golden {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: None,
        }
    }
}

/// What a metric receives: a golden and the trace finalized for it.
#[derive(Debug, Clone)]
pub struct EvalItem {
    pub golden: Golden,
    pub trace: ReplayTrace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricVerdict {
    pub score: f64,
    pub reason: String,
}

/// A plan-quality metric that only accepts traces finalized by an
/// instrumentation session.
#[async_trait]
pub trait PlanQualityMetric: Send + Sync {
    fn name(&self) -> &str;

    fn threshold(&self) -> f64;

    async fn measure(&self, item: &EvalItem) -> anyhow::Result<MetricVerdict>;
}

/// One evaluated golden.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub item: EvalItem,
    pub verdict: MetricVerdict,
}

/// The evaluation entry point.
///
/// For each golden, in order: opens a fresh session, lets `replay` drive its
/// scopes, finalizes the trace and hands the resulting item to `metric`.
/// The first failure ends the whole call.
pub async fn evaluate<F>(
    instrumentation: &dyn Instrumentation,
    metric: &dyn PlanQualityMetric,
    goldens: Vec<Golden>,
    mut replay: F,
) -> Result<Vec<Evaluation>, EvalError>
where
    F: FnMut(&Golden, &mut dyn TraceSession) -> Result<(), InstrumentationError>,
{
    let mut out = Vec::with_capacity(goldens.len());
    for golden in goldens {
        let mut session = instrumentation.session().map_err(|e| {
            tracing::error!(
                target: "planeval.replay",
                stage = "replay.session.unavailable",
                instrumentation = instrumentation.name(),
                error = %e
            );
            EvalError::from(e)
        })?;
        replay(&golden, session.as_mut())?;
        let trace = session.finish()?;

        let item = EvalItem { golden, trace };
        let verdict = metric
            .measure(&item)
            .await
            .map_err(|e| EvalError::MetricExecution {
                metric: metric.name().to_string(),
                message: format!("{e:#}"),
            })?;
        if !verdict.score.is_finite() {
            return Err(EvalError::MetricExecution {
                metric: metric.name().to_string(),
                message: format!("metric returned a non-finite score: {}", verdict.score),
            });
        }
        tracing::debug!(
            target: "planeval.replay",
            stage = "replay.metric.done",
            metric = metric.name(),
            trace_id = %item.trace.trace_id(),
            score = verdict.score
        );
        out.push(Evaluation { item, verdict });
    }
    Ok(out)
}
