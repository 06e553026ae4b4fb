use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::plan::PlanSource;
use crate::scoring::ScoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pipeline {
    /// Replay into instrumentation, then the built-in metric.
    #[serde(alias = "a")]
    Replay,
    /// Judge prompt built straight from the logs.
    #[serde(alias = "b")]
    Custom,
}

impl Pipeline {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replay => "replay",
            Self::Custom => "custom",
        }
    }
}

/// A failed run, kept in the report instead of a score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunError {
    pub kind: &'static str,
    pub code: u16,
    pub message: String,
}

impl From<&EvalError> for RunError {
    fn from(err: &EvalError) -> Self {
        Self {
            kind: err.kind_name(),
            code: err.error_code().as_u16(),
            message: err.to_string(),
        }
    }
}

/// Outcome of one run. Exactly one of `result` / `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub id: String,
    pub pipeline: Pipeline,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scored_by: Option<Pipeline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_source: Option<PlanSource>,
    pub tool_calls: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScoreResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
}

impl RunReport {
    pub fn new(id: impl Into<String>, pipeline: Pipeline) -> Self {
        Self {
            id: id.into(),
            pipeline,
            scored_by: None,
            plan_source: None,
            tool_calls: 0,
            parse_warning: None,
            result: None,
            error: None,
        }
    }

    pub fn fell_back(&self) -> bool {
        self.scored_by.map(|p| p != self.pipeline).unwrap_or(false)
    }
}
