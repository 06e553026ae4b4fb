use thiserror::Error;

use crate::event::StreamEvent;

/// Numeric error codes surfaced to callers; the CLI uses them as exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    MalformedLog = 2,
    ConfigError = 11,
    IoError = 20,
    JudgeTimeout = 30,
    JudgeError = 40,
    InstrumentationUnavailable = 41,
    MetricError = 42,
    GeneralError = 50,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedLogKind {
    /// A tool result referenced a call id that no earlier tool start declared.
    UnknownCallId { call_id: String },
    /// A second final answer appeared in one run.
    DuplicateFinalAnswer,
}

/// Raised by the log parser. Recoverable: `partial` holds every event built
/// from records strictly before `record_index`.
#[derive(Error, Debug, Clone)]
#[error("malformed log at record {record_index}: {}", describe_kind(.kind))]
pub struct MalformedLogError {
    pub kind: MalformedLogKind,
    pub record_index: usize,
    pub partial: Vec<StreamEvent>,
}

fn describe_kind(kind: &MalformedLogKind) -> String {
    match kind {
        MalformedLogKind::UnknownCallId { call_id } => {
            format!("tool result references unknown call id '{call_id}'")
        }
        MalformedLogKind::DuplicateFinalAnswer => "more than one final answer".to_string(),
    }
}

impl MalformedLogError {
    pub fn into_partial(self) -> Vec<StreamEvent> {
        self.partial
    }
}

/// Misuse of, or failure to reach, the instrumentation container.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstrumentationError {
    #[error("instrumentation unavailable: {0}")]
    Unavailable(String),

    #[error("no trace scope is open")]
    NoOpenTrace,

    #[error("a trace scope is already open")]
    TraceAlreadyOpen,

    #[error("scope {closing} closed while scope {innermost} is still open")]
    OutOfOrderClose { closing: usize, innermost: usize },

    #[error("{0} scope(s) still open at finish")]
    ScopesStillOpen(usize),
}

#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("judge call timed out after {0} ms")]
    Timeout(u64),

    #[error("judge call failed: {0}")]
    Call(#[source] anyhow::Error),
}

/// Errors of one evaluation run. Only `MalformedLog` is recoverable; the
/// rest end the current run and are never converted into a score.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error(transparent)]
    MalformedLog(#[from] MalformedLogError),

    #[error("instrumentation unavailable: {0}")]
    InstrumentationUnavailable(String),

    #[error("instrumentation misuse: {0}")]
    Instrumentation(InstrumentationError),

    #[error("metric '{metric}' failed: {message}")]
    MetricExecution { metric: String, message: String },

    #[error("judge response could not be parsed: {0}")]
    JudgeResponseParse(String),

    #[error("judge call timed out after {0} ms")]
    JudgeTimeout(u64),

    #[error("judge call failed: {0}")]
    JudgeCall(String),
}

impl EvalError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MalformedLog(_) => ErrorCode::MalformedLog,
            Self::InstrumentationUnavailable(_) => ErrorCode::InstrumentationUnavailable,
            Self::Instrumentation(_) => ErrorCode::GeneralError,
            Self::MetricExecution { .. } => ErrorCode::MetricError,
            Self::JudgeResponseParse(_) => ErrorCode::JudgeError,
            Self::JudgeTimeout(_) => ErrorCode::JudgeTimeout,
            Self::JudgeCall(_) => ErrorCode::JudgeError,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedLog(_))
    }

    /// Short stable name used in reports.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::MalformedLog(_) => "malformed_log",
            Self::InstrumentationUnavailable(_) => "instrumentation_unavailable",
            Self::Instrumentation(_) => "instrumentation",
            Self::MetricExecution { .. } => "metric_execution",
            Self::JudgeResponseParse(_) => "judge_response_parse",
            Self::JudgeTimeout(_) => "judge_timeout",
            Self::JudgeCall(_) => "judge_call",
        }
    }
}

impl From<InstrumentationError> for EvalError {
    fn from(err: InstrumentationError) -> Self {
        match err {
            InstrumentationError::Unavailable(msg) => Self::InstrumentationUnavailable(msg),
            other => Self::Instrumentation(other),
        }
    }
}

impl From<JudgeError> for EvalError {
    fn from(err: JudgeError) -> Self {
        match err {
            JudgeError::Timeout(ms) => Self::JudgeTimeout(ms),
            JudgeError::Call(e) => Self::JudgeCall(format!("{e:#}")),
        }
    }
}
