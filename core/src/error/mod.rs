#[allow(clippy::module_inception)]
pub mod error;
pub mod eval;

pub use error::CliError;
pub use eval::{
    ErrorCode, EvalError, InstrumentationError, JudgeError, MalformedLogError, MalformedLogKind,
};
