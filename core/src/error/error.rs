use thiserror::Error;

use super::eval::{ErrorCode, EvalError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("evaluation failed: {0}")]
    Eval(#[from] EvalError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Eval(e) => e.error_code(),
            Self::Command(_) => ErrorCode::GeneralError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Anyhow(_) => ErrorCode::GeneralError,
        }
    }
}
