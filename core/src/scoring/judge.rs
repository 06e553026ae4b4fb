use std::time::Duration;

use async_trait::async_trait;

use crate::error::{EvalError, JudgeError};

/// The judge language model. One operation: prompt in, text out.
#[async_trait]
pub trait JudgeModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, JudgeError>;
}

/// Makes exactly one judge call bounded by `timeout`. No retry.
pub async fn complete_with_timeout(
    judge: &dyn JudgeModel,
    prompt: &str,
    timeout: Duration,
) -> Result<String, EvalError> {
    let timeout_ms = timeout.as_millis() as u64;
    tracing::debug!(
        target: "planeval.judge",
        stage = "judge.call.out",
        model = %judge.model_name(),
        prompt_chars = prompt.chars().count(),
        timeout_ms = timeout_ms
    );
    let text = match tokio::time::timeout(timeout, judge.complete(prompt)).await {
        Ok(res) => res?,
        Err(_) => {
            tracing::warn!(
                target: "planeval.judge",
                stage = "judge.call.timeout",
                model = %judge.model_name(),
                timeout_ms = timeout_ms
            );
            return Err(EvalError::JudgeTimeout(timeout_ms));
        }
    };
    tracing::debug!(
        target: "planeval.judge",
        stage = "judge.call.in",
        response_chars = text.chars().count()
    );
    Ok(text)
}
