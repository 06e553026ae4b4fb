use async_trait::async_trait;
use planeval_core::error::JudgeError;
use planeval_core::scoring::JudgeModel;
use serde_json::{json, Value};

use super::http_client::{JudgeAuth, JudgeHttpClient, JudgeHttpError};
use super::strip_code_fences;

/// Judge backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiJudge {
    client: JudgeHttpClient,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiJudge {
    pub fn new(
        base_url: &str,
        api_key: String,
        model: String,
        timeout_ms: u64,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: JudgeHttpClient::new(timeout_ms)?,
            api_key,
            model,
            url: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
        })
    }
}

fn message_content(body: &Value) -> Option<&str> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

#[async_trait]
impl JudgeModel for OpenAiJudge {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, JudgeError> {
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [{"role": "user", "content": prompt}],
        });
        let resp = self
            .client
            .post_json(&self.url, JudgeAuth::Bearer(&self.api_key), &body)
            .await
            .map_err(|e| self.client.judge_error(e))?;
        let text = message_content(&resp).ok_or_else(|| {
            JudgeError::Call(anyhow::Error::new(JudgeHttpError::missing_text(
                &self.url, &resp,
            )))
        })?;
        Ok(strip_code_fences(text))
    }
}
