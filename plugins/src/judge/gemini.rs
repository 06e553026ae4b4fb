use async_trait::async_trait;
use planeval_core::error::JudgeError;
use planeval_core::scoring::JudgeModel;
use serde_json::{json, Value};

use super::http_client::{JudgeAuth, JudgeHttpClient, JudgeHttpError};
use super::strip_code_fences;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Judge backed by the Gemini `generateContent` endpoint.
pub struct GeminiJudge {
    client: JudgeHttpClient,
    api_key: String,
    model: String,
    url: String,
}

impl GeminiJudge {
    pub fn new(
        base_url: &str,
        api_key: String,
        model: String,
        timeout_ms: u64,
    ) -> anyhow::Result<Self> {
        let model_path = if model.starts_with("models/") {
            model.clone()
        } else {
            format!("models/{model}")
        };
        let url = format!(
            "{}/v1beta/{}:generateContent",
            base_url.trim_end_matches('/'),
            model_path
        );
        Ok(Self {
            client: JudgeHttpClient::new(timeout_ms)?,
            api_key,
            model,
            url,
        })
    }
}

fn candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl JudgeModel for GeminiJudge {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, JudgeError> {
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
        });
        let resp = self
            .client
            .post_json(&self.url, JudgeAuth::Header(API_KEY_HEADER, &self.api_key), &body)
            .await
            .map_err(|e| self.client.judge_error(e))?;
        let text = candidate_text(&resp).ok_or_else(|| {
            JudgeError::Call(anyhow::Error::new(JudgeHttpError::missing_text(
                &self.url, &resp,
            )))
        })?;
        Ok(strip_code_fences(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn posts_prompt_and_strips_fences() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "g-key")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{"parts": [{"text": "rate this plan"}]}]
            })))
            .with_status(200)
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"```json\n{\"score\": 0.7}\n```"}]}}]}"#,
            )
            .create_async()
            .await;

        let judge = GeminiJudge::new(
            &server.url(),
            "g-key".into(),
            "gemini-2.5-flash".into(),
            1_000,
        )
        .unwrap();
        let out = judge.complete("rate this plan").await.unwrap();
        assert_eq!(out, "{\"score\": 0.7}");
        assert_eq!(judge.model_name(), "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn accepts_models_prefix() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash-lite:generateContent")
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#)
            .create_async()
            .await;

        let judge = GeminiJudge::new(
            &format!("{}/", server.url()),
            String::new(),
            "models/gemini-2.5-flash-lite".into(),
            1_000,
        )
        .unwrap();
        assert_eq!(judge.complete("p").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn blocked_prompt_is_a_call_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/v1beta/models/m:generateContent")
            .with_status(200)
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let judge = GeminiJudge::new(&server.url(), "k".into(), "m".into(), 1_000).unwrap();
        let err = judge.complete("p").await.unwrap_err();
        assert!(matches!(err, JudgeError::Call(_)));
    }

    #[tokio::test]
    async fn server_error_is_a_call_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/v1beta/models/m:generateContent")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let judge = GeminiJudge::new(&server.url(), "k".into(), "m".into(), 1_000).unwrap();
        match judge.complete("p").await {
            Err(JudgeError::Call(e)) => assert!(format!("{e:#}").contains("status=503")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
