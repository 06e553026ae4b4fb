use planeval_core::error::JudgeError;
use serde_json::Value;
use std::{error::Error as StdError, fmt, time::Duration};

const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeHttpErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Status,
    Unknown,
}

impl JudgeHttpErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Status => "status",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JudgeHttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct JudgeHttpError {
    kind: JudgeHttpErrorKind,
    status: Option<u16>,
    url: Option<String>,
    message: String,
    source: Option<anyhow::Error>,
}

impl JudgeHttpError {
    pub fn kind(&self) -> JudgeHttpErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn from_reqwest(err: reqwest::Error, url: String) -> Self {
        let kind = if err.is_timeout() {
            JudgeHttpErrorKind::Timeout
        } else if err.is_connect() {
            JudgeHttpErrorKind::Connect
        } else if err.is_request() {
            JudgeHttpErrorKind::Request
        } else if err.is_body() {
            JudgeHttpErrorKind::Body
        } else if err.is_decode() {
            JudgeHttpErrorKind::Decode
        } else {
            JudgeHttpErrorKind::Unknown
        };
        JudgeHttpError {
            kind,
            status: err.status().map(|s| s.as_u16()),
            url: Some(url),
            message: err.to_string(),
            source: Some(anyhow::Error::new(err)),
        }
    }

    fn status_error(status: u16, url: String, preview: String) -> Self {
        JudgeHttpError {
            kind: JudgeHttpErrorKind::Status,
            status: Some(status),
            url: Some(url),
            message: preview,
            source: None,
        }
    }

    fn decode_error(status: u16, url: String, err: serde_json::Error, preview: String) -> Self {
        JudgeHttpError {
            kind: JudgeHttpErrorKind::Decode,
            status: Some(status),
            url: Some(url),
            message: format!("failed to decode response body: {} | body={}", err, preview),
            source: Some(anyhow::Error::new(err)),
        }
    }

    /// A well-formed reply that lacks the generated text.
    pub(crate) fn missing_text(url: &str, body: &Value) -> Self {
        JudgeHttpError {
            kind: JudgeHttpErrorKind::Decode,
            status: None,
            url: Some(url.to_string()),
            message: format!("no generated text in response: {}", preview_body(&body.to_string())),
            source: None,
        }
    }
}

impl fmt::Display for JudgeHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "judge http error kind={}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " status={}", status)?;
        }
        if let Some(url) = &self.url {
            write!(f, " url={}", url)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl StdError for JudgeHttpError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}

async fn parse_json_response(resp: reqwest::Response) -> Result<Value, JudgeHttpError> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp
        .text()
        .await
        .map_err(|err| JudgeHttpError::from_reqwest(err, url.clone()))?;

    if !status.is_success() {
        return Err(JudgeHttpError::status_error(
            status.as_u16(),
            url,
            preview_body(&body),
        ));
    }

    serde_json::from_str::<Value>(&body).map_err(|err| {
        JudgeHttpError::decode_error(status.as_u16(), url, err, preview_body(&body))
    })
}

/// How a judge endpoint expects its key.
#[derive(Debug, Clone, Copy)]
pub enum JudgeAuth<'a> {
    Bearer(&'a str),
    Header(&'static str, &'a str),
}

/// Shared HTTP plumbing of the judge clients.
#[derive(Clone)]
pub struct JudgeHttpClient {
    http: reqwest::Client,
    timeout_ms: u64,
}

impl JudgeHttpClient {
    pub fn new(timeout_ms: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self { http, timeout_ms })
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn auth(&self, req: reqwest::RequestBuilder, auth: JudgeAuth<'_>) -> reqwest::RequestBuilder {
        match auth {
            JudgeAuth::Bearer(key) if key.trim().is_empty() => req,
            JudgeAuth::Bearer(key) => req.bearer_auth(key),
            JudgeAuth::Header(_, key) if key.trim().is_empty() => req,
            JudgeAuth::Header(name, key) => req.header(name, key),
        }
    }

    pub async fn post_json(
        &self,
        url: &str,
        auth: JudgeAuth<'_>,
        body: &Value,
    ) -> Result<Value, JudgeHttpError> {
        tracing::debug!(
            target: "planeval.judge",
            stage = "judge.http.in",
            url = %url
        );
        let req = self.auth(self.http.post(url).json(body), auth);
        let resp = req
            .send()
            .await
            .map_err(|err| JudgeHttpError::from_reqwest(err, url.to_string()))?;
        let status = resp.status();
        let v = parse_json_response(resp).await?;
        tracing::debug!(
            target: "planeval.judge",
            stage = "judge.http.out",
            status = %status
        );
        Ok(v)
    }

    /// Maps a transport failure onto the judge error taxonomy.
    pub fn judge_error(&self, err: JudgeHttpError) -> JudgeError {
        match err.kind() {
            JudgeHttpErrorKind::Timeout => JudgeError::Timeout(self.timeout_ms),
            _ => JudgeError::Call(anyhow::Error::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[test]
    fn preview_body_empty() {
        assert_eq!(preview_body("   "), "<empty body>");
    }

    #[test]
    fn preview_body_truncates() {
        let body = "a".repeat(BODY_PREVIEW_LIMIT + 10);
        let preview = preview_body(&body);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.len(), BODY_PREVIEW_LIMIT + 3);
    }

    #[test]
    fn status_error_display() {
        let err = JudgeHttpError::status_error(
            429,
            "https://example.com/v1/chat/completions".to_string(),
            "rate limited".to_string(),
        );
        let msg = err.to_string();
        assert!(msg.contains("kind=status"));
        assert!(msg.contains("status=429"));
        assert!(msg.contains("url=https://example.com/v1/chat/completions"));
        assert!(msg.contains("rate limited"));
    }

    #[test]
    fn timeout_kind_becomes_judge_timeout() {
        let client = JudgeHttpClient::new(1_500).unwrap();
        let err = JudgeHttpError {
            kind: JudgeHttpErrorKind::Timeout,
            status: None,
            url: None,
            message: "timed out".into(),
            source: None,
        };
        assert!(matches!(client.judge_error(err), JudgeError::Timeout(1_500)));
    }

    #[tokio::test]
    async fn post_json_sends_bearer_and_returns_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/judge")
            .match_header("authorization", "Bearer secret-token")
            .match_body(Matcher::PartialJson(json!({"prompt": "p"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let client = JudgeHttpClient::new(1_000).unwrap();
        let v = client
            .post_json(
                &format!("{}/judge", server.url()),
                JudgeAuth::Bearer("secret-token"),
                &json!({"prompt": "p"}),
            )
            .await
            .unwrap();
        assert_eq!(v, json!({"ok": true}));
    }

    #[tokio::test]
    async fn empty_key_sends_no_header() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/judge")
            .match_header("x-goog-api-key", Matcher::Missing)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = JudgeHttpClient::new(1_000).unwrap();
        client
            .post_json(
                &format!("{}/judge", server.url()),
                JudgeAuth::Header("x-goog-api-key", ""),
                &json!({}),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_json_body_is_decode_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/judge")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = JudgeHttpClient::new(1_000).unwrap();
        let err = client
            .post_json(
                &format!("{}/judge", server.url()),
                JudgeAuth::Bearer(""),
                &json!({}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), JudgeHttpErrorKind::Decode);
        assert_eq!(err.status(), Some(200));
        assert!(err.url().unwrap_or_default().ends_with("/judge"));
    }
}
