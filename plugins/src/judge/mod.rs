pub mod gemini;
pub mod http_client;
pub mod openai;

pub use gemini::GeminiJudge;
pub use http_client::{JudgeAuth, JudgeHttpClient, JudgeHttpError, JudgeHttpErrorKind};
pub use openai::OpenAiJudge;

use std::sync::OnceLock;

use regex::Regex;

/// Removes markdown code fences a model wraps its JSON answer in.
pub fn strip_code_fences(text: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let re = FENCE.get_or_init(|| Regex::new(r"```(?:json)?\s?").expect("valid fence regex"));
    re.replace_all(text, "").trim().to_string()
}
