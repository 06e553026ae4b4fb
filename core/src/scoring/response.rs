use serde_json::Value;

use crate::error::EvalError;

const PREVIEW_CHARS: usize = 200;

/// Score and rationale as returned by a judge, before clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeVerdict {
    pub score: f64,
    pub reason: String,
}

/// Finds the first JSON object carrying a `score` key anywhere in `text`.
///
/// Judges wrap their answer in prose or code fences often enough that the
/// whole text is never parsed as-is. A numeric string score is accepted;
/// a missing or non-finite score is a parse failure.
pub fn parse_judge_response(text: &str) -> Result<JudgeVerdict, EvalError> {
    for (start, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        let Some(Ok(Value::Object(map))) = stream.next() else {
            continue;
        };
        let Some(raw_score) = map.get("score") else {
            continue;
        };
        let Some(score) = score_from_value(raw_score) else {
            return Err(EvalError::JudgeResponseParse(format!(
                "score is not a finite number: {raw_score}"
            )));
        };
        let reason = match map.get("reason") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        tracing::debug!(
            target: "planeval.judge",
            stage = "judge.response.parsed",
            offset = start,
            score = score
        );
        return Ok(JudgeVerdict { score, reason });
    }

    Err(EvalError::JudgeResponseParse(format!(
        "no JSON object with a score in response: {}",
        preview(text)
    )))
}

fn score_from_value(v: &Value) -> Option<f64> {
    let score = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    score.is_finite().then_some(score)
}

fn preview(text: &str) -> String {
    let t = text.trim();
    if t.chars().count() <= PREVIEW_CHARS {
        return t.to_string();
    }
    let head: String = t.chars().take(PREVIEW_CHARS).collect();
    format!("{head}…")
}
