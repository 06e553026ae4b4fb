use serde_json::Value;

use super::model::RunReport;

pub fn build_report(runs: &[RunReport]) -> Value {
    let mut scored = 0usize;
    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut fallbacks = 0usize;
    let mut partial_parses = 0usize;
    let mut score_sum = 0.0f64;

    let mut run_items = Vec::new();

    for r in runs {
        if let Some(res) = &r.result {
            scored += 1;
            score_sum += res.score();
            if res.passed() {
                passed += 1;
            }
        }
        if r.error.is_some() {
            failed += 1;
        }
        if r.fell_back() {
            fallbacks += 1;
        }
        if r.parse_warning.is_some() {
            partial_parses += 1;
        }

        run_items.push(serde_json::to_value(r).unwrap_or(Value::Null));
    }

    let mean_score = if scored > 0 {
        serde_json::json!(score_sum / scored as f64)
    } else {
        Value::Null
    };

    serde_json::json!({
        "totals": {
            "runs": runs.len(),
            "scored": scored,
            "passed": passed,
            "failed": failed,
            "fallbacks": fallbacks,
            "partial_parses": partial_parses,
            "mean_score": mean_score,
        },
        "runs": run_items,
    })
}

pub fn format_text(report: &Value) -> String {
    let mut out = String::new();
    out.push_str("Plan quality report\n");

    if let Some(t) = report.get("totals") {
        for key in ["runs", "scored", "passed", "failed", "fallbacks", "partial_parses"] {
            out.push_str(&format!("{key}: {}\n", t.get(key).unwrap_or(&Value::Null)));
        }
        if let Some(mean) = t.get("mean_score").and_then(|v| v.as_f64()) {
            out.push_str(&format!("mean_score: {mean:.3}\n"));
        }
    }

    if let Some(runs) = report.get("runs").and_then(|v| v.as_array()) {
        for r in runs {
            out.push_str(&format!("- id: {}\n", text_of(r.get("id"))));
            let pipeline = text_of(r.get("pipeline"));
            match r.get("scored_by").and_then(|v| v.as_str()) {
                Some(by) if by != pipeline => {
                    out.push_str(&format!("  pipeline: {pipeline} (scored by {by})\n"))
                }
                _ => out.push_str(&format!("  pipeline: {pipeline}\n")),
            }
            if let Some(src) = r.get("plan_source").and_then(|v| v.as_str()) {
                out.push_str(&format!("  plan: {src}\n"));
            }
            out.push_str(&format!(
                "  tool_calls: {}\n",
                r.get("tool_calls").unwrap_or(&Value::Null)
            ));
            if let Some(w) = r.get("parse_warning").and_then(|v| v.as_str()) {
                out.push_str(&format!("  warning: {w}\n"));
            }
            if let Some(res) = r.get("result") {
                let score = res.get("score").and_then(|v| v.as_f64()).unwrap_or(0.0);
                out.push_str(&format!(
                    "  score: {score:.2} passed={}\n  reason: {}\n",
                    res.get("passed").unwrap_or(&Value::Null),
                    text_of(res.get("reason"))
                ));
            }
            if let Some(err) = r.get("error") {
                out.push_str(&format!(
                    "  error: {} ({})\n",
                    text_of(err.get("kind")),
                    text_of(err.get("message"))
                ));
            }
        }
    }

    out
}

fn text_of(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::pipeline::{Pipeline, RunError};
    use crate::plan::PlanSource;
    use crate::scoring::ScoreResult;

    fn runs() -> Vec<RunReport> {
        let mut ok = RunReport::new("run-1", Pipeline::Replay);
        ok.scored_by = Some(Pipeline::Custom);
        ok.plan_source = Some(PlanSource::Synthesized);
        ok.tool_calls = 5;
        ok.result = Some(ScoreResult::new(0.8, "specific", 0.5));

        let mut bad = RunReport::new("run-2", Pipeline::Custom);
        bad.error = Some(RunError::from(&EvalError::JudgeTimeout(100)));
        vec![ok, bad]
    }

    #[test]
    fn totals_count_fallbacks_and_failures() {
        let report = build_report(&runs());
        let t = &report["totals"];
        assert_eq!(t["runs"], 2);
        assert_eq!(t["scored"], 1);
        assert_eq!(t["passed"], 1);
        assert_eq!(t["failed"], 1);
        assert_eq!(t["fallbacks"], 1);
        assert_eq!(t["mean_score"], 0.8);
        assert_eq!(report["runs"][1]["error"]["kind"], "judge_timeout");
        assert_eq!(report["runs"][1]["error"]["code"], 30);
    }

    #[test]
    fn text_mentions_fallback_and_error() {
        let text = format_text(&build_report(&runs()));
        assert!(text.contains("pipeline: replay (scored by custom)"));
        assert!(text.contains("score: 0.80 passed=true"));
        assert!(text.contains("error: judge_timeout"));
    }
}
