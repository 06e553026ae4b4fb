use serde_json::Value;

use super::adapter::RecordAdapter;
use super::record::{RawRecord, TextChannel};

const PLANNING_TYPES: &[&str] = &["planning", "plan", "reasoning", "thinking"];
const TOOL_TYPES: &[&str] = &["tool_call", "tool", "function_call"];
const FINAL_TYPES: &[&str] = &["final", "assistant_final", "completion"];

/// Flat logs written by an in-process collector: one JSON object per
/// observed step, where a tool call already carries its output.
///
/// A tool call item is split into a start/result pair under a synthetic
/// call id so the parser handles it like any streamed call.
#[derive(Default)]
pub struct CollectorLogAdapter {
    next_call: usize,
}

impl CollectorLogAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_call_id(&mut self) -> String {
        self.next_call += 1;
        format!("collector-{}", self.next_call)
    }
}

fn item_type(v: &Value) -> Option<&str> {
    ["type", "event", "kind"]
        .iter()
        .find_map(|k| v.get(*k).and_then(|x| x.as_str()))
}

fn first_str(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| v.get(*k).and_then(|x| x.as_str()))
        .map(|s| s.to_string())
}

fn first_present(v: &Value, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .find_map(|k| v.get(*k).filter(|x| !x.is_null()))
        .cloned()
}

impl RecordAdapter for CollectorLogAdapter {
    fn name(&self) -> &'static str {
        "collector"
    }

    fn adapt_value(&mut self, v: &Value) -> Vec<RawRecord> {
        let Some(ty) = item_type(v) else {
            return Vec::new();
        };
        let ts = first_str(v, &["ts", "timestamp"]);

        if PLANNING_TYPES.contains(&ty) {
            let text = first_str(v, &["text", "content"]).unwrap_or_default();
            let id = self.next_call_id();
            return vec![
                RawRecord::TextDelta {
                    message_id: Some(id.clone()),
                    channel: TextChannel::Planning,
                    text,
                    ts,
                },
                RawRecord::TextEnd {
                    message_id: Some(id),
                },
            ];
        }

        if TOOL_TYPES.contains(&ty) {
            let name = first_str(v, &["name", "tool_name"]).unwrap_or_else(|| "unknown_tool".into());
            let args = first_present(v, &["args", "arguments", "input"])
                .unwrap_or_else(|| Value::Object(Default::default()));
            let output = first_present(v, &["output", "result"]).unwrap_or(Value::Null);
            let call_id = first_str(v, &["id", "call_id"]).unwrap_or_else(|| self.next_call_id());
            return vec![
                RawRecord::ToolStart {
                    call_id: call_id.clone(),
                    name,
                    args,
                    ts: ts.clone(),
                },
                RawRecord::ToolResult {
                    call_id,
                    output,
                    ok: None,
                    ts,
                },
            ];
        }

        if FINAL_TYPES.contains(&ty) {
            let text = first_str(v, &["text", "content"]).unwrap_or_default();
            return vec![RawRecord::FinalAnswer {
                text: Some(text),
                ts,
            }];
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_call_item_becomes_start_and_result() {
        let mut a = CollectorLogAdapter::new();
        let out = a.adapt_value(&json!({
            "type": "tool_call",
            "name": "calculate_shipping",
            "args": {"destination_city": "Jakarta"},
            "output": {"cost": 50}
        }));
        assert_eq!(out.len(), 2);
        match (&out[0], &out[1]) {
            (
                RawRecord::ToolStart { call_id: start_id, name, .. },
                RawRecord::ToolResult { call_id: result_id, output, .. },
            ) => {
                assert_eq!(start_id, result_id);
                assert_eq!(name, "calculate_shipping");
                assert_eq!(output["cost"], 50);
            }
            other => panic!("unexpected records: {other:?}"),
        }
    }

    #[test]
    fn aliases_are_accepted() {
        let mut a = CollectorLogAdapter::new();
        let out = a.adapt_value(&json!({"event": "function_call", "tool_name": "x", "arguments": {"k": 1}, "result": 3}));
        assert!(matches!(&out[0], RawRecord::ToolStart { name, args, .. } if name == "x" && args["k"] == 1));
        assert!(matches!(&out[1], RawRecord::ToolResult { output, .. } if output == &json!(3)));

        let out = a.adapt_value(&json!({"kind": "completion", "content": "done"}));
        assert_eq!(out, vec![RawRecord::final_answer(Some("done".into()))]);
    }

    #[test]
    fn unknown_types_are_skipped() {
        let mut a = CollectorLogAdapter::new();
        assert!(a.adapt_value(&json!({"type": "heartbeat"})).is_empty());
        assert!(a.adapt_value(&json!({"foo": 1})).is_empty());
    }
}
