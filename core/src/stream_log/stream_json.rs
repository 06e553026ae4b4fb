use serde_json::Value;

use super::adapter::RecordAdapter;
use super::record::{RawRecord, TextChannel};

/// Maps "stream-json" lines emitted by agent CLIs (claude / gemini / codex)
/// onto canonical records.
///
/// It is intentionally best-effort:
/// - Ignores shapes it does not know.
/// - Emits every content item of a multi-item message, in order.
#[derive(Default)]
pub struct StreamJsonAdapter;

impl StreamJsonAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(|x| x.as_str()).map(|x| x.to_string())
}

fn line_type(v: &Value) -> &str {
    v.get("type").and_then(|x| x.as_str()).unwrap_or("")
}

impl RecordAdapter for StreamJsonAdapter {
    fn name(&self) -> &'static str {
        "stream_json"
    }

    fn adapt_value(&mut self, v: &Value) -> Vec<RawRecord> {
        let ty = line_type(v);

        // Claude stream-json
        // - {"type":"assistant","message":{"id":"..","content":[{"type":"text","text":".."},{"type":"tool_use",..}]}}
        // - {"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"..","content":".."}]}}
        // - {"type":"result","result":"..."}
        if ty == "assistant" {
            return claude_assistant(v);
        }
        if ty == "user" {
            return claude_tool_results(v);
        }

        // Gemini stream-json
        if ty == "tool_use" {
            let Some(call_id) = str_field(v, "tool_id") else {
                return Vec::new();
            };
            let name = str_field(v, "tool_name").unwrap_or_else(|| "unknown_tool".into());
            return vec![RawRecord::ToolStart {
                call_id,
                name,
                args: v.get("parameters").cloned().unwrap_or(Value::Null),
                ts: str_field(v, "timestamp"),
            }];
        }
        if ty == "tool_result" {
            let Some(call_id) = str_field(v, "tool_id") else {
                return Vec::new();
            };
            let ok = match v.get("status").and_then(|x| x.as_str()) {
                Some("success") => Some(true),
                Some("error") => Some(false),
                _ => None,
            };
            let output = v
                .get("output")
                .cloned()
                .or_else(|| v.get("error").cloned())
                .unwrap_or(Value::Null);
            return vec![RawRecord::ToolResult {
                call_id,
                output,
                ok,
                ts: str_field(v, "timestamp"),
            }];
        }
        if ty == "message" {
            if v.get("role").and_then(|x| x.as_str()) != Some("assistant") {
                return Vec::new();
            }
            let text = match v.get("content") {
                Some(Value::String(s)) => s.clone(),
                _ => return Vec::new(),
            };
            return vec![RawRecord::TextDelta {
                message_id: None,
                channel: TextChannel::Unmarked,
                text,
                ts: str_field(v, "timestamp"),
            }];
        }

        // Terminal markers (claude carries the answer text, gemini does not)
        if ty == "result" {
            return vec![RawRecord::FinalAnswer {
                text: str_field(v, "result"),
                ts: str_field(v, "timestamp"),
            }];
        }

        // Codex stream-json
        if ty == "turn.completed" {
            return vec![RawRecord::final_answer(None)];
        }
        if let Some(item) = v.get("item") {
            return codex_item(ty, item);
        }

        Vec::new()
    }
}

fn claude_assistant(v: &Value) -> Vec<RawRecord> {
    let Some(message) = v.get("message") else {
        return Vec::new();
    };
    let Some(items) = message.get("content").and_then(|c| c.as_array()) else {
        return Vec::new();
    };
    let message_id = str_field(message, "id");

    let mut out = Vec::new();
    for item in items {
        match item.get("type").and_then(|x| x.as_str()).unwrap_or("") {
            "text" | "output_text" => {
                if let Some(t) = item.get("text").and_then(|x| x.as_str()) {
                    out.push(RawRecord::text(
                        TextChannel::Unmarked,
                        message_id.clone(),
                        t,
                    ));
                }
            }
            "thinking" => {
                if let Some(t) = item.get("thinking").and_then(|x| x.as_str()) {
                    out.push(RawRecord::text(
                        TextChannel::Planning,
                        message_id.as_ref().map(|id| format!("{id}:thinking")),
                        t,
                    ));
                }
            }
            "tool_use" => {
                let Some(call_id) = str_field(item, "id") else {
                    continue;
                };
                let name = str_field(item, "name").unwrap_or_else(|| "unknown_tool".into());
                let args = item.get("input").cloned().unwrap_or(Value::Null);
                out.push(RawRecord::tool_start(call_id, name, args));
            }
            _ => {}
        }
    }
    out
}

fn claude_tool_results(v: &Value) -> Vec<RawRecord> {
    let Some(items) = v
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_array())
    else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for item in items {
        if item.get("type").and_then(|x| x.as_str()) != Some("tool_result") {
            continue;
        }
        let Some(call_id) = str_field(item, "tool_use_id") else {
            continue;
        };
        let ok = item
            .get("is_error")
            .or_else(|| {
                v.get("tool_use_result")
                    .and_then(|r| r.get("isError").or_else(|| r.get("is_error")))
            })
            .and_then(|x| x.as_bool())
            .map(|is_error| !is_error);
        let output = item
            .get("content")
            .cloned()
            .or_else(|| v.get("tool_use_result").cloned())
            .unwrap_or(Value::Null);
        out.push(RawRecord::ToolResult {
            call_id,
            output,
            ok,
            ts: None,
        });
    }
    out
}

fn codex_item(line_type: &str, item: &Value) -> Vec<RawRecord> {
    let item_type = item.get("type").and_then(|x| x.as_str()).unwrap_or("");
    let id = str_field(item, "id");

    match (line_type, item_type) {
        ("item.started", "mcp_tool_call") => {
            let Some(call_id) = id else {
                return Vec::new();
            };
            let tool = str_field(item, "tool");
            let server = str_field(item, "server");
            let name = match (server, tool) {
                (Some(s), Some(t)) => format!("{s}.{t}"),
                (_, Some(t)) => t,
                _ => "unknown_tool".to_string(),
            };
            let args = item.get("arguments").cloned().unwrap_or(Value::Null);
            vec![RawRecord::tool_start(call_id, name, args)]
        }
        ("item.completed", "mcp_tool_call") => {
            let Some(call_id) = id else {
                return Vec::new();
            };
            let ok = match item.get("status").and_then(|x| x.as_str()) {
                Some("completed") => Some(true),
                Some("failed") => Some(false),
                _ => None,
            };
            let output = item
                .get("result")
                .cloned()
                .or_else(|| item.get("error").cloned())
                .unwrap_or(Value::Null);
            vec![RawRecord::ToolResult {
                call_id,
                output,
                ok,
                ts: None,
            }]
        }
        ("item.started", "command_execution") => {
            let Some(call_id) = id else {
                return Vec::new();
            };
            let command = item.get("command").cloned().unwrap_or(Value::Null);
            vec![RawRecord::tool_start(
                call_id,
                "command_execution",
                serde_json::json!({ "command": command }),
            )]
        }
        ("item.completed", "command_execution") => {
            let Some(call_id) = id else {
                return Vec::new();
            };
            let exit_code = item.get("exit_code").and_then(|x| x.as_i64());
            let output = item
                .get("aggregated_output")
                .cloned()
                .unwrap_or_else(|| serde_json::json!({ "exit_code": exit_code }));
            vec![RawRecord::ToolResult {
                call_id,
                output,
                ok: exit_code.map(|c| c == 0),
                ts: None,
            }]
        }
        ("item.completed", "reasoning") => {
            let text = str_field(item, "text").unwrap_or_default();
            vec![
                RawRecord::text(TextChannel::Planning, id.clone(), text),
                RawRecord::TextEnd { message_id: id },
            ]
        }
        ("item.completed", "agent_message") => {
            let text = str_field(item, "text").unwrap_or_default();
            vec![
                RawRecord::text(TextChannel::Unmarked, id.clone(), text),
                RawRecord::TextEnd { message_id: id },
            ]
        }
        _ => Vec::new(),
    }
}
