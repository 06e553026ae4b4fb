use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix marking a canonical record line inside mixed output.
pub const RECORD_PREFIX: &str = "@@PLANEVAL_RECORD@@";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextChannel {
    /// Explicitly marked planning / reasoning / thinking output.
    Planning,
    /// Explicitly marked answer output.
    Answer,
    #[default]
    Unmarked,
}

/// Provider-neutral raw log record. Adapters translate provider streaming
/// formats into this shape; the parser turns a sequence of these into
/// canonical events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RawRecord {
    #[serde(rename = "text.delta")]
    TextDelta {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
        #[serde(default)]
        channel: TextChannel,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ts: Option<String>,
    },

    #[serde(rename = "text.end")]
    TextEnd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },

    #[serde(rename = "tool.start")]
    ToolStart {
        call_id: String,
        name: String,
        #[serde(default)]
        args: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ts: Option<String>,
    },

    #[serde(rename = "tool.result")]
    ToolResult {
        call_id: String,
        #[serde(default)]
        output: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ok: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ts: Option<String>,
    },

    #[serde(rename = "answer.final")]
    FinalAnswer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ts: Option<String>,
    },
}

impl RawRecord {
    pub fn text(channel: TextChannel, message_id: Option<String>, text: impl Into<String>) -> Self {
        Self::TextDelta {
            message_id,
            channel,
            text: text.into(),
            ts: None,
        }
    }

    pub fn tool_start(call_id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self::ToolStart {
            call_id: call_id.into(),
            name: name.into(),
            args,
            ts: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, output: Value) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            output,
            ok: None,
            ts: None,
        }
    }

    pub fn final_answer(text: Option<String>) -> Self {
        Self::FinalAnswer { text, ts: None }
    }
}
