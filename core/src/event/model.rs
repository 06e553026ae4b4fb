use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Planning,
    ToolCall,
    FinalAnswer,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::ToolCall => "tool_call",
            Self::FinalAnswer => "final_answer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub name: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub output: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    Planning { text: String },
    ToolCall(ToolCall),
    FinalAnswer { text: String },
}

/// One observed occurrence of an agent run, in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Index of the raw record this event originates from; the ordering key.
    pub seq: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,

    #[serde(flatten)]
    pub payload: EventPayload,
}

impl StreamEvent {
    pub fn planning(seq: u64, text: impl Into<String>) -> Self {
        Self {
            seq,
            ts: None,
            payload: EventPayload::Planning { text: text.into() },
        }
    }

    pub fn tool_call(
        seq: u64,
        call_id: impl Into<String>,
        name: impl Into<String>,
        args: Value,
        output: Value,
    ) -> Self {
        Self {
            seq,
            ts: None,
            payload: EventPayload::ToolCall(ToolCall {
                call_id: call_id.into(),
                name: name.into(),
                args,
                output,
            }),
        }
    }

    pub fn final_answer(seq: u64, text: impl Into<String>) -> Self {
        Self {
            seq,
            ts: None,
            payload: EventPayload::FinalAnswer { text: text.into() },
        }
    }

    pub fn with_ts(mut self, ts: Option<String>) -> Self {
        self.ts = ts;
        self
    }

    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::Planning { .. } => EventKind::Planning,
            EventPayload::ToolCall(_) => EventKind::ToolCall,
            EventPayload::FinalAnswer { .. } => EventKind::FinalAnswer,
        }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match &self.payload {
            EventPayload::ToolCall(call) => Some(call),
            _ => None,
        }
    }
}

/// Lookups over a parsed event sequence.
pub trait EventsExt {
    fn planning(&self) -> Option<&str>;
    fn tool_calls(&self) -> Vec<&ToolCall>;
    fn final_answer(&self) -> Option<&str>;
    fn tool_names(&self) -> Vec<String>;
}

impl EventsExt for [StreamEvent] {
    fn planning(&self) -> Option<&str> {
        self.iter().find_map(|e| match &e.payload {
            EventPayload::Planning { text } => Some(text.as_str()),
            _ => None,
        })
    }

    fn tool_calls(&self) -> Vec<&ToolCall> {
        self.iter().filter_map(StreamEvent::as_tool_call).collect()
    }

    fn final_answer(&self) -> Option<&str> {
        self.iter().find_map(|e| match &e.payload {
            EventPayload::FinalAnswer { text } => Some(text.as_str()),
            _ => None,
        })
    }

    fn tool_names(&self) -> Vec<String> {
        self.iter()
            .filter_map(StreamEvent::as_tool_call)
            .map(|c| c.name.clone())
            .collect()
    }
}
