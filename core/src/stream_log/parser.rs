use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MalformedLogError, MalformedLogKind};
use crate::event::{EventPayload, StreamEvent};

use super::adapter::{records_from_str, MultiRecordAdapter, RecordAdapter};
use super::record::{RawRecord, TextChannel};

/// What to do with unmarked free text seen before the first tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreToolText {
    /// Treat it as non-semantic chatter.
    #[default]
    Discard,
    /// Treat it as an implicit plan.
    Plan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOptions {
    #[serde(default)]
    pub pre_tool_text: PreToolText,

    /// Promote the last unmarked message after the last tool call to the
    /// final answer when the log has no explicit answer marker.
    #[serde(default = "default_promote_trailing_text")]
    pub promote_trailing_text: bool,
}

fn default_promote_trailing_text() -> bool {
    true
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            pre_tool_text: PreToolText::default(),
            promote_trailing_text: default_promote_trailing_text(),
        }
    }
}

/// Result of a parse where the caller opted to continue past a malformed
/// record.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub events: Vec<StreamEvent>,
    pub warning: Option<MalformedLogError>,
}

struct OpenMessage {
    id: Option<String>,
    channel: TextChannel,
    text: String,
    seq: u64,
    ts: Option<String>,
}

/// Failure kind plus the index of the record it is reported at.
type Rejection = (MalformedLogKind, usize);

struct FreeText {
    seq: u64,
    ts: Option<String>,
    text: String,
}

struct ParseState<'a> {
    opts: &'a ParseOptions,
    events: Vec<StreamEvent>,
    open: Option<OpenMessage>,
    calls: HashMap<String, usize>,
    free_texts: Vec<FreeText>,
    planning_idx: Option<usize>,
    final_idx: Option<usize>,
    last_tool_seq: Option<u64>,
}

impl<'a> ParseState<'a> {
    fn new(opts: &'a ParseOptions) -> Self {
        Self {
            opts,
            events: Vec::new(),
            open: None,
            calls: HashMap::new(),
            free_texts: Vec::new(),
            planning_idx: None,
            final_idx: None,
            last_tool_seq: None,
        }
    }

    fn seen_tool(&self) -> bool {
        self.last_tool_seq.is_some()
    }

    fn apply(&mut self, idx: usize, rec: &RawRecord) -> Result<(), Rejection> {
        let seq = idx as u64;
        match rec {
            RawRecord::TextDelta {
                message_id,
                channel,
                text,
                ts,
            } => {
                let continues = self
                    .open
                    .as_ref()
                    .map(|m| m.channel == *channel && m.id == *message_id)
                    .unwrap_or(false);
                if continues {
                    if let Some(m) = self.open.as_mut() {
                        m.text.push_str(text);
                    }
                    return Ok(());
                }
                self.flush()?;
                self.open = Some(OpenMessage {
                    id: message_id.clone(),
                    channel: *channel,
                    text: text.clone(),
                    seq,
                    ts: ts.clone(),
                });
            }
            RawRecord::TextEnd { message_id } => {
                let matches = self
                    .open
                    .as_ref()
                    .map(|m| message_id.is_none() || m.id == *message_id)
                    .unwrap_or(false);
                if matches {
                    self.flush()?;
                }
            }
            RawRecord::ToolStart {
                call_id,
                name,
                args,
                ts,
            } => {
                self.flush()?;
                if !self.seen_tool() {
                    self.resolve_pre_tool_text();
                }
                if self.calls.contains_key(call_id) {
                    tracing::warn!(
                        target: "planeval.parse",
                        stage = "parse.tool.duplicate_start",
                        call_id = %call_id,
                        record = idx
                    );
                }
                let ev = StreamEvent::tool_call(seq, call_id.clone(), name.clone(), args.clone(), Value::Null)
                    .with_ts(ts.clone());
                self.calls.insert(call_id.clone(), self.events.len());
                self.events.push(ev);
                self.last_tool_seq = Some(seq);
            }
            RawRecord::ToolResult { call_id, output, .. } => {
                self.flush()?;
                let Some(&pos) = self.calls.get(call_id) else {
                    return Err((
                        MalformedLogKind::UnknownCallId {
                            call_id: call_id.clone(),
                        },
                        idx,
                    ));
                };
                if let EventPayload::ToolCall(call) = &mut self.events[pos].payload {
                    if !call.output.is_null() {
                        tracing::warn!(
                            target: "planeval.parse",
                            stage = "parse.tool.duplicate_result",
                            call_id = %call_id,
                            record = idx
                        );
                    }
                    call.output = output.clone();
                }
            }
            RawRecord::FinalAnswer { text, ts } => {
                self.flush()?;
                match text {
                    Some(t) if !t.trim().is_empty() => {
                        self.push_final(seq, ts.clone(), t.clone())
                            .map_err(|k| (k, idx))?;
                    }
                    _ => match self.free_texts.pop() {
                        Some(ft) => self
                            .push_final(seq, ts.clone().or(ft.ts), ft.text)
                            .map_err(|k| (k, idx))?,
                        None => {
                            tracing::debug!(
                                target: "planeval.parse",
                                stage = "parse.final.empty_marker",
                                record = idx
                            );
                        }
                    },
                }
            }
        }
        Ok(())
    }

    /// A rejected message is reported at the record that opened it.
    fn flush(&mut self) -> Result<(), Rejection> {
        let Some(msg) = self.open.take() else {
            return Ok(());
        };
        if msg.text.trim().is_empty() {
            return Ok(());
        }
        match msg.channel {
            TextChannel::Planning => self.push_planning(msg.seq, msg.ts, msg.text),
            TextChannel::Answer => {
                let at = msg.seq as usize;
                self.push_final(msg.seq, msg.ts, msg.text)
                    .map_err(|k| (k, at))?
            }
            TextChannel::Unmarked => self.free_texts.push(FreeText {
                seq: msg.seq,
                ts: msg.ts,
                text: msg.text,
            }),
        }
        Ok(())
    }

    fn push_planning(&mut self, seq: u64, ts: Option<String>, text: String) {
        if self.seen_tool() {
            tracing::debug!(
                target: "planeval.parse",
                stage = "parse.planning.after_tool",
                seq = seq,
                "planning text after the first tool call discarded"
            );
            return;
        }
        match self.planning_idx {
            Some(pos) => {
                if let EventPayload::Planning { text: existing } = &mut self.events[pos].payload {
                    existing.push('\n');
                    existing.push_str(&text);
                }
            }
            None => {
                self.planning_idx = Some(self.events.len());
                self.events.push(StreamEvent::planning(seq, text).with_ts(ts));
            }
        }
    }

    fn push_final(
        &mut self,
        seq: u64,
        ts: Option<String>,
        text: String,
    ) -> Result<(), MalformedLogKind> {
        if self.final_idx.is_some() {
            return Err(MalformedLogKind::DuplicateFinalAnswer);
        }
        self.final_idx = Some(self.events.len());
        self.events.push(StreamEvent::final_answer(seq, text).with_ts(ts));
        Ok(())
    }

    /// Called once, when the first tool call starts.
    fn resolve_pre_tool_text(&mut self) {
        let pre: Vec<FreeText> = std::mem::take(&mut self.free_texts);
        for ft in pre {
            match self.opts.pre_tool_text {
                PreToolText::Plan => self.push_planning(ft.seq, ft.ts, ft.text),
                PreToolText::Discard => {
                    tracing::debug!(
                        target: "planeval.parse",
                        stage = "parse.chatter.discard",
                        seq = ft.seq,
                        chars = ft.text.chars().count()
                    );
                }
            }
        }
    }

    fn snapshot(&self) -> Vec<StreamEvent> {
        let mut out = self.events.clone();
        out.sort_by_key(|e| e.seq);
        out
    }

    fn into_error(self, kind: MalformedLogKind, record_index: usize) -> MalformedLogError {
        MalformedLogError {
            kind,
            record_index,
            partial: self.snapshot(),
        }
    }

    fn finish(mut self) -> Result<Vec<StreamEvent>, MalformedLogError> {
        if let Err((kind, at)) = self.flush() {
            return Err(self.into_error(kind, at));
        }

        if self.final_idx.is_none() && self.opts.promote_trailing_text {
            let last_tool = self.last_tool_seq;
            let trailing = self
                .free_texts
                .pop()
                .filter(|ft| last_tool.map(|s| ft.seq > s).unwrap_or(true));
            if let Some(ft) = trailing {
                self.final_idx = Some(self.events.len());
                self.events
                    .push(StreamEvent::final_answer(ft.seq, ft.text).with_ts(ft.ts));
            }
        }

        let events = self.snapshot();
        tracing::debug!(
            target: "planeval.parse",
            stage = "parse.done",
            events = events.len(),
            has_planning = self.planning_idx.is_some(),
            has_final = self.final_idx.is_some(),
            open_calls = self
                .events
                .iter()
                .filter_map(StreamEvent::as_tool_call)
                .filter(|c| c.output.is_null())
                .count()
        );
        Ok(events)
    }
}

/// Turns raw records into canonical events.
///
/// Pure function of its input. Fails on a tool result for an unknown call id
/// or on a second final answer; the error carries every event built from
/// records before the offending one.
pub fn parse(
    records: &[RawRecord],
    opts: &ParseOptions,
) -> Result<Vec<StreamEvent>, MalformedLogError> {
    let mut state = ParseState::new(opts);
    for (idx, rec) in records.iter().enumerate() {
        if let Err((kind, at)) = state.apply(idx, rec) {
            return Err(state.into_error(kind, at));
        }
    }
    state.finish()
}

/// Like `parse`, but continues with the partial event list on a malformed
/// log and logs a warning instead of failing.
pub fn parse_lenient(records: &[RawRecord], opts: &ParseOptions) -> ParseOutcome {
    match parse(records, opts) {
        Ok(events) => ParseOutcome {
            events,
            warning: None,
        },
        Err(err) => {
            tracing::warn!(
                target: "planeval.parse",
                stage = "parse.partial",
                error = %err,
                kept = err.partial.len(),
                "continuing with partial parse"
            );
            ParseOutcome {
                events: err.partial.clone(),
                warning: Some(err),
            }
        }
    }
}

/// Runs each line through the adapters, then `parse`.
pub fn parse_lines<'a, I>(lines: I, opts: &ParseOptions) -> Result<Vec<StreamEvent>, MalformedLogError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut adapter = MultiRecordAdapter::new();
    let records: Vec<RawRecord> = lines
        .into_iter()
        .flat_map(|l| adapter.adapt_line(l))
        .collect();
    parse(&records, opts)
}

pub fn parse_log_str(
    input: &str,
    opts: &ParseOptions,
) -> Result<Vec<StreamEvent>, MalformedLogError> {
    parse(&records_from_str(input), opts)
}

pub fn parse_log_str_lenient(input: &str, opts: &ParseOptions) -> ParseOutcome {
    parse_lenient(&records_from_str(input), opts)
}
