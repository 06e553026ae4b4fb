use serde_json::Value;

use super::collector::CollectorLogAdapter;
use super::record::{RawRecord, RECORD_PREFIX};
use super::stream_json::StreamJsonAdapter;

/// Translates one provider log line into zero or more canonical records.
pub trait RecordAdapter: Send {
    fn name(&self) -> &'static str;

    fn adapt_value(&mut self, v: &Value) -> Vec<RawRecord>;

    fn adapt_line(&mut self, line: &str) -> Vec<RawRecord> {
        let s = line.trim();
        if !(s.starts_with('{') && s.ends_with('}')) {
            return Vec::new();
        }
        match serde_json::from_str::<Value>(s) {
            Ok(v) => self.adapt_value(&v),
            Err(_) => Vec::new(),
        }
    }
}

/// Reads `RawRecord` JSON directly.
#[derive(Default)]
pub struct CanonicalJsonlAdapter;

impl RecordAdapter for CanonicalJsonlAdapter {
    fn name(&self) -> &'static str {
        "canonical"
    }

    fn adapt_value(&mut self, v: &Value) -> Vec<RawRecord> {
        serde_json::from_value::<RawRecord>(v.clone())
            .map(|r| vec![r])
            .unwrap_or_default()
    }
}

/// Stateful, best-effort adapter for mixed logs.
///
/// Supported inputs (in this order):
/// 1) Prefixed canonical records: `@@PLANEVAL_RECORD@@ { ...RawRecord... }`
/// 2) Raw canonical records
/// 3) Flat collector logs (`{"type":"tool_call","name":..}`)
/// 4) Claude / Gemini / Codex stream-json via `StreamJsonAdapter`
pub struct MultiRecordAdapter {
    canonical: CanonicalJsonlAdapter,
    collector: CollectorLogAdapter,
    stream_json: StreamJsonAdapter,
}

impl Default for MultiRecordAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiRecordAdapter {
    pub fn new() -> Self {
        Self {
            canonical: CanonicalJsonlAdapter,
            collector: CollectorLogAdapter::new(),
            stream_json: StreamJsonAdapter::new(),
        }
    }
}

impl RecordAdapter for MultiRecordAdapter {
    fn name(&self) -> &'static str {
        "multi"
    }

    fn adapt_value(&mut self, v: &Value) -> Vec<RawRecord> {
        let out = self.canonical.adapt_value(v);
        if !out.is_empty() {
            return out;
        }
        let out = self.collector.adapt_value(v);
        if !out.is_empty() {
            return out;
        }
        self.stream_json.adapt_value(v)
    }

    fn adapt_line(&mut self, line: &str) -> Vec<RawRecord> {
        let s = line.trim();
        if let Some(rest) = s.strip_prefix(RECORD_PREFIX) {
            return serde_json::from_str::<RawRecord>(rest.trim())
                .map(|r| vec![r])
                .unwrap_or_default();
        }
        if !(s.starts_with('{') && s.ends_with('}')) {
            return Vec::new();
        }
        match serde_json::from_str::<Value>(s) {
            Ok(v) => self.adapt_value(&v),
            Err(_) => Vec::new(),
        }
    }
}

/// Runs every line of `input` through a fresh `MultiRecordAdapter`.
pub fn records_from_str(input: &str) -> Vec<RawRecord> {
    let mut adapter = MultiRecordAdapter::new();
    let records: Vec<RawRecord> = input
        .lines()
        .filter(|l| !l.trim().is_empty())
        .flat_map(|l| adapter.adapt_line(l))
        .collect();
    tracing::debug!(
        target: "planeval.parse",
        stage = "adapt.done",
        lines = input.lines().count(),
        records = records.len()
    );
    records
}

pub fn format_record_line(rec: &RawRecord) -> String {
    let json = serde_json::to_string(rec).unwrap_or_else(|_| "{}".to_string());
    format!("{RECORD_PREFIX} {json}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream_log::record::TextChannel;
    use serde_json::json;

    #[test]
    fn prefixed_line_round_trips() {
        let rec = RawRecord::tool_start("c1", "check_inventory", json!({"quantity": 2}));
        let line = format_record_line(&rec);
        let mut adapter = MultiRecordAdapter::new();
        assert_eq!(adapter.adapt_line(&line), vec![rec]);
    }

    #[test]
    fn plain_text_lines_are_ignored() {
        let mut adapter = MultiRecordAdapter::new();
        assert!(adapter.adapt_line("not json at all").is_empty());
        assert!(adapter.adapt_line("{ broken").is_empty());
    }

    #[test]
    fn canonical_json_wins_over_other_shapes() {
        let mut adapter = MultiRecordAdapter::new();
        let out = adapter.adapt_line(r#"{"type":"text.delta","channel":"planning","text":"p"}"#);
        assert_eq!(out, vec![RawRecord::text(TextChannel::Planning, None, "p")]);
    }
}
