pub mod adapter;
pub mod collector;
pub mod parser;
pub mod record;
pub mod stream_json;

pub use adapter::{
    format_record_line, records_from_str, CanonicalJsonlAdapter, MultiRecordAdapter,
    RecordAdapter,
};
pub use collector::CollectorLogAdapter;
pub use parser::{
    parse, parse_lenient, parse_lines, parse_log_str, parse_log_str_lenient, ParseOptions,
    ParseOutcome, PreToolText,
};
pub use record::{RawRecord, TextChannel, RECORD_PREFIX};
pub use stream_json::StreamJsonAdapter;
