pub mod model;

pub use model::{EventKind, EventPayload, EventsExt, StreamEvent, ToolCall};
