pub mod custom;
pub mod judge;
pub mod prompt;
pub mod response;
pub mod result;

pub use custom::{CustomPlanScorer, DEFAULT_JUDGE_TIMEOUT, DEFAULT_MAX_OUTPUT_CHARS};
pub use judge::{complete_with_timeout, JudgeModel};
pub use prompt::{
    summarize_tool_activity, truncate_value, PlanPrompt, ToolActivity, TRUNCATION_MARKER,
};
pub use response::{parse_judge_response, JudgeVerdict};
pub use result::ScoreResult;
