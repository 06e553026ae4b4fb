use serde::Serialize;
use serde_json::Value;

use crate::event::{EventsExt, StreamEvent};

pub const TRUNCATION_MARKER: &str = "...(truncated)";

/// One tool invocation as shown to the judge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolActivity {
    pub name: String,
    pub args: Value,
    pub result: Value,
}

/// Ordered tool activity of a run, with oversized results cut to
/// `max_output_chars` characters.
pub fn summarize_tool_activity(events: &[StreamEvent], max_output_chars: usize) -> Vec<ToolActivity> {
    events
        .tool_calls()
        .into_iter()
        .map(|call| ToolActivity {
            name: call.name.clone(),
            args: call.args.clone(),
            result: truncate_value(&call.output, max_output_chars),
        })
        .collect()
}

/// Cuts a tool result rendered longer than `max_chars` characters.
pub fn truncate_value(v: &Value, max_chars: usize) -> Value {
    let rendered = match v {
        Value::Null => return Value::Null,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if rendered.chars().count() <= max_chars {
        return v.clone();
    }
    let head: String = rendered.chars().take(max_chars).collect();
    Value::String(format!("{head}{TRUNCATION_MARKER}"))
}

/// Inputs of the plan-quality judge prompt.
#[derive(Debug, Clone)]
pub struct PlanPrompt<'a> {
    pub task: &'a str,
    pub plan: &'a str,
    pub tools: &'a [ToolActivity],
    pub final_output: Option<&'a str>,
}

impl PlanPrompt<'_> {
    pub fn render(&self) -> String {
        let tools_json =
            serde_json::to_string_pretty(self.tools).unwrap_or_else(|_| "[]".to_string());

        let mut out = String::new();
        out.push_str("You evaluate the plans of autonomous agents.\n");
        out.push_str("Judge how well the plan below accomplishes the task.\n\n");
        out.push_str("Criteria:\n");
        out.push_str("- Completeness: the plan covers every step the task needs.\n");
        out.push_str("- Correctness: the steps are in a logical order.\n");
        out.push_str("- Feasibility: the plan can realistically complete the task.\n");
        out.push_str("- Specificity: the plan names concrete details from the task.\n\n");
        out.push_str(
            "Return ONLY a JSON object with exactly these keys: \
             {\"score\": <number between 0 and 1>, \"reason\": \"<short explanation>\"}\n\n",
        );
        out.push_str(&format!("Task:\n{}\n\n", self.task));
        out.push_str(&format!("Plan:\n{}\n\n", self.plan));
        out.push_str(&format!("Tools executed:\n{tools_json}\n\n"));
        if let Some(final_output) = self.final_output {
            out.push_str(&format!("Final output:\n{final_output}\n\n"));
        }
        out.push_str("JSON:");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn long_results_are_truncated_with_marker() {
        let events = vec![StreamEvent::tool_call(
            0,
            "a",
            "check_inventory",
            json!({"quantity": 2}),
            json!("x".repeat(20)),
        )];
        let tools = summarize_tool_activity(&events, 5);
        assert_eq!(tools[0].result, json!("xxxxx...(truncated)"));
        assert_eq!(tools[0].args, json!({"quantity": 2}));
    }

    #[test]
    fn short_structured_results_are_kept_as_is() {
        let events = vec![StreamEvent::tool_call(
            0,
            "a",
            "apply_discount",
            json!({}),
            json!({"final_price": 90}),
        )];
        let tools = summarize_tool_activity(&events, 500);
        assert_eq!(tools[0].result, json!({"final_price": 90}));
    }

    #[test]
    fn prompt_contains_sections_and_optional_final_output() {
        let tools: Vec<ToolActivity> = Vec::new();
        let prompt = PlanPrompt {
            task: "order 2 laptops",
            plan: "1. check_inventory: quantity=2",
            tools: &tools,
            final_output: None,
        };
        let text = prompt.render();
        assert!(text.contains("Task:\norder 2 laptops"));
        assert!(text.contains("Plan:\n1. check_inventory: quantity=2"));
        assert!(text.contains("Specificity"));
        assert!(!text.contains("Final output"));

        let with_final = PlanPrompt {
            final_output: Some("ordered"),
            ..prompt
        };
        assert!(with_final.render().contains("Final output:\nordered"));
    }
}
