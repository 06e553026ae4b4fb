use crate::event::{EventsExt, StreamEvent};
use crate::task::TaskDescriptor;

use super::model::ReconstructedPlan;
use super::steps::{describe_call, describe_task};

/// Recovers the plan of one run.
///
/// A logged planning event wins and is returned verbatim. Otherwise one step
/// is synthesized per tool call, in call order; with no tool calls either,
/// the task text itself becomes the only step. Pure: the same inputs always
/// yield the same plan.
pub fn reconstruct(events: &[StreamEvent], task: &TaskDescriptor) -> ReconstructedPlan {
    if let Some(text) = events.planning() {
        tracing::debug!(
            target: "planeval.plan",
            stage = "plan.explicit",
            chars = text.chars().count()
        );
        return ReconstructedPlan::explicit(text);
    }

    let steps: Vec<String> = events
        .tool_calls()
        .into_iter()
        .map(|call| describe_call(call, task))
        .collect();

    let plan = ReconstructedPlan::synthesized(steps)
        .unwrap_or_else(|| ReconstructedPlan::single_step(describe_task(task)));
    tracing::debug!(
        target: "planeval.plan",
        stage = "plan.synthesized",
        steps = plan.steps().len(),
        task_fields = task.known_field_count()
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanSource;
    use serde_json::json;

    #[test]
    fn planning_event_is_used_verbatim() {
        let events = vec![
            StreamEvent::planning(0, "Check stock, then ship."),
            StreamEvent::tool_call(1, "a", "check_inventory", json!({}), json!({})),
        ];
        let plan = reconstruct(&events, &TaskDescriptor::from_text("x"));
        assert_eq!(plan.source(), PlanSource::Explicit);
        assert_eq!(plan.text(), "Check stock, then ship.");
    }

    #[test]
    fn no_events_yield_one_step_from_task() {
        let task = TaskDescriptor::from_text("what is the weather in Bali");
        let plan = reconstruct(&[], &task);
        assert_eq!(plan.source(), PlanSource::Synthesized);
        assert_eq!(plan.steps().len(), 1);
        assert!(plan.steps()[0].contains("what is the weather in Bali"));
    }

    #[test]
    fn final_answer_alone_does_not_create_steps() {
        let events = vec![StreamEvent::final_answer(0, "done")];
        let plan = reconstruct(&events, &TaskDescriptor::from_text("do it"));
        assert_eq!(plan.steps().len(), 1);
    }
}
