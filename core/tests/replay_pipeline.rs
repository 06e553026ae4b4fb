mod common;

use std::sync::Arc;

use serde_json::json;

use common::{RecordingInstrumentation, ScopeOp, ScriptedJudge, TraceJudgeMetric};
use planeval_core::error::{ErrorCode, EvalError};
use planeval_core::event::{EventsExt, StreamEvent};
use planeval_core::pipeline::{Evaluator, Pipeline};
use planeval_core::plan::PlanSource;
use planeval_core::replay::{
    evaluate, DisabledInstrumentation, Golden, InMemoryInstrumentation, ReplayEngine, ScopeTags,
    SpanKind,
};
use planeval_core::scoring::CustomPlanScorer;
use planeval_core::stream_log::{parse_log_str, ParseOptions};
use planeval_core::task::TaskDescriptor;

fn order_events() -> Vec<StreamEvent> {
    parse_log_str(
        include_str!("fixtures/order_collector.jsonl"),
        &ParseOptions::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn tool_scopes_match_calls_and_close_lifo_in_event_order() {
    common::init_tracing();
    let instrumentation = RecordingInstrumentation::default();
    let metric = TraceJudgeMetric::new(ScriptedJudge::constant(r#"{"score": 0.9, "reason": "ok"}"#));
    let engine = ReplayEngine::new(Arc::new(instrumentation.clone()), metric.clone());

    let events = order_events();
    let task = TaskDescriptor::from_text(common::ORDER_TASK);
    let result = engine.replay(&events, &task, None).await.unwrap();
    assert_eq!(result.score(), 0.9);
    assert!(result.passed());

    let ops = instrumentation.ops();
    assert!(matches!(ops.first(), Some(ScopeOp::OpenTrace(_))));
    assert_eq!(ops.last(), Some(&ScopeOp::Finish));

    let opened_tools: Vec<String> = ops
        .iter()
        .filter_map(|op| match op {
            ScopeOp::OpenChild(_, SpanKind::Tool, name) => Some(name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(opened_tools, events.tool_names());

    // Every close hits the innermost open scope.
    let mut stack = Vec::new();
    let mut tool_ids = Vec::new();
    for op in &ops {
        match op {
            ScopeOp::OpenTrace(id) => stack.push(*id),
            ScopeOp::OpenChild(id, kind, _) => {
                stack.push(*id);
                if *kind == SpanKind::Tool {
                    tool_ids.push(*id);
                }
            }
            ScopeOp::Close(id) => assert_eq!(stack.pop(), Some(*id)),
            ScopeOp::Finish => assert!(stack.is_empty()),
        }
    }

    // Sibling tool scopes close in the order they opened.
    let close_order: Vec<_> = ops
        .iter()
        .filter_map(|op| match op {
            ScopeOp::Close(id) if tool_ids.contains(id) => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(close_order, tool_ids);
}

#[tokio::test]
async fn metric_receives_finalized_trace_without_provenance() {
    let metric = TraceJudgeMetric::new(ScriptedJudge::constant(r#"{"score": 0.7, "reason": "ok"}"#));
    let engine = ReplayEngine::new(Arc::new(InMemoryInstrumentation::default()), metric.clone());
    let task = TaskDescriptor::from_text(common::ORDER_TASK);

    let outcome = engine
        .replay_detailed(&order_events(), &task, None)
        .await
        .unwrap();
    assert_eq!(outcome.plan_source, PlanSource::Synthesized);

    let seen = metric.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let trace = &seen[0];
    assert_eq!(trace.name(), "ReplayAgentTrace");
    assert_eq!(trace.input(), &json!(common::ORDER_TASK));
    assert_eq!(trace.tools_called().len(), 5);
    assert_eq!(trace.tool_spans().count(), 5);
    assert_eq!(trace.metadata(), &json!({"source": "replayed_stream_logs"}));

    let rendered = serde_json::to_string(trace).unwrap();
    assert!(!rendered.contains("synthesized"));
    assert!(!rendered.contains("explicit"));
}

#[tokio::test]
async fn generic_plan_scores_lower_than_specific_plan_through_replay() {
    let judge = common::specificity_judge();
    let engine = ReplayEngine::new(
        Arc::new(InMemoryInstrumentation::default()),
        TraceJudgeMetric::new(judge.clone()),
    );
    let task = TaskDescriptor::from_text(common::ORDER_TASK);

    let specific_events = order_events();
    let mut generic_events = specific_events.clone();
    generic_events.insert(0, StreamEvent::planning(0, common::GENERIC_PLAN));

    let generic = engine.replay(&generic_events, &task, None).await.unwrap();
    let specific = engine.replay(&specific_events, &task, None).await.unwrap();

    assert_eq!(generic.score(), 0.25);
    assert!(!generic.passed());
    assert!(specific.score() >= generic.score() + 0.5);
    assert!(specific.passed());
}

#[tokio::test]
async fn failing_metric_surfaces_as_metric_execution_error() {
    let engine = ReplayEngine::new(
        Arc::new(InMemoryInstrumentation::default()),
        Arc::new(common::FailingMetric),
    );
    let err = engine
        .replay(&order_events(), &TaskDescriptor::from_text("t"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EvalError::MetricExecution { .. }));
    assert!(err.to_string().contains("metric backend rejected the trace"));
}

#[tokio::test]
async fn unavailable_instrumentation_falls_back_only_when_allowed() {
    let judge = ScriptedJudge::constant(r#"{"score": 0.6, "reason": "fine"}"#);
    let build = |fallback: bool| {
        Evaluator::new(CustomPlanScorer::new(judge.clone()), 0.5)
            .with_replay(ReplayEngine::new(
                Arc::new(DisabledInstrumentation::default()),
                TraceJudgeMetric::new(judge.clone()),
            ))
            .with_fallback(fallback)
    };
    let task = TaskDescriptor::from_text(common::ORDER_TASK);
    let events = order_events();

    let scored = build(true)
        .score(Pipeline::Replay, &events, &task, None)
        .await
        .unwrap();
    assert_eq!(scored.scored_by, Pipeline::Custom);
    assert_eq!(scored.result.score(), 0.6);

    let err = build(false)
        .score(Pipeline::Replay, &events, &task, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EvalError::InstrumentationUnavailable(_)));
    assert_eq!(err.error_code(), ErrorCode::InstrumentationUnavailable);
}

#[tokio::test]
async fn evaluate_opens_one_session_per_golden() {
    let instrumentation = RecordingInstrumentation::default();
    let metric = TraceJudgeMetric::new(ScriptedJudge::constant(r#"{"score": 1, "reason": ""}"#));
    let goldens = vec![Golden::new("first"), Golden::new("second")];

    let evaluations = evaluate(&instrumentation, metric.as_ref(), goldens, |golden, session| {
        let root = session.open_trace_scope(json!(golden.input))?;
        session.close_scope(root, ScopeTags::new().output("done"))
    })
    .await
    .unwrap();

    assert_eq!(evaluations.len(), 2);
    assert_eq!(evaluations[1].item.trace.input(), &json!("second"));
    let finishes = instrumentation
        .ops()
        .iter()
        .filter(|op| **op == ScopeOp::Finish)
        .count();
    assert_eq!(finishes, 2);
}

#[tokio::test]
async fn replay_pass_decision_uses_evaluator_threshold() {
    let judge = ScriptedJudge::constant(r#"{"score": 0.6, "reason": "fine"}"#);
    let metric = TraceJudgeMetric::new(judge.clone());
    assert_eq!(metric.threshold, 0.5);
    let evaluator = Evaluator::new(CustomPlanScorer::new(judge.clone()), 0.7).with_replay(
        ReplayEngine::new(Arc::new(InMemoryInstrumentation::default()), metric),
    );

    let scored = evaluator
        .score(
            Pipeline::Replay,
            &order_events(),
            &TaskDescriptor::from_text(common::ORDER_TASK),
            None,
        )
        .await
        .unwrap();
    assert_eq!(scored.scored_by, Pipeline::Replay);
    assert_eq!(scored.result.score(), 0.6);
    assert!(!scored.result.passed());
}
