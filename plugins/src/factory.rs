use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use planeval_core::config::{AppConfig, InstrumentationKind, JudgeProvider};
use planeval_core::pipeline::Evaluator;
use planeval_core::replay::{
    DisabledInstrumentation, InMemoryInstrumentation, Instrumentation, PlanQualityMetric,
    ReplayEngine,
};
use planeval_core::scoring::{CustomPlanScorer, JudgeModel};

use crate::judge::{GeminiJudge, OpenAiJudge};
use crate::metric::JudgePlanQualityMetric;

pub fn build_judge(cfg: &AppConfig) -> Result<Arc<dyn JudgeModel>> {
    let timeout_ms = cfg.judge.timeout_ms;
    match &cfg.judge.provider {
        JudgeProvider::Gemini(svc) => Ok(Arc::new(GeminiJudge::new(
            &svc.base_url,
            svc.api_key.clone(),
            svc.model.clone(),
            timeout_ms,
        )?)),
        JudgeProvider::OpenAi(svc) => Ok(Arc::new(OpenAiJudge::new(
            &svc.base_url,
            svc.api_key.clone(),
            svc.model.clone(),
            timeout_ms,
        )?)),
    }
}

pub fn build_instrumentation(cfg: &AppConfig) -> Arc<dyn Instrumentation> {
    match cfg.replay.instrumentation {
        InstrumentationKind::InMemory => {
            Arc::new(InMemoryInstrumentation::new(cfg.replay.trace_name.clone()))
        }
        InstrumentationKind::Disabled => Arc::new(DisabledInstrumentation::new(
            "instrumentation disabled in config",
        )),
    }
}

pub fn build_metric(cfg: &AppConfig, judge: Arc<dyn JudgeModel>) -> Arc<dyn PlanQualityMetric> {
    Arc::new(
        JudgePlanQualityMetric::new(judge, cfg.scoring.threshold)
            .with_timeout(Duration::from_millis(cfg.judge.timeout_ms))
            .with_max_output_chars(cfg.scoring.max_output_chars),
    )
}

pub fn build_scorer(cfg: &AppConfig, judge: Arc<dyn JudgeModel>) -> CustomPlanScorer {
    CustomPlanScorer::new(judge)
        .with_timeout(Duration::from_millis(cfg.judge.timeout_ms))
        .with_max_output_chars(cfg.scoring.max_output_chars)
        .with_final_output(cfg.scoring.include_final_output)
}

/// Wires both pipelines around one judge.
pub fn build_evaluator(cfg: &AppConfig, judge: Arc<dyn JudgeModel>) -> Evaluator {
    let engine = ReplayEngine::new(build_instrumentation(cfg), build_metric(cfg, judge.clone()));
    Evaluator::new(build_scorer(cfg, judge), cfg.scoring.threshold)
        .with_replay(engine)
        .with_fallback(cfg.replay.fallback_to_custom)
        .with_parse_options(cfg.parser.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use planeval_core::config::JudgeServiceConfig;

    #[test]
    fn builds_configured_judge() {
        let mut cfg = AppConfig::default();
        assert_eq!(build_judge(&cfg).unwrap().model_name(), "gemini-2.5-flash");

        let mut svc = JudgeServiceConfig::openai();
        svc.model = "local-judge".into();
        cfg.judge.provider = JudgeProvider::OpenAi(svc);
        assert_eq!(build_judge(&cfg).unwrap().model_name(), "local-judge");
    }

    #[test]
    fn disabled_instrumentation_refuses_sessions() {
        let mut cfg = AppConfig::default();
        cfg.replay.instrumentation = InstrumentationKind::Disabled;
        assert!(build_instrumentation(&cfg).session().is_err());

        cfg.replay.instrumentation = InstrumentationKind::InMemory;
        assert!(build_instrumentation(&cfg).session().is_ok());
    }

    #[test]
    fn metric_carries_configured_threshold() {
        let mut cfg = AppConfig::default();
        cfg.scoring.threshold = 0.7;
        let judge = build_judge(&cfg).unwrap();
        assert_eq!(build_metric(&cfg, judge).threshold(), 0.7);
    }
}
