use planeval_core::config::AppConfig;
use planeval_core::error::CliError;
use planeval_core::pipeline::{Evaluator, Pipeline, RunReport};
use planeval_core::task::TaskDescriptor;
use planeval_plugins::factory;

use super::cli::{ReplayArgs, ScoreArgs};
use super::{exit_code_for_runs, print_report, read_log};

/// Applies a `--threshold` override on top of the loaded config.
pub(crate) fn with_threshold(cfg: &AppConfig, threshold: Option<f64>) -> Result<AppConfig, CliError> {
    let mut cfg = cfg.clone();
    if let Some(t) = threshold {
        if !(0.0..=1.0).contains(&t) {
            return Err(CliError::Config(format!(
                "threshold must be within [0, 1], got {t}"
            )));
        }
        cfg.scoring.threshold = t;
    }
    Ok(cfg)
}

pub(crate) fn build_evaluator(cfg: &AppConfig, lenient: bool) -> Result<Evaluator, CliError> {
    let judge = factory::build_judge(cfg)?;
    tracing::debug!(
        target: "planeval.judge",
        stage = "judge.ready",
        provider = cfg.judge.provider.name(),
        model = %judge.model_name()
    );
    Ok(factory::build_evaluator(cfg, judge).with_lenient(lenient))
}

async fn score_one(args: ScoreArgs, cfg: &AppConfig, pipeline: Pipeline) -> Result<i32, CliError> {
    let log = read_log(&args.log.log).await?;
    let evaluator = build_evaluator(cfg, args.log.lenient)?;
    let task = TaskDescriptor::from_text(args.task);
    let id = args.log.log.display().to_string();

    let report: RunReport = evaluator
        .evaluate_log(&id, &log, &task, args.final_answer.as_deref(), pipeline)
        .await;
    let runs = [report];
    print_report(&runs, args.format)?;
    Ok(exit_code_for_runs(&runs))
}

pub async fn run_score(args: ScoreArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let cfg = with_threshold(cfg, args.threshold)?;
    score_one(args, &cfg, Pipeline::Custom).await
}

pub async fn run_replay(args: ReplayArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let mut cfg = with_threshold(cfg, args.score.threshold)?;
    if args.no_fallback {
        cfg.replay.fallback_to_custom = false;
    }
    score_one(args.score, &cfg, Pipeline::Replay).await
}
