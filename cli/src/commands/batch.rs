use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use planeval_core::config::AppConfig;
use planeval_core::error::{CliError, ErrorCode};
use planeval_core::pipeline::{Evaluator, Pipeline, RunError, RunReport};
use planeval_core::task::TaskDescriptor;
use serde::Deserialize;

use super::cli::BatchArgs;
use super::score::{build_evaluator, with_threshold};
use super::{exit_code_for_runs, print_report, read_log};

/// One line of a batch manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub log: PathBuf,
    pub task: String,
    #[serde(default)]
    pub final_answer: Option<String>,
}

/// Reads a JSONL manifest; relative log paths resolve against its directory.
pub fn parse_manifest(text: &str, base_dir: &Path) -> Result<Vec<ManifestEntry>, CliError> {
    let mut entries = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut entry: ManifestEntry = serde_json::from_str(line).map_err(|e| {
            CliError::Command(format!("manifest line {}: {e}", idx + 1))
        })?;
        if entry.log.is_relative() {
            entry.log = base_dir.join(&entry.log);
        }
        entries.push(entry);
    }
    Ok(entries)
}

async fn run_entry(
    evaluator: &Evaluator,
    entry: ManifestEntry,
    index: usize,
    pipeline: Pipeline,
) -> RunReport {
    let id = entry
        .id
        .clone()
        .unwrap_or_else(|| format!("{}:{}", index + 1, entry.log.display()));
    let log = match read_log(&entry.log).await {
        Ok(log) => log,
        Err(e) => {
            tracing::warn!(
                target: "planeval.score",
                stage = "batch.read.error",
                run = %id,
                error = %e
            );
            let mut report = RunReport::new(id, pipeline);
            report.error = Some(RunError {
                kind: "io",
                code: ErrorCode::IoError.as_u16(),
                message: e.to_string(),
            });
            return report;
        }
    };
    let task = TaskDescriptor::from_text(entry.task);
    evaluator
        .evaluate_log(&id, &log, &task, entry.final_answer.as_deref(), pipeline)
        .await
}

/// Scores runs concurrently, reporting them in manifest order.
pub async fn run_entries(
    evaluator: &Evaluator,
    entries: Vec<ManifestEntry>,
    pipeline: Pipeline,
    concurrency: usize,
) -> Vec<RunReport> {
    let mut indexed: Vec<(usize, RunReport)> = stream::iter(entries.into_iter().enumerate())
        .map(|(i, entry)| async move { (i, run_entry(evaluator, entry, i, pipeline).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, r)| r).collect()
}

pub async fn run_batch(args: BatchArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let cfg = with_threshold(cfg, args.threshold)?;
    let manifest = read_log(&args.manifest).await?;
    let base_dir = args
        .manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let entries = parse_manifest(&manifest, &base_dir)?;
    let concurrency = args.concurrency.unwrap_or(cfg.scoring.batch_concurrency);
    let pipeline = Pipeline::from(args.pipeline);

    tracing::info!(
        target: "planeval.score",
        stage = "batch.start",
        runs = entries.len(),
        pipeline = pipeline.as_str(),
        concurrency = concurrency
    );

    let evaluator = build_evaluator(&cfg, args.lenient)?;
    let runs = run_entries(&evaluator, entries, pipeline, concurrency).await;
    print_report(&runs, args.format)?;
    Ok(exit_code_for_runs(&runs))
}
