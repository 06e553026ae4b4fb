use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use planeval_core::pipeline::Pipeline;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Pipeline A replays into instrumentation; pipeline B scores from logs.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineArg {
    #[value(alias = "replay")]
    A,
    #[value(alias = "custom")]
    B,
}

impl From<PipelineArg> for Pipeline {
    fn from(p: PipelineArg) -> Self {
        match p {
            PipelineArg::A => Pipeline::Replay,
            PipelineArg::B => Pipeline::Custom,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "planeval", about = "Evaluate agent plan quality from stream logs")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file; defaults to ~/.planeval/config.toml, then ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LogArgs {
    #[arg(long)]
    pub log: PathBuf,

    /// Keep the events parsed before a malformed record instead of failing.
    #[arg(long, default_value_t = false)]
    pub lenient: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ParseArgs {
    #[command(flatten)]
    pub log: LogArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub log: LogArgs,

    #[arg(long)]
    pub task: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub log: LogArgs,

    #[arg(long)]
    pub task: String,

    /// Overrides the final answer found in the log.
    #[arg(long)]
    pub final_answer: Option<String>,

    #[arg(long)]
    pub threshold: Option<f64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub score: ScoreArgs,

    /// Fail instead of scoring from logs when instrumentation is unavailable.
    #[arg(long, default_value_t = false)]
    pub no_fallback: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct BatchArgs {
    /// JSONL file, one `{"log": .., "task": .., "final_answer": ..}` per line.
    #[arg(long)]
    pub manifest: PathBuf,

    #[arg(long, value_enum, default_value_t = PipelineArg::B)]
    pub pipeline: PipelineArg,

    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long)]
    pub threshold: Option<f64>,

    #[arg(long, default_value_t = false)]
    pub lenient: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the canonical events of a log.
    Parse(ParseArgs),
    /// Print the plan reconstructed from a log.
    Plan(PlanArgs),
    /// Score through instrumentation replay (pipeline A).
    Replay(ReplayArgs),
    /// Score straight from the logs (pipeline B).
    Score(ScoreArgs),
    /// Score every run listed in a manifest.
    Batch(BatchArgs),
}
