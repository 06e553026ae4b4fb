//! Plan-quality evaluation for agent runs that are only observable through
//! their stream logs.
//!
//! Logs are parsed into canonical events (`stream_log`), a plan is recovered
//! or synthesized from them (`plan`), and the run is scored either by
//! replaying it into an instrumentation session for a plan-quality metric
//! (`replay`) or by prompting a judge directly from the logs (`scoring`).

pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod plan;
pub mod replay;
pub mod scoring;
pub mod stream_log;
pub mod task;
