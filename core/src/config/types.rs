use serde::{Deserialize, Serialize};

use crate::stream_log::ParseOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub parser: ParseOptions,

    #[serde(default)]
    pub judge: JudgeConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub replay: ReplayConfig,
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.scoring.threshold) {
            anyhow::bail!(
                "scoring.threshold must be within [0, 1], got {}",
                self.scoring.threshold
            );
        }
        if self.scoring.batch_concurrency == 0 {
            anyhow::bail!("scoring.batch_concurrency must be at least 1");
        }
        if self.judge.timeout_ms == 0 {
            anyhow::bail!("judge.timeout_ms must be positive");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "planeval=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    #[serde(flatten)]
    pub provider: JudgeProvider,

    #[serde(default = "default_judge_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            provider: JudgeProvider::Gemini(JudgeServiceConfig::gemini()),
            timeout_ms: default_judge_timeout_ms(),
        }
    }
}

fn default_judge_timeout_ms() -> u64 {
    60_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum JudgeProvider {
    #[serde(rename = "gemini")]
    Gemini(JudgeServiceConfig),
    #[serde(rename = "openai")]
    OpenAi(JudgeServiceConfig),
}

impl JudgeProvider {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini(JudgeServiceConfig::gemini())),
            "openai" => Some(Self::OpenAi(JudgeServiceConfig::openai())),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gemini(_) => "gemini",
            Self::OpenAi(_) => "openai",
        }
    }

    pub fn service(&self) -> &JudgeServiceConfig {
        match self {
            Self::Gemini(c) | Self::OpenAi(c) => c,
        }
    }

    pub fn service_mut(&mut self) -> &mut JudgeServiceConfig {
        match self {
            Self::Gemini(c) | Self::OpenAi(c) => c,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeServiceConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
}

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

impl JudgeServiceConfig {
    pub fn gemini() -> Self {
        Self {
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: String::new(),
            model: GEMINI_DEFAULT_MODEL.to_string(),
        }
    }

    pub fn openai() -> Self {
        Self {
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: String::new(),
            model: OPENAI_DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Tool results longer than this are cut before they reach the judge.
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,

    #[serde(default = "default_include_final_output")]
    pub include_final_output: bool,

    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

fn default_threshold() -> f64 {
    0.5
}

fn default_max_output_chars() -> usize {
    500
}

fn default_include_final_output() -> bool {
    true
}

fn default_batch_concurrency() -> usize {
    4
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            max_output_chars: default_max_output_chars(),
            include_final_output: default_include_final_output(),
            batch_concurrency: default_batch_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentationKind {
    #[default]
    InMemory,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    #[serde(default)]
    pub instrumentation: InstrumentationKind,

    #[serde(default = "default_trace_name")]
    pub trace_name: String,

    /// Score through the custom pipeline when instrumentation is unavailable.
    #[serde(default = "default_fallback_to_custom")]
    pub fallback_to_custom: bool,
}

fn default_trace_name() -> String {
    crate::replay::DEFAULT_TRACE_NAME.to_string()
}

fn default_fallback_to_custom() -> bool {
    true
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            instrumentation: InstrumentationKind::default(),
            trace_name: default_trace_name(),
            fallback_to_custom: default_fallback_to_custom(),
        }
    }
}
