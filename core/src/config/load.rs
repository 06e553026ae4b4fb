use std::path::{Path, PathBuf};

use super::types::{AppConfig, JudgeProvider};

/// Get the default planeval data directory: ~/.planeval
pub fn get_planeval_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".planeval"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.planeval/config.toml (highest)
    let data_dir = get_planeval_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg = if user_config.exists() {
        read_config(&user_config)?
    } else if local_config.exists() {
        read_config(local_config)?
    } else {
        AppConfig::default()
    };

    if cfg.logging.file && is_blank(cfg.logging.directory.as_deref()) {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

/// Loads an explicit file; environment overrides still apply.
pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let mut cfg = read_config(path)?;
    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

fn read_config(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
    toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))
}

fn is_blank(v: Option<&str>) -> bool {
    v.map(|s| s.trim().is_empty()).unwrap_or(true)
}

/// Environment variable overrides (Priority 0: highest). `lookup` is
/// `std::env::var` outside tests.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("PLANEVAL_JUDGE_PROVIDER") {
        if v.trim() != cfg.judge.provider.name() {
            cfg.judge.provider = JudgeProvider::from_name(&v)
                .ok_or_else(|| anyhow::anyhow!("unknown judge provider: {v}"))?;
        }
    }

    let provider_key_vars: &[&str] = match cfg.judge.provider {
        JudgeProvider::Gemini(_) => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        JudgeProvider::OpenAi(_) => &["OPENAI_API_KEY"],
    };
    let svc = cfg.judge.provider.service_mut();

    if let Some(v) = get("PLANEVAL_JUDGE_URL") {
        svc.base_url = v;
    }
    if let Some(v) = get("PLANEVAL_JUDGE_MODEL").or_else(|| get("EVAL_MODEL")) {
        svc.model = v;
    }
    if let Some(v) = get("PLANEVAL_JUDGE_API_KEY") {
        svc.api_key = v;
    } else if svc.api_key.trim().is_empty() {
        if let Some(v) = provider_key_vars.iter().find_map(|&k| get(k)) {
            svc.api_key = v;
        }
    }

    if let Some(v) = get("PLANEVAL_THRESHOLD") {
        cfg.scoring.threshold = v
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("PLANEVAL_THRESHOLD is not a number: {v}"))?;
    }
    Ok(())
}
