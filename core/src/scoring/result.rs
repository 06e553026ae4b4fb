use serde::Serialize;

/// Outcome of one scored run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    score: f64,
    reason: String,
    passed: bool,
}

impl ScoreResult {
    /// Clamps `score` into `[0, 1]` and derives `passed` from `threshold`.
    /// Callers reject non-finite scores before getting here.
    pub fn new(score: f64, reason: impl Into<String>, threshold: f64) -> Self {
        let score = score.clamp(0.0, 1.0);
        Self {
            score,
            reason: reason.into(),
            passed: score >= threshold,
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn passed(&self) -> bool {
        self.passed
    }
}
