use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    /// Taken verbatim from a planning event.
    Explicit,
    /// Derived from the tool-call sequence and the task.
    Synthesized,
}

impl PlanSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Synthesized => "synthesized",
        }
    }
}

/// A plan that always has at least one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconstructedPlan {
    source: PlanSource,
    steps: Vec<String>,
    text: String,
}

impl ReconstructedPlan {
    /// `text` is kept verbatim; steps are its non-empty lines.
    pub fn explicit(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut steps: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        if steps.is_empty() {
            steps.push(text.clone());
        }
        Self {
            source: PlanSource::Explicit,
            steps,
            text,
        }
    }

    /// Returns `None` for an empty step list.
    pub fn synthesized(steps: Vec<String>) -> Option<Self> {
        if steps.is_empty() {
            return None;
        }
        let text = steps
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, s))
            .collect::<Vec<_>>()
            .join("\n");
        Some(Self {
            source: PlanSource::Synthesized,
            steps,
            text,
        })
    }

    pub fn single_step(step: impl Into<String>) -> Self {
        let step = step.into();
        Self {
            source: PlanSource::Synthesized,
            text: format!("1. {step}"),
            steps: vec![step],
        }
    }

    pub fn source(&self) -> PlanSource {
        self.source
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
