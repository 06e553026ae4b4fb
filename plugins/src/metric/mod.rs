pub mod plan_quality;

pub use plan_quality::JudgePlanQualityMetric;
