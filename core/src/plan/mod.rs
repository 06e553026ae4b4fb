pub mod model;
pub mod reconstruct;
pub mod steps;

pub use model::{PlanSource, ReconstructedPlan};
pub use reconstruct::reconstruct;
pub use steps::{describe_call, describe_task, ToolCategory};
