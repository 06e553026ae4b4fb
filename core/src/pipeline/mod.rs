pub mod model;
pub mod report;
pub mod run;

pub use model::{Pipeline, RunError, RunReport};
pub use report::{build_report, format_text};
pub use run::{Evaluator, Scored};
