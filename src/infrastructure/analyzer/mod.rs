mod process_runner;
mod supervised_runner;

pub use process_runner::{ProcessAnalysisRunner, log_tail};
pub use supervised_runner::SupervisedAnalysisRunner;
