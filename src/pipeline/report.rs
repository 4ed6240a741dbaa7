//! Accumulated run state: per-check outcomes reduced to the summary.

use serde::{Deserialize, Serialize};

use crate::pipeline::check::BENCHMARK_NAME;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    pub duration_secs: f64,
    /// Tail of the command's combined output
    pub excerpt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: String,
    pub finished_at: String,
    pub passed: usize,
    pub failed: usize,
    pub benchmark_secs: Option<f64>,
    pub outcomes: Vec<CheckOutcome>,
}

impl RunSummary {
    /// Reduce the ordered outcome sequence once, at the end of the run.
    /// `passed + failed` always equals the number of checks attempted.
    pub fn from_outcomes(started_at: String, outcomes: Vec<CheckOutcome>) -> Self {
        let passed = outcomes.iter().filter(|o| o.passed).count();
        let failed = outcomes.len() - passed;
        let benchmark_secs = outcomes
            .iter()
            .find(|o| o.name == BENCHMARK_NAME)
            .map(|o| o.duration_secs);

        Self {
            started_at,
            finished_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            passed,
            failed,
            benchmark_secs,
            outcomes,
        }
    }
}
