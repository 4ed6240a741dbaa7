pub mod check;
pub mod output;
pub mod prober;
pub mod report;
pub mod runlog;
pub mod runner;

use std::path::PathBuf;

use tracing::info;

use crate::utils::Result;
use check::{lab_checks, Check};
use report::{CheckOutcome, RunSummary};
use runlog::RunLog;
use runner::RunContext;

pub const REPORT_FILE: &str = "smoke_report.html";

pub struct RunConfig {
    pub ansible_dir: PathBuf,
    pub containers: Vec<String>,
    pub netbox_url: String,
    pub netbox_token: String,
    pub vault_file: PathBuf,
    pub log_dir: PathBuf,
    pub format: String,
}

/// Drive the whole pipeline: probe the lab, run every check in order,
/// reduce the outcomes, write the report. Returns the failed-check count.
pub fn run_pipeline(cfg: &RunConfig) -> Result<usize> {
    let started_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let mut log = RunLog::create(&cfg.log_dir)?;
    info!(log = %log.path().display(), "smoke test run started");
    log.line("smoke test run started")?;

    // Missing containers abort here: no checks, no report, exit 1.
    let readiness = prober::ensure_lab_ready(&cfg.containers, &mut log)?;
    if !readiness.ready {
        log.line(&format!(
            "proceeding despite containers not running: {}",
            readiness.not_running.join(", ")
        ))?;
    }

    let ctx = RunContext {
        ansible_dir: cfg.ansible_dir.clone(),
        vault_file: cfg.vault_file.clone(),
        netbox_token: cfg.netbox_token.clone(),
    };

    let outcomes = execute_checks(&lab_checks(&cfg.netbox_url), &ctx, &mut log)?;

    let summary = RunSummary::from_outcomes(started_at, outcomes);
    log.line(&format!(
        "run finished: {} passed, {} failed",
        summary.passed, summary.failed
    ))?;

    let report_path = cfg.log_dir.join(REPORT_FILE);
    output::write_html(&summary, &log.content()?, &report_path)?;
    info!(report = %report_path.display(), "report written");

    output::display(&summary, &cfg.format)?;

    Ok(summary.failed)
}

/// Strictly sequential; a failing check is recorded and the sequence
/// continues to the end.
fn execute_checks(
    checks: &[Check],
    ctx: &RunContext,
    log: &mut RunLog,
) -> Result<Vec<CheckOutcome>> {
    let mut outcomes = Vec::with_capacity(checks.len());
    for check in checks {
        outcomes.push(runner::run(check, ctx, log)?);
    }
    Ok(outcomes)
}
