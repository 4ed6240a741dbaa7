//! Lab container readiness: existence, state, bulk start, bounded wait.
//!
//! Containers that do not exist at all are a fatal precondition failure for
//! the whole pipeline. Stopped containers get one bulk `docker start` and a
//! bounded readiness poll; anything still down afterwards is logged but does
//! not abort the run.

use std::collections::HashMap;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::pipeline::runlog::RunLog;
use crate::utils::{LabsmokeError, Result};

const START_DEADLINE: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Stopped,
}

/// The expected set partitioned against what `docker ps -a` reported.
#[derive(Debug, Clone, Default)]
pub struct Survey {
    pub running: Vec<String>,
    pub stopped: Vec<String>,
    pub missing: Vec<String>,
}

/// Aggregate readiness after probing (and starting, if needed). `ready` is
/// the AND of every per-container running check.
#[derive(Debug, Clone)]
pub struct Readiness {
    pub ready: bool,
    pub not_running: Vec<String>,
}

pub fn ensure_lab_ready(expected: &[String], log: &mut RunLog) -> Result<Readiness> {
    let observed = observe_containers()?;
    let survey = survey(expected, &observed);

    if !survey.missing.is_empty() {
        let names = survey.missing.join(", ");
        log.line(&format!("FATAL: containers not found: {}", names))?;
        return Err(LabsmokeError::MissingContainers(names));
    }

    for name in &survey.running {
        log.line(&format!("container {} running", name))?;
    }

    let not_running = if survey.stopped.is_empty() {
        vec![]
    } else {
        info!(containers = ?survey.stopped, "starting stopped containers");
        log.line(&format!(
            "starting stopped containers: {}",
            survey.stopped.join(", ")
        ))?;
        start_containers(&survey.stopped, log)?;
        wait_until_running(expected)?
    };

    for name in &not_running {
        warn!(container = %name, "container still not running after start");
        log.line(&format!("WARN: container {} still not running", name))?;
    }

    Ok(Readiness {
        ready: not_running.is_empty(),
        not_running,
    })
}

/// Partition `expected` by observed state. Names absent from the listing are
/// missing entirely.
pub fn survey(expected: &[String], observed: &HashMap<String, ContainerState>) -> Survey {
    let mut result = Survey::default();
    for name in expected {
        match observed.get(name.as_str()) {
            Some(ContainerState::Running) => result.running.push(name.clone()),
            Some(ContainerState::Stopped) => result.stopped.push(name.clone()),
            None => result.missing.push(name.clone()),
        }
    }
    result
}

/// Parse `docker ps -a --format "{{.Names}}\t{{.State}}"` output. Docker
/// reports created/restarting/paused/exited/dead besides running; everything
/// non-running needs a start.
pub fn parse_listing(listing: &str) -> HashMap<String, ContainerState> {
    listing
        .lines()
        .filter_map(|line| {
            let (name, state) = line.split_once('\t')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let state = if state.trim() == "running" {
                ContainerState::Running
            } else {
                ContainerState::Stopped
            };
            Some((name.to_string(), state))
        })
        .collect()
}

fn observe_containers() -> Result<HashMap<String, ContainerState>> {
    let out = Command::new("docker")
        .args(&["ps", "-a", "--format", "{{.Names}}\t{{.State}}"])
        .output()
        .map_err(|e| LabsmokeError::Docker(format!("docker ps failed: {}", e)))?;

    if !out.status.success() {
        return Err(LabsmokeError::Docker(
            "docker ps failed — is Docker running?".to_string(),
        ));
    }

    Ok(parse_listing(&String::from_utf8_lossy(&out.stdout)))
}

/// One bulk start covering the whole stopped subset. A non-zero exit is
/// logged, not fatal: the readiness poll settles what actually came up.
fn start_containers(names: &[String], log: &mut RunLog) -> Result<()> {
    let out = Command::new("docker")
        .arg("start")
        .args(names)
        .output()
        .map_err(|e| LabsmokeError::Docker(format!("docker start failed: {}", e)))?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        warn!(stderr = %stderr, "docker start reported errors");
        log.line(&format!("docker start reported errors: {}", stderr.trim()))?;
    }
    Ok(())
}

/// Poll the runtime until every expected container is running or the
/// deadline passes. Returns the names still not running at the deadline.
fn wait_until_running(expected: &[String]) -> Result<Vec<String>> {
    let deadline = Instant::now() + START_DEADLINE;
    loop {
        let observed = observe_containers()?;
        let not_running: Vec<String> = expected
            .iter()
            .filter(|name| observed.get(name.as_str()) != Some(&ContainerState::Running))
            .cloned()
            .collect();

        if not_running.is_empty() || Instant::now() >= deadline {
            return Ok(not_running);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
