//! Executes a single check and records its outcome.
//!
//! Synchronous and blocking: the pipeline does not move on until the check
//! completes. External commands carry no timeout; a hung tool hangs the run.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::pipeline::check::{Check, CheckAction, CommandSpec};
use crate::pipeline::report::CheckOutcome;
use crate::pipeline::runlog::RunLog;
use crate::utils::{LabsmokeError, Result};

const EXCERPT_LINES: usize = 5;
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a check needs besides its own descriptor.
pub struct RunContext {
    pub ansible_dir: PathBuf,
    pub vault_file: PathBuf,
    pub netbox_token: String,
}

struct StepResult {
    passed: bool,
    excerpt: String,
    no_vault: bool,
}

pub fn run(check: &Check, ctx: &RunContext, log: &mut RunLog) -> Result<CheckOutcome> {
    log.line(&format!("=== {} ===", check.name))?;
    let started = Instant::now();

    let step = match &check.action {
        CheckAction::Command(spec) => run_command(check, spec, ctx, log)?,
        CheckAction::HttpProbe { url } => run_http_probe(url, &ctx.netbox_token, log)?,
        CheckAction::Benchmark { secs } => run_benchmark(*secs, log)?,
    };

    let duration_secs = started.elapsed().as_secs_f64();
    let verdict = if step.passed { "passed" } else { "FAILED" };
    let vault_note = if step.no_vault { " (no vault)" } else { "" };
    info!(check = check.name, passed = step.passed, "check finished");
    log.line(&format!(
        "{}: {}{} ({:.1}s)",
        check.name, verdict, vault_note, duration_secs
    ))?;

    Ok(CheckOutcome {
        name: check.name.to_string(),
        passed: step.passed,
        duration_secs,
        excerpt: step.excerpt,
    })
}

/// The vault flag pair, only when the password file is actually present.
/// Checked freshly per invocation; the file may appear or vanish mid-run.
pub fn vault_args(vault_file: &Path) -> Option<Vec<String>> {
    if vault_file.is_file() {
        Some(vec![
            "--vault-password-file".to_string(),
            vault_file.display().to_string(),
        ])
    } else {
        None
    }
}

fn run_command(
    check: &Check,
    spec: &CommandSpec,
    ctx: &RunContext,
    log: &mut RunLog,
) -> Result<StepResult> {
    // Precondition: the project root must exist before anything is spawned
    if !ctx.ansible_dir.is_dir() {
        let msg = format!(
            "ansible project root not found: {}",
            ctx.ansible_dir.display()
        );
        warn!("{}", msg);
        log.line(&msg)?;
        return Ok(StepResult {
            passed: false,
            excerpt: msg,
            no_vault: false,
        });
    }

    let mut argv = spec.args.clone();
    let mut no_vault = false;
    if check.needs_vault {
        match vault_args(&ctx.vault_file) {
            Some(extra) => argv.extend(extra),
            None => {
                no_vault = true;
                warn!(path = %ctx.vault_file.display(), "no vault password file");
                log.line("no vault password file — running without credentials")?;
            }
        }
    }

    log.line(&format!("running: {} {}", spec.program, argv.join(" ")))?;

    let out = Command::new(&spec.program)
        .args(&argv)
        .current_dir(&ctx.ansible_dir)
        .output();

    match out {
        Ok(out) => {
            let stdout = String::from_utf8_lossy(&out.stdout);
            let stderr = String::from_utf8_lossy(&out.stderr);
            log.raw(&stdout)?;
            log.raw(&stderr)?;
            Ok(StepResult {
                passed: out.status.success(),
                excerpt: excerpt(&stdout, &stderr),
                no_vault,
            })
        }
        Err(e) => {
            let msg = format!("failed to spawn {}: {}", spec.program, e);
            log.line(&msg)?;
            Ok(StepResult {
                passed: false,
                excerpt: msg,
                no_vault,
            })
        }
    }
}

/// Reachability only: success status plus a non-empty body. The payload is
/// never validated; the NetBox version is logged when it happens to parse.
fn run_http_probe(url: &str, token: &str, log: &mut RunLog) -> Result<StepResult> {
    log.line(&format!("probing {}", url))?;

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| LabsmokeError::Http(format!("HTTP client: {}", e)))?;

    let resp = client
        .get(url)
        .header("Authorization", format!("Token {}", token))
        .send();

    match resp {
        Ok(resp) => {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            let passed = status.is_success() && !body.is_empty();
            log.line(&format!("endpoint returned {} ({} bytes)", status, body.len()))?;

            if let Ok(v) = serde_json::from_str::<serde_json::Value>(&body) {
                if let Some(ver) = v["netbox-version"].as_str() {
                    log.line(&format!("netbox version: {}", ver))?;
                }
            }

            Ok(StepResult {
                passed,
                excerpt: format!("{} ({} bytes)", status, body.len()),
                no_vault: false,
            })
        }
        Err(e) => {
            let msg = format!("endpoint unreachable: {}", e);
            log.line(&msg)?;
            Ok(StepResult {
                passed: false,
                excerpt: msg,
                no_vault: false,
            })
        }
    }
}

/// Fixed sleep, measured. A placeholder for a real workload; always passes.
fn run_benchmark(secs: u64, log: &mut RunLog) -> Result<StepResult> {
    log.line(&format!("benchmark: sleeping {}s", secs))?;
    let started = Instant::now();
    thread::sleep(Duration::from_secs(secs));
    let elapsed = started.elapsed().as_secs_f64();
    Ok(StepResult {
        passed: true,
        excerpt: format!("{:.2}s", elapsed),
        no_vault: false,
    })
}

/// Last non-blank lines of combined output, for the summary table.
fn excerpt(stdout: &str, stderr: &str) -> String {
    let mut lines: Vec<&str> = stdout
        .lines()
        .chain(stderr.lines())
        .filter(|l| !l.trim().is_empty())
        .collect();
    let skip = lines.len().saturating_sub(EXCERPT_LINES);
    lines.drain(..skip);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn ctx(dir: &Path) -> RunContext {
        RunContext {
            ansible_dir: dir.to_path_buf(),
            vault_file: dir.join(".vault_pass"),
            netbox_token: "testtoken".to_string(),
        }
    }

    fn command_check(name: &'static str, program: &str, args: &[&str]) -> Check {
        Check {
            name,
            action: CheckAction::Command(CommandSpec::new(program, args)),
            needs_vault: false,
        }
    }

    #[test]
    fn zero_exit_passes() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::create(dir.path()).unwrap();
        let check = command_check("ok", "true", &[]);
        let outcome = run(&check, &ctx(dir.path()), &mut log).unwrap();
        assert!(outcome.passed);
    }

    #[test]
    fn nonzero_exit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::create(dir.path()).unwrap();
        let check = command_check("bad", "false", &[]);
        let outcome = run(&check, &ctx(dir.path()), &mut log).unwrap();
        assert!(!outcome.passed);
    }

    #[test]
    fn unspawnable_program_fails_without_erroring_the_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::create(dir.path()).unwrap();
        let check = command_check("ghost", "definitely-not-a-real-binary", &[]);
        let outcome = run(&check, &ctx(dir.path()), &mut log).unwrap();
        assert!(!outcome.passed);
        assert!(outcome.excerpt.contains("failed to spawn"));
    }

    #[test]
    fn missing_project_root_fails_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::create(dir.path()).unwrap();
        let mut context = ctx(dir.path());
        context.ansible_dir = dir.path().join("nonexistent");
        let check = command_check("ok", "true", &[]);
        let outcome = run(&check, &context, &mut log).unwrap();
        assert!(!outcome.passed);
        assert!(outcome.excerpt.contains("not found"));
        // no "running:" line means nothing was spawned
        assert!(!log.content().unwrap().contains("running:"));
    }

    #[test]
    fn missing_vault_file_warns_and_runs_without_the_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::create(dir.path()).unwrap();
        let check = Check {
            name: "inventory listing",
            action: CheckAction::Command(CommandSpec::new("true", &[])),
            needs_vault: true,
        };
        let outcome = run(&check, &ctx(dir.path()), &mut log).unwrap();
        assert!(outcome.passed);

        let content = log.content().unwrap();
        assert!(content.contains("no vault password file"));
        assert!(content.contains("passed (no vault)"));
        assert!(!content.contains("--vault-password-file"));
    }

    #[test]
    fn present_vault_file_adds_the_flag_pair() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".vault_pass"), "secret\n").unwrap();
        let mut log = RunLog::create(dir.path()).unwrap();
        let check = Check {
            name: "inventory listing",
            action: CheckAction::Command(CommandSpec::new("true", &[])),
            needs_vault: true,
        };
        let outcome = run(&check, &ctx(dir.path()), &mut log).unwrap();
        assert!(outcome.passed);
        assert!(log.content().unwrap().contains("--vault-password-file"));
    }

    #[test]
    fn vault_args_reflect_file_presence() {
        let dir = tempfile::tempdir().unwrap();
        let vault = dir.path().join(".vault_pass");
        assert!(vault_args(&vault).is_none());
        std::fs::write(&vault, "secret\n").unwrap();
        let args = vault_args(&vault).unwrap();
        assert_eq!(args[0], "--vault-password-file");
        assert_eq!(args[1], vault.display().to_string());
    }

    #[test]
    fn command_output_lands_in_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::create(dir.path()).unwrap();
        let check = command_check("echo", "echo", &["hello", "lab"]);
        let outcome = run(&check, &ctx(dir.path()), &mut log).unwrap();
        assert!(outcome.passed);
        assert!(log.content().unwrap().contains("hello lab"));
        assert_eq!(outcome.excerpt, "hello lab");
    }

    #[test]
    fn http_probe_passes_on_success_with_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/status/")
                .header("Authorization", "Token testtoken");
            then.status(200)
                .body("{\"netbox-version\": \"4.1.3\"}");
        });

        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::create(dir.path()).unwrap();
        let check = Check {
            name: "netbox api",
            action: CheckAction::HttpProbe {
                url: server.url("/api/status/"),
            },
            needs_vault: false,
        };
        let outcome = run(&check, &ctx(dir.path()), &mut log).unwrap();
        assert!(outcome.passed);
        assert!(log.content().unwrap().contains("netbox version: 4.1.3"));
        mock.assert();
    }

    #[test]
    fn http_probe_fails_on_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/status/");
            then.status(503).body("service unavailable");
        });

        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::create(dir.path()).unwrap();
        let check = Check {
            name: "netbox api",
            action: CheckAction::HttpProbe {
                url: server.url("/api/status/"),
            },
            needs_vault: false,
        };
        let outcome = run(&check, &ctx(dir.path()), &mut log).unwrap();
        assert!(!outcome.passed);
    }

    #[test]
    fn http_probe_fails_on_empty_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/status/");
            then.status(200);
        });

        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::create(dir.path()).unwrap();
        let check = Check {
            name: "netbox api",
            action: CheckAction::HttpProbe {
                url: server.url("/api/status/"),
            },
            needs_vault: false,
        };
        let outcome = run(&check, &ctx(dir.path()), &mut log).unwrap();
        assert!(!outcome.passed);
    }

    #[test]
    fn http_probe_fails_when_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::create(dir.path()).unwrap();
        let check = Check {
            name: "netbox api",
            action: CheckAction::HttpProbe {
                // reserved port nothing listens on
                url: "http://127.0.0.1:1/api/status/".to_string(),
            },
            needs_vault: false,
        };
        let outcome = run(&check, &ctx(dir.path()), &mut log).unwrap();
        assert!(!outcome.passed);
        assert!(outcome.excerpt.contains("unreachable"));
    }

    #[test]
    fn benchmark_always_passes_and_measures() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::create(dir.path()).unwrap();
        let check = Check {
            name: "benchmark",
            action: CheckAction::Benchmark { secs: 0 },
            needs_vault: false,
        };
        let outcome = run(&check, &ctx(dir.path()), &mut log).unwrap();
        assert!(outcome.passed);
        assert!(outcome.duration_secs >= 0.0);
    }

    #[test]
    fn excerpt_keeps_the_tail_only() {
        let stdout = "1\n2\n3\n4\n5\n6\n7\n";
        assert_eq!(excerpt(stdout, ""), "3\n4\n5\n6\n7");
        assert_eq!(excerpt("one\n", "err\n"), "one\nerr");
        assert_eq!(excerpt("", ""), "");
    }
}
