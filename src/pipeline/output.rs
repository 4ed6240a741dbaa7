//! Output layer: console summary (text or json) and the HTML report file.

use std::path::Path;

use crate::pipeline::report::RunSummary;
use crate::utils::{LabsmokeError, Result};

pub fn display(summary: &RunSummary, format: &str) -> Result<()> {
    match format {
        "json" => display_json(summary),
        "text" => {
            display_text(summary);
            Ok(())
        }
        other => Err(LabsmokeError::System(format!("unknown format: {}", other))),
    }
}

// ── JSON ────────────────────────────────────────────────────────────────────

fn display_json(summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| LabsmokeError::System(format!("JSON serialize: {}", e)))?;
    println!("{}", json);
    Ok(())
}

// ── Text ────────────────────────────────────────────────────────────────────

fn display_text(summary: &RunSummary) {
    print_section("SMOKE TEST SUMMARY");
    println!("  Started      : {}", summary.started_at);
    println!("  Finished     : {}", summary.finished_at);
    println!("  Passed       : {}", summary.passed);
    println!("  Failed       : {}", summary.failed);
    if let Some(bench) = summary.benchmark_secs {
        println!("  Benchmark    : {:.2}s", bench);
    }

    print_section(&format!("CHECKS ({})", summary.outcomes.len()));
    for (i, o) in summary.outcomes.iter().enumerate() {
        let icon = if o.passed { "●" } else { "○" };
        println!(
            "  [{}/{}] {} {}  ({:.1}s)",
            i + 1,
            summary.outcomes.len(),
            icon,
            o.name,
            o.duration_secs
        );
        if !o.passed && !o.excerpt.is_empty() {
            for line in o.excerpt.lines() {
                println!("        {}", line);
            }
        }
    }
    println!();
}

fn print_section(title: &str) {
    println!("\n{}", "─".repeat(60));
    println!("  {}", title);
    println!("{}", "─".repeat(60));
}

// ── HTML report ─────────────────────────────────────────────────────────────

/// One overwritten report per run: counters, benchmark duration, generation
/// stamp, per-check table, and the full run log verbatim.
pub fn write_html(summary: &RunSummary, log_content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, render_html(summary, log_content))?;
    Ok(())
}

pub fn render_html(summary: &RunSummary, log_content: &str) -> String {
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let benchmark = summary
        .benchmark_secs
        .map(|s| format!("{:.2}s", s))
        .unwrap_or_else(|| "n/a".to_string());

    let mut rows = String::new();
    for o in &summary.outcomes {
        let (class, verdict) = if o.passed {
            ("pass", "passed")
        } else {
            ("fail", "FAILED")
        };
        rows.push_str(&format!(
            "    <tr class=\"{}\"><td>{}</td><td>{}</td><td>{:.1}s</td></tr>\n",
            class,
            escape_html(&o.name),
            verdict,
            o.duration_secs
        ));
    }

    format!(
        "<!DOCTYPE html>\n\
         <html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Lab Smoke Test Report</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; margin: 2em; }}\n\
         table {{ border-collapse: collapse; }}\n\
         td, th {{ border: 1px solid #999; padding: 4px 12px; }}\n\
         tr.pass td {{ background: #e6ffe6; }}\n\
         tr.fail td {{ background: #ffe6e6; }}\n\
         pre {{ background: #f4f4f4; padding: 1em; overflow-x: auto; }}\n\
         </style>\n</head>\n<body>\n\
         <h1>Lab Smoke Test Report</h1>\n\
         <p>Generated: {generated}</p>\n\
         <table>\n\
         <tr><th>Tests Passed</th><td>{passed}</td></tr>\n\
         <tr><th>Tests Failed</th><td>{failed}</td></tr>\n\
         <tr><th>Benchmark</th><td>{benchmark}</td></tr>\n\
         <tr><th>Started</th><td>{started}</td></tr>\n\
         <tr><th>Finished</th><td>{finished}</td></tr>\n\
         </table>\n\
         <h2>Checks</h2>\n\
         <table>\n\
         <tr><th>Check</th><th>Result</th><th>Duration</th></tr>\n\
         {rows}\
         </table>\n\
         <h2>Run Log</h2>\n\
         <pre>{log}</pre>\n\
         </body>\n</html>\n",
        generated = generated,
        passed = summary.passed,
        failed = summary.failed,
        benchmark = benchmark,
        started = escape_html(&summary.started_at),
        finished = escape_html(&summary.finished_at),
        rows = rows,
        log = escape_html(log_content),
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::report::CheckOutcome;

    fn summary() -> RunSummary {
        RunSummary::from_outcomes(
            "2026-01-01 12:00:00".to_string(),
            vec![
                CheckOutcome {
                    name: "inventory listing".to_string(),
                    passed: true,
                    duration_secs: 1.2,
                    excerpt: String::new(),
                },
                CheckOutcome {
                    name: "connectivity probe".to_string(),
                    passed: false,
                    duration_secs: 0.4,
                    excerpt: "unreachable".to_string(),
                },
            ],
        )
    }

    #[test]
    fn html_embeds_counters_and_log() {
        let html = render_html(&summary(), "[ts] check started\nPLAY RECAP");
        assert!(html.contains("<th>Tests Passed</th><td>1</td>"));
        assert!(html.contains("<th>Tests Failed</th><td>1</td>"));
        assert!(html.contains("PLAY RECAP"));
        assert!(html.contains("inventory listing"));
    }

    #[test]
    fn html_escapes_log_content() {
        let html = render_html(&summary(), "<script>alert(1)</script> & more");
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; more"));
    }

    #[test]
    fn html_marks_benchmark_missing_as_na() {
        let html = render_html(&summary(), "");
        assert!(html.contains("<th>Benchmark</th><td>n/a</td>"));
    }

    #[test]
    fn report_file_is_overwritten_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smoke_report.html");
        write_html(&summary(), "first run", &path).unwrap();
        write_html(&summary(), "second run", &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("second run"));
        assert!(!content.contains("first run"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(display(&summary(), "yaml").is_err());
    }
}
