//! Per-run log file: timestamped plain text, one file per run.
//!
//! The log and the HTML report are the pipeline's only durable outputs.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::utils::Result;

pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Create `smoke_test_YYYYMMDD_HHMMSS.log` under `dir`, creating the
    /// directory if needed.
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("smoke_test_{}.log", stamp));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line.
    pub fn line(&mut self, msg: &str) -> Result<()> {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.file, "[{}] {}", stamp, msg)?;
        Ok(())
    }

    /// Append raw command output, unprefixed.
    pub fn raw(&mut self, chunk: &str) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        writeln!(self.file, "{}", chunk.trim_end_matches('\n'))?;
        Ok(())
    }

    /// Full verbatim content, for the report.
    pub fn content(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}
