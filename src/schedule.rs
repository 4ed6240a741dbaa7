//! One-shot cron installer for the lab's periodic config backups.
//!
//! Writes a wrapper script and appends two crontab entries pointing at it.
//! Rerunning appends duplicate entries; the installer warns but does not
//! deduplicate.

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{info, warn};

use crate::utils::{LabsmokeError, Result};

/// Backup playbook, relative to the Ansible project root.
const BACKUP_PLAYBOOK: &str = "playbooks/backup_configs.yml";

pub struct ScheduleConfig {
    pub ansible_dir: PathBuf,
    pub script_path: PathBuf,
    pub backup_log: PathBuf,
}

pub fn install(cfg: &ScheduleConfig) -> Result<()> {
    write_wrapper(cfg)?;
    info!(script = %cfg.script_path.display(), "backup wrapper installed");

    let script = cfg.script_path.display().to_string();
    let current = read_crontab()?;
    if current.contains(&script) {
        warn!("crontab already references the backup wrapper — appending duplicate entries");
    }
    write_crontab(&append_entries(&current, &script))?;
    info!("cron entries installed: daily 02:00, weekly Sunday 03:00");
    Ok(())
}

/// The generated wrapper: enter the project, run the backup playbook,
/// append everything to the shared backup log.
pub fn wrapper_script(ansible_dir: &Path, backup_log: &Path) -> String {
    format!(
        "#!/bin/sh\n\
         # generated by labsmoke — scheduled config backup\n\
         cd {} || exit 1\n\
         ansible-playbook -i inventory.yml {} >> {} 2>&1\n",
        ansible_dir.display(),
        BACKUP_PLAYBOOK,
        backup_log.display()
    )
}

/// Two fixed schedules: daily at 02:00 and Sunday at 03:00.
pub fn append_entries(current: &str, script: &str) -> String {
    let mut table = current.trim_end().to_string();
    if !table.is_empty() {
        table.push('\n');
    }
    table.push_str(&format!("0 2 * * * {}\n", script));
    table.push_str(&format!("0 3 * * 0 {}\n", script));
    table
}

fn write_wrapper(cfg: &ScheduleConfig) -> Result<()> {
    std::fs::write(
        &cfg.script_path,
        wrapper_script(&cfg.ansible_dir, &cfg.backup_log),
    )?;
    let mut perms = std::fs::metadata(&cfg.script_path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&cfg.script_path, perms)?;
    Ok(())
}

fn read_crontab() -> Result<String> {
    let out = Command::new("crontab")
        .arg("-l")
        .output()
        .map_err(|e| LabsmokeError::Cron(format!("crontab -l failed: {}", e)))?;

    if out.status.success() {
        Ok(String::from_utf8_lossy(&out.stdout).to_string())
    } else {
        // missing crontab ("no crontab for user"): start from an empty table
        Ok(String::new())
    }
}

fn write_crontab(table: &str) -> Result<()> {
    let mut child = Command::new("crontab")
        .arg("-")
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| LabsmokeError::Cron(format!("crontab failed: {}", e)))?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin.write_all(table.as_bytes())?;
    }
    let status = child.wait()?;
    if !status.success() {
        return Err(LabsmokeError::Cron(
            "crontab rejected the new table".to_string(),
        ));
    }
    Ok(())
}
