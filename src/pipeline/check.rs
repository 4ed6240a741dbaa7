//! Check descriptors: what the pipeline runs, in order.

use std::fmt;

pub const BENCHMARK_NAME: &str = "benchmark";

const INVENTORY: &str = "inventory.yml";
const BENCHMARK_SECS: u64 = 5;

/// External command as a program plus argv, never an interpolated shell string.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for a in &self.args {
            write!(f, " {}", a)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum CheckAction {
    /// Spawn an external process from the Ansible project root
    Command(CommandSpec),
    /// Probe an HTTP endpoint with the lab's API token
    HttpProbe { url: String },
    /// Fixed sleep, measured. A placeholder, not a real workload
    Benchmark { secs: u64 },
}

/// One named, independently pass/fail step. Order is significant: later
/// checks assume earlier infrastructure is up, but failures never abort
/// the sequence.
#[derive(Debug, Clone)]
pub struct Check {
    pub name: &'static str,
    pub action: CheckAction,
    pub needs_vault: bool,
}

pub fn lab_checks(netbox_url: &str) -> Vec<Check> {
    let api_status = format!("{}/api/status/", netbox_url.trim_end_matches('/'));
    vec![
        Check {
            name: "inventory listing",
            action: CheckAction::Command(CommandSpec::new(
                "ansible-inventory",
                &["-i", INVENTORY, "--list"],
            )),
            needs_vault: true,
        },
        Check {
            name: "connectivity probe",
            action: CheckAction::Command(CommandSpec::new(
                "ansible",
                &["-i", INVENTORY, "all", "-m", "ping"],
            )),
            needs_vault: true,
        },
        Check {
            name: "config push dry-run",
            action: CheckAction::Command(CommandSpec::new(
                "ansible-playbook",
                &["-i", INVENTORY, "playbooks/deploy_configs.yml", "--check"],
            )),
            needs_vault: true,
        },
        Check {
            name: "fact collection",
            action: CheckAction::Command(CommandSpec::new(
                "ansible",
                &["-i", INVENTORY, "all", "-m", "setup"],
            )),
            needs_vault: true,
        },
        Check {
            name: "device state validation",
            action: CheckAction::Command(CommandSpec::new(
                "python3",
                &["../netbox/validate_device_state.py"],
            )),
            needs_vault: false,
        },
        Check {
            name: "device health monitor",
            action: CheckAction::Command(CommandSpec::new(
                "python3",
                &["../netbox/monitor_devices.py"],
            )),
            needs_vault: false,
        },
        Check {
            name: "netbox api",
            action: CheckAction::HttpProbe { url: api_status },
            needs_vault: false,
        },
        Check {
            name: "backup dry-run",
            action: CheckAction::Command(CommandSpec::new(
                "ansible-playbook",
                &["-i", INVENTORY, "playbooks/backup_configs.yml", "--check"],
            )),
            needs_vault: true,
        },
        Check {
            name: "fact sync",
            action: CheckAction::Command(CommandSpec::new(
                "python3",
                &["../netbox/sync_device_facts.py"],
            )),
            needs_vault: false,
        },
        Check {
            name: BENCHMARK_NAME,
            action: CheckAction::Benchmark {
                secs: BENCHMARK_SECS,
            },
            needs_vault: false,
        },
    ]
}
