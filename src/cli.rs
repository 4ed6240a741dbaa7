use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::RunConfig;
use crate::schedule::ScheduleConfig;

// Static API token provisioned with the lab's NetBox container
const DEFAULT_NETBOX_TOKEN: &str = "c316eac1941ee8fdd5059e4f9e777648459ab551";

#[derive(Parser)]
#[command(name = "labsmoke")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")"))]
#[command(about = "Network lab smoke testing and backup scheduling tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the smoke-test pipeline against the lab
    Run(RunArgs),

    /// Install the periodic config-backup cron jobs
    Schedule(ScheduleArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Ansible project root
    #[arg(short, long, default_value = "/opt/netlab/ansible")]
    ansible_dir: PathBuf,

    /// Expected lab containers
    #[arg(short, long, default_value = "R1,R2,R3", value_delimiter = ',')]
    containers: Vec<String>,

    /// NetBox base URL
    #[arg(long, default_value = "http://localhost:8000")]
    netbox_url: String,

    /// NetBox API token
    #[arg(long, default_value = DEFAULT_NETBOX_TOKEN)]
    netbox_token: String,

    /// Vault password file (default: .vault_pass in the Ansible root)
    #[arg(long)]
    vault_file: Option<PathBuf>,

    /// Directory for run logs and the HTML report
    #[arg(short, long, default_value = "/opt/netlab/logs")]
    log_dir: PathBuf,

    /// Console output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,
}

impl RunArgs {
    pub fn into_config(self) -> RunConfig {
        let vault_file = self
            .vault_file
            .unwrap_or_else(|| self.ansible_dir.join(".vault_pass"));
        RunConfig {
            ansible_dir: self.ansible_dir,
            containers: self.containers,
            netbox_url: self.netbox_url,
            netbox_token: self.netbox_token,
            vault_file,
            log_dir: self.log_dir,
            format: self.format,
        }
    }
}

#[derive(Args)]
pub struct ScheduleArgs {
    /// Ansible project root
    #[arg(short, long, default_value = "/opt/netlab/ansible")]
    ansible_dir: PathBuf,

    /// Install path for the generated backup wrapper
    #[arg(short, long, default_value = "/usr/local/bin/labsmoke-backup.sh")]
    script_path: PathBuf,

    /// Shared log the scheduled backups append to
    #[arg(short, long, default_value = "/opt/netlab/logs/backup.log")]
    backup_log: PathBuf,
}

impl ScheduleArgs {
    pub fn into_config(self) -> ScheduleConfig {
        ScheduleConfig {
            ansible_dir: self.ansible_dir,
            script_path: self.script_path,
            backup_log: self.backup_log,
        }
    }
}
