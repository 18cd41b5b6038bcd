use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "taalhuizen-service")]
#[command(about = "Scheduled maintenance jobs for the Taalhuizen CommonGround gateway")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "taalhuizen.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log process CPU and memory usage")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Set ACTIVE participations whose end date has passed to COMPLETED
    ParticipationStatus,
    /// Copy date-time values into their stringValue field
    Values,
}

impl Command {
    pub fn job_name(&self) -> &'static str {
        match self {
            Command::ParticipationStatus => "participation-status",
            Command::Values => "values",
        }
    }
}
