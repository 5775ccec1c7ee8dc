use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "kubelens",
    version,
    about = "A terminal console for a Kubernetes REST backend."
)]
pub struct CliArgs {
    /// Explicit config file (otherwise discovered)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the console API
    #[arg(long)]
    pub api_url: Option<String>,

    /// Page to open first (dash, po, no, top, wl, svc, ev)
    #[arg(long)]
    pub page: Option<String>,

    /// Lines requested when opening pod logs
    #[arg(long)]
    pub log_tail: Option<u32>,

    /// Refresh period of the node metrics page in seconds
    #[arg(long)]
    pub metrics_interval_secs: Option<u64>,

    /// Events shown on the dashboard
    #[arg(long)]
    pub recent_events: Option<u32>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Write tracing output here instead of discarding it
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
