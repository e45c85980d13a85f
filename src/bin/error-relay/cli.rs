use std::path::PathBuf;

use clap::{ArgAction, Parser};
use error_relay::types::UpdateMode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Relays client error reports to a Telegram administrator", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the HTTP listen port.
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// How admin updates are received: polling, webhook or disabled.
    #[arg(long, value_name = "MODE")]
    pub updates: Option<UpdateMode>,

    /// Log notifications instead of sending them.
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Emit JSON logs (needs `--features json-logs`).
    #[arg(long, action = ArgAction::SetTrue)]
    pub json_logs: bool,

    /// Explicit log filter (e.g. "error_relay=debug").
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
