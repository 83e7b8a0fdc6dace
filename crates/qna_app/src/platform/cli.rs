use std::path::PathBuf;

use clap::Parser;

use super::logging::LogDestination;

/// Terminal chat client for the Q&A backend.
#[derive(Debug, Default, Parser)]
#[command(name = "qna-chat", version, about)]
pub struct Cli {
    /// RON config file (defaults to ./qna_chat.ron when present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Backend origin, e.g. http://localhost:8080.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Path prefix of the backend endpoints; pass "" for none.
    #[arg(long)]
    pub api_prefix: Option<String>,

    /// Delay between status polls while the backend initializes.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Directory holding the stored API key.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Keep the API key in memory only.
    #[arg(long)]
    pub ephemeral: bool,

    #[arg(long, value_enum)]
    pub log: Option<LogDestination>,

    /// Log debug output.
    #[arg(short, long)]
    pub verbose: bool,
}
