//! CLI parser. Every option can also come from the environment (and `.env`).

use clap::{Args, Parser, Subcommand};
use dispatcher::Affinity;

#[derive(Parser, Debug)]
#[command(name = "newsfeed")]
#[command(about = "Newsfeed bot: article summaries for authorized chats", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, env = "JSON_LOGS", global = true)]
    pub json_logs: bool,

    /// Debug level logging and verbose request logs.
    #[arg(long = "dbg", env = "DEBUG", global = true)]
    pub debug: bool,

    /// Also append logs to this file.
    #[arg(long, env = "LOG_FILE", global = true)]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bot on the console: stdin lines in, responses on stdout.
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Per-request timeout in seconds.
    #[arg(long, env = "BOT_TIMEOUT_SECS", default_value_t = 360)]
    pub timeout_secs: u64,

    /// Admin chat ids, comma separated.
    #[arg(long, env = "BOT_ADMIN_IDS", value_delimiter = ',')]
    pub admin_ids: Vec<String>,

    /// Token a chat sends to become authorized.
    #[arg(long, env = "BOT_AUTH_TOKEN")]
    pub auth_token: String,

    #[arg(long, env = "BOT_WORKERS", default_value_t = 10)]
    pub workers: usize,

    /// Capacity of the inbound queue.
    #[arg(long, env = "BOT_QUEUE_CAPACITY", default_value_t = 100)]
    pub queue_capacity: usize,

    /// Request distribution: `shared` or `chat` (per-chat ordering).
    #[arg(long, env = "BOT_AFFINITY", default_value = "chat")]
    pub affinity: Affinity,

    /// Chat id assigned to console input.
    #[arg(long, env = "CONSOLE_CHAT_ID", default_value = "console")]
    pub chat_id: String,

    #[arg(long, env = "CONSOLE_USERNAME")]
    pub username: Option<String>,
}
