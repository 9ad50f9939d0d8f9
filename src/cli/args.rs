use clap::Parser;
use std::env;

use crate::auth::{DEFAULT_BCRYPT_COST, DEFAULT_TOKEN_TTL_HOURS, MAX_TOKEN_TTL_HOURS};
use crate::cli::command::Command;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Healzy flashcard backend: REST API and store administration",
    long_about = "Serves the Healzy flashcard REST API backed by a local SQLite store. Run without a subcommand to start the server, or use a subcommand for one-shot administration of users and flashcard sets.",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[arg(
        long,
        env = "HEALZY_DATA_DIR",
        default_value = ".healzy/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,

    #[arg(
        long = "log-file",
        env = "HEALZY_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[arg(
        long = "api-listen",
        env = "HEALZY_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:5000",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,

    #[arg(
        long = "jwt-secret",
        env = "HEALZY_JWT_SECRET",
        value_name = "SECRET",
        hide_env_values = true,
        help = "Secret used to sign session tokens (random per process when unset)"
    )]
    pub jwt_secret: Option<String>,

    #[arg(
        long = "token-ttl-hours",
        env = "HEALZY_TOKEN_TTL_HOURS",
        default_value_t = DEFAULT_TOKEN_TTL_HOURS,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TOKEN_TTL_HOURS),
        value_name = "HOURS",
        help = "Lifetime of issued session tokens"
    )]
    pub token_ttl_hours: u64,

    #[arg(
        long = "bcrypt-cost",
        env = "HEALZY_BCRYPT_COST",
        default_value_t = DEFAULT_BCRYPT_COST,
        value_parser = clap::value_parser!(u32).range(4..=31),
        value_name = "COST",
        help = "bcrypt work factor for password hashes"
    )]
    pub bcrypt_cost: u32,

    #[command(subcommand)]
    pub cmd: Option<Command>,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    dotenvy::from_filename(&dotenv_path).ok();

    Cli::parse()
}
