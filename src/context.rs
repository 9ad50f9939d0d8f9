use std::path::PathBuf;
use std::time::Duration;

use crate::auth::ttl_from_hours;
use crate::cli::Cli;

pub const DB_FILE_NAME: &str = "healzy.sqlite";

#[derive(Clone, Debug)]
pub struct Context {
    pub data_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub reset: bool,
    pub api_listen: std::net::SocketAddr,
    pub jwt_secret: Option<String>,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            data_dir: PathBuf::from(&cli.data_dir),
            log_file: cli.log_file.as_ref().map(PathBuf::from),
            reset: cli.reset,
            api_listen: cli.api_listen,
            jwt_secret: cli.jwt_secret.clone(),
            token_ttl: ttl_from_hours(cli.token_ttl_hours),
            bcrypt_cost: cli.bcrypt_cost,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}
