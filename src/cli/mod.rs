mod args;
mod command;
mod set_cmd;
mod user_cmd;

pub use args::Cli;
pub use command::Command;
pub use set_cmd::SetCmd;
pub use user_cmd::UserCmd;

pub use args::parse;
