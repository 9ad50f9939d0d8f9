use clap::Subcommand;

use crate::cli::set_cmd::SetCmd;
use crate::cli::user_cmd::UserCmd;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(
        about = "User account commands",
        long_about = "Inspect, create and delete user accounts, and look users up by email."
    )]
    User {
        #[command(subcommand)]
        cmd: UserCmd,
    },
    #[command(
        about = "Flashcard set commands",
        long_about = "List, show and delete flashcard sets and their cards."
    )]
    Set {
        #[command(subcommand)]
        cmd: SetCmd,
    },
}
