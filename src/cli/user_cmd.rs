use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum UserCmd {
    #[command(about = "List all users")]
    List,
    #[command(
        about = "Show a user by email",
        long_about = "Look a user up by email and print the full record as JSON (null when absent)."
    )]
    Show {
        #[arg(long, value_name = "EMAIL")]
        email: String,
    },
    #[command(
        about = "Check whether an email is registered",
        long_about = "Print true when a user with EMAIL exists, false otherwise."
    )]
    Exists {
        #[arg(long, value_name = "EMAIL")]
        email: String,
    },
    #[command(about = "Create a user with a hashed password")]
    Create {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD", env = "HEALZY_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },
    #[command(
        about = "Delete a user by id",
        long_about = "Delete a user row. Flashcard sets owned by the user are left in place."
    )]
    Delete {
        #[arg(long, value_name = "ID")]
        id: i64,
    },
}
