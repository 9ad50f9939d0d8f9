use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum SetCmd {
    #[command(
        about = "List flashcard sets",
        long_about = "List every flashcard set, or only those of one owner (newest first) with --user-id."
    )]
    List {
        #[arg(long, value_name = "ID")]
        user_id: Option<i64>,
    },
    #[command(about = "Show a flashcard set with its cards")]
    Show {
        #[arg(long, value_name = "ID")]
        id: i64,
    },
    #[command(
        about = "Delete a flashcard set",
        long_about = "Delete a flashcard set together with all of its cards."
    )]
    Delete {
        #[arg(long, value_name = "ID")]
        id: i64,
    },
}
