pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{
    Flashcard, FlashcardSet, FlashcardSetDraft, FlashcardSetRepository, NewFlashcard, Storage,
    StorageError, User, UserDraft, UserRepository,
};
