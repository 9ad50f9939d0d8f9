use serde::Serialize;
use thiserror::Error;

pub type UserId = i64;
pub type FlashcardSetId = i64;
pub type FlashcardId = i64;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("email already in use: {0}")]
    DuplicateEmail(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("database schema version mismatch (found {found}, expected {expected}); please run with --reset option")]
    SchemaMismatch { found: i64, expected: i64 },
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Unsaved shape of a [`User`]. `id == None` inserts a new row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserDraft {
    pub id: Option<UserId>,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
}

impl UserDraft {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            password_hash: password_hash.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }
}

impl From<User> for UserDraft {
    fn from(user: User) -> Self {
        Self {
            id: Some(user.id),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: FlashcardId,
    pub flashcard_set_id: FlashcardSetId,
    pub position: u32,
    pub term: String,
    pub definition: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewFlashcard {
    pub term: String,
    pub definition: String,
}

impl NewFlashcard {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }
}

impl From<Flashcard> for NewFlashcard {
    fn from(card: Flashcard) -> Self {
        Self {
            term: card.term,
            definition: card.definition,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSet {
    pub id: FlashcardSetId,
    pub title: String,
    pub description: Option<String>,
    pub cards: Vec<Flashcard>,
    /// Raw owner id. Not checked against `users`.
    pub user_id: UserId,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Unsaved shape of a [`FlashcardSet`]. Saving replaces the stored card list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlashcardSetDraft {
    pub id: Option<FlashcardSetId>,
    pub title: String,
    pub description: Option<String>,
    pub user_id: UserId,
    pub cards: Vec<NewFlashcard>,
}

impl FlashcardSetDraft {
    pub fn new(title: impl Into<String>, user_id: UserId) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: None,
            user_id,
            cards: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_cards(mut self, cards: Vec<NewFlashcard>) -> Self {
        self.cards = cards;
        self
    }
}

impl From<FlashcardSet> for FlashcardSetDraft {
    fn from(set: FlashcardSet) -> Self {
        Self {
            id: Some(set.id),
            title: set.title,
            description: set.description,
            user_id: set.user_id,
            cards: set.cards.into_iter().map(NewFlashcard::from).collect(),
        }
    }
}

pub trait UserRepository {
    fn save_user(&self, draft: &UserDraft) -> StorageResult<User>;
    fn find_user(&self, id: UserId) -> StorageResult<Option<User>>;
    fn list_users(&self) -> StorageResult<Vec<User>>;
    fn delete_user(&self, id: UserId) -> StorageResult<bool>;
    fn count_users(&self) -> StorageResult<u64>;
    fn find_by_email(&self, email: &str) -> StorageResult<Option<User>>;
    fn exists_by_email(&self, email: &str) -> StorageResult<bool>;
}

pub trait FlashcardSetRepository {
    fn save_set(&self, draft: &FlashcardSetDraft) -> StorageResult<FlashcardSet>;
    fn find_set(&self, id: FlashcardSetId) -> StorageResult<Option<FlashcardSet>>;
    fn list_sets(&self) -> StorageResult<Vec<FlashcardSet>>;
    fn list_sets_by_user(&self, user_id: UserId) -> StorageResult<Vec<FlashcardSet>>;
    fn list_cards(&self, set_id: FlashcardSetId) -> StorageResult<Vec<Flashcard>>;
    fn delete_set(&self, id: FlashcardSetId) -> StorageResult<bool>;
    fn count_sets(&self) -> StorageResult<u64>;
}

pub trait StorageTx: UserRepository + FlashcardSetRepository {
    fn commit(self) -> StorageResult<()>;
}

pub trait Storage: UserRepository + FlashcardSetRepository {
    type Tx: StorageTx;

    fn begin_tx(&self) -> StorageResult<Self::Tx>;
}
