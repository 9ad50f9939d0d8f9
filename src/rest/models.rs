use serde::{Deserialize, Serialize};

use crate::storage::{Flashcard, FlashcardSet, User};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardRequest {
    pub term: Option<String>,
    pub definition: Option<String>,
}

/// Body of both create and update. On update, absent fields keep their stored value.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashcardSetRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cards: Option<Vec<CardRequest>>,
}

#[derive(Serialize, Deserialize)]
pub struct CardResponse {
    pub id: i64,
    pub term: String,
    pub definition: String,
}

impl From<Flashcard> for CardResponse {
    fn from(card: Flashcard) -> Self {
        Self {
            id: card.id,
            term: card.term,
            definition: card.definition,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSetResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub cards: Vec<CardResponse>,
    pub user_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<FlashcardSet> for FlashcardSetResponse {
    fn from(set: FlashcardSet) -> Self {
        Self {
            id: set.id,
            title: set.title,
            description: set.description,
            cards: set.cards.into_iter().map(CardResponse::from).collect(),
            user_id: set.user_id,
            created_at: set.created_at,
            updated_at: set.updated_at,
        }
    }
}
