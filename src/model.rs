use thiserror::Error;

use crate::storage::NewFlashcard;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Email and password required")]
    MissingCredentials,
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("title is required")]
    MissingTitle,
    #[error("card {0} needs both a term and a definition")]
    IncompleteCard(usize),
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let email = normalize_email(raw);
    if email.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::InvalidEmail(email));
    }
    Ok(email)
}

pub fn validate_password(raw: &str) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(())
}

pub fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    Ok(title.to_string())
}

fn clean_optional(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Empty descriptions are stored as absent.
pub fn clean_description(raw: Option<String>) -> Option<String> {
    clean_optional(raw)
}

/// Display names are trimmed; blank ones are stored as absent.
pub fn clean_name(raw: Option<String>) -> Option<String> {
    clean_optional(raw)
}

pub fn validate_cards<I>(cards: I) -> Result<Vec<NewFlashcard>, ValidationError>
where
    I: IntoIterator<Item = (String, String)>,
{
    cards
        .into_iter()
        .enumerate()
        .map(|(index, (term, definition))| {
            let term = term.trim();
            let definition = definition.trim();
            if term.is_empty() || definition.is_empty() {
                return Err(ValidationError::IncompleteCard(index));
            }
            Ok(NewFlashcard::new(term, definition))
        })
        .collect()
}
