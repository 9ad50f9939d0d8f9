use rusqlite::{ffi, params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::traits::{
    Flashcard, FlashcardSet, FlashcardSetDraft, FlashcardSetId, FlashcardSetRepository, Storage,
    StorageError, StorageResult, StorageTx, User, UserDraft, UserId, UserRepository,
};
use crate::model::normalize_email;

const DB_SCHEMA_VERSION: i64 = 1;

const USER_COLUMNS: &str = "id, email, password_hash, name, created_at, updated_at";
const SET_COLUMNS: &str = "id, title, description, user_id, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct SqliteStorage {
    pub path: String,
}

pub struct SqliteTx {
    conn: Connection,
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn open_conn(path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(std::time::Duration::from_millis(500))?;
    Ok(conn)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn map_card_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Flashcard> {
    let position: i64 = row.get(2)?;
    let position: u32 = position.try_into().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, Box::new(err))
    })?;
    Ok(Flashcard {
        id: row.get(0)?,
        flashcard_set_id: row.get(1)?,
        position,
        term: row.get(3)?,
        definition: row.get(4)?,
    })
}

// Cards are filled in separately by `with_cards`.
fn map_set_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FlashcardSet> {
    Ok(FlashcardSet {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        cards: Vec::new(),
        user_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn db_find_user(conn: &Connection, id: UserId) -> StorageResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            map_user_row,
        )
        .optional()?;
    Ok(user)
}

fn db_find_by_email(conn: &Connection, email: &str) -> StorageResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![normalize_email(email)],
            map_user_row,
        )
        .optional()?;
    Ok(user)
}

fn db_exists_by_email(conn: &Connection, email: &str) -> StorageResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM users WHERE email = ?1 LIMIT 1",
            params![normalize_email(email)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn db_list_users(conn: &Connection) -> StorageResult<Vec<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
    let users = stmt
        .query_map([], map_user_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
}

fn db_count(conn: &Connection, table: &str) -> StorageResult<u64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(count as u64)
}

fn db_save_user(conn: &Connection, draft: &UserDraft) -> StorageResult<User> {
    let email = normalize_email(&draft.email);
    let now = now_secs();

    let write_err = |err: rusqlite::Error| {
        if is_unique_violation(&err) {
            StorageError::DuplicateEmail(email.clone())
        } else {
            StorageError::Sqlite(err)
        }
    };

    let id = match draft.id {
        None => {
            conn.execute(
                "INSERT INTO users (email, password_hash, name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![email, draft.password_hash, draft.name, now],
            )
            .map_err(write_err)?;
            conn.last_insert_rowid()
        }
        Some(id) => {
            let rows = conn
                .execute(
                    "UPDATE users SET email = ?1, password_hash = ?2, name = ?3, updated_at = ?4
                     WHERE id = ?5",
                    params![email, draft.password_hash, draft.name, now, id],
                )
                .map_err(write_err)?;
            if rows == 0 {
                return Err(StorageError::NotFound { entity: "user", id });
            }
            id
        }
    };

    db_find_user(conn, id)?.ok_or(StorageError::NotFound { entity: "user", id })
}

fn db_delete_user(conn: &Connection, id: UserId) -> StorageResult<bool> {
    let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

fn db_list_cards(conn: &Connection, set_id: FlashcardSetId) -> StorageResult<Vec<Flashcard>> {
    let mut stmt = conn.prepare(
        "SELECT id, flashcard_set_id, position, term, definition
         FROM flashcards
         WHERE flashcard_set_id = ?1
         ORDER BY position, id",
    )?;
    let cards = stmt
        .query_map(params![set_id], map_card_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cards)
}

fn with_cards(conn: &Connection, mut set: FlashcardSet) -> StorageResult<FlashcardSet> {
    set.cards = db_list_cards(conn, set.id)?;
    Ok(set)
}

fn db_find_set(conn: &Connection, id: FlashcardSetId) -> StorageResult<Option<FlashcardSet>> {
    let set = conn
        .query_row(
            &format!("SELECT {SET_COLUMNS} FROM flashcard_sets WHERE id = ?1"),
            params![id],
            map_set_row,
        )
        .optional()?;
    set.map(|set| with_cards(conn, set)).transpose()
}

fn db_query_sets(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StorageResult<Vec<FlashcardSet>> {
    let mut stmt = conn.prepare(sql)?;
    let sets = stmt
        .query_map(params, map_set_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    sets.into_iter().map(|set| with_cards(conn, set)).collect()
}

fn db_list_sets(conn: &Connection) -> StorageResult<Vec<FlashcardSet>> {
    db_query_sets(
        conn,
        &format!("SELECT {SET_COLUMNS} FROM flashcard_sets ORDER BY id"),
        [],
    )
}

fn db_list_sets_by_user(conn: &Connection, user_id: UserId) -> StorageResult<Vec<FlashcardSet>> {
    db_query_sets(
        conn,
        &format!(
            "SELECT {SET_COLUMNS} FROM flashcard_sets
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC"
        ),
        params![user_id],
    )
}

/// Callers must hold a transaction: the set row and its cards are written separately.
fn db_save_set(conn: &Connection, draft: &FlashcardSetDraft) -> StorageResult<FlashcardSet> {
    let now = now_secs();

    let id = match draft.id {
        None => {
            conn.execute(
                "INSERT INTO flashcard_sets (title, description, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![draft.title, draft.description, draft.user_id, now],
            )?;
            conn.last_insert_rowid()
        }
        Some(id) => {
            let rows = conn.execute(
                "UPDATE flashcard_sets
                 SET title = ?1, description = ?2, user_id = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![draft.title, draft.description, draft.user_id, now, id],
            )?;
            if rows == 0 {
                return Err(StorageError::NotFound {
                    entity: "flashcard set",
                    id,
                });
            }
            conn.execute(
                "DELETE FROM flashcards WHERE flashcard_set_id = ?1",
                params![id],
            )?;
            id
        }
    };

    let mut stmt = conn.prepare(
        "INSERT INTO flashcards (flashcard_set_id, position, term, definition)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, card) in draft.cards.iter().enumerate() {
        stmt.execute(params![id, position as i64, card.term, card.definition])?;
    }

    db_find_set(conn, id)?.ok_or(StorageError::NotFound {
        entity: "flashcard set",
        id,
    })
}

fn db_delete_set(conn: &Connection, id: FlashcardSetId) -> StorageResult<bool> {
    let rows = conn.execute("DELETE FROM flashcard_sets WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

impl UserRepository for SqliteTx {
    fn save_user(&self, draft: &UserDraft) -> StorageResult<User> {
        db_save_user(&self.conn, draft)
    }

    fn find_user(&self, id: UserId) -> StorageResult<Option<User>> {
        db_find_user(&self.conn, id)
    }

    fn list_users(&self) -> StorageResult<Vec<User>> {
        db_list_users(&self.conn)
    }

    fn delete_user(&self, id: UserId) -> StorageResult<bool> {
        db_delete_user(&self.conn, id)
    }

    fn count_users(&self) -> StorageResult<u64> {
        db_count(&self.conn, "users")
    }

    fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        db_find_by_email(&self.conn, email)
    }

    fn exists_by_email(&self, email: &str) -> StorageResult<bool> {
        db_exists_by_email(&self.conn, email)
    }
}

impl FlashcardSetRepository for SqliteTx {
    fn save_set(&self, draft: &FlashcardSetDraft) -> StorageResult<FlashcardSet> {
        db_save_set(&self.conn, draft)
    }

    fn find_set(&self, id: FlashcardSetId) -> StorageResult<Option<FlashcardSet>> {
        db_find_set(&self.conn, id)
    }

    fn list_sets(&self) -> StorageResult<Vec<FlashcardSet>> {
        db_list_sets(&self.conn)
    }

    fn list_sets_by_user(&self, user_id: UserId) -> StorageResult<Vec<FlashcardSet>> {
        db_list_sets_by_user(&self.conn, user_id)
    }

    fn list_cards(&self, set_id: FlashcardSetId) -> StorageResult<Vec<Flashcard>> {
        db_list_cards(&self.conn, set_id)
    }

    fn delete_set(&self, id: FlashcardSetId) -> StorageResult<bool> {
        db_delete_set(&self.conn, id)
    }

    fn count_sets(&self) -> StorageResult<u64> {
        db_count(&self.conn, "flashcard_sets")
    }
}

impl StorageTx for SqliteTx {
    fn commit(self) -> StorageResult<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }
}

impl Storage for SqliteStorage {
    type Tx = SqliteTx;

    fn begin_tx(&self) -> StorageResult<Self::Tx> {
        let conn = open_conn(&self.path)?;
        conn.execute("BEGIN IMMEDIATE", [])?;
        Ok(SqliteTx { conn })
    }
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    pub fn reset_all(&self) -> StorageResult<()> {
        if !Path::new(&self.path).exists() {
            return Ok(());
        }
        std::fs::remove_file(&self.path)?;
        for suffix in ["-wal", "-shm"] {
            let sidecar = format!("{}{}", self.path, suffix);
            if Path::new(&sidecar).exists() {
                std::fs::remove_file(&sidecar)?;
            }
        }
        Ok(())
    }

    pub fn init(&self) -> StorageResult<()> {
        self.with_conn(|_conn| Ok(()))
    }

    fn with_conn<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        let conn = open_conn(&self.path)?;
        Self::migrate(&conn)?;
        f(&conn)
    }

    fn in_tx<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let out = f(&tx)?;
            tx.commit()?;
            Ok(out)
        })
    }

    fn migrate(conn: &Connection) -> StorageResult<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        if version == 0 {
            log::info!(
                "SQLite schema migration: {} -> {}",
                version,
                DB_SCHEMA_VERSION
            );
            conn.execute_batch(
                r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                name TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE TABLE flashcard_sets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                user_id INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX flashcard_sets_user_idx ON flashcard_sets(user_id, created_at);
            CREATE TABLE flashcards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                flashcard_set_id INTEGER NOT NULL
                    REFERENCES flashcard_sets(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                term TEXT NOT NULL,
                definition TEXT NOT NULL
            );
            CREATE INDEX flashcards_set_idx ON flashcards(flashcard_set_id, position);
            "#,
            )?;
            conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
            return Ok(());
        }

        Err(StorageError::SchemaMismatch {
            found: version,
            expected: DB_SCHEMA_VERSION,
        })
    }
}

impl UserRepository for SqliteStorage {
    fn save_user(&self, draft: &UserDraft) -> StorageResult<User> {
        self.with_conn(|conn| db_save_user(conn, draft))
    }

    fn find_user(&self, id: UserId) -> StorageResult<Option<User>> {
        self.with_conn(|conn| db_find_user(conn, id))
    }

    fn list_users(&self) -> StorageResult<Vec<User>> {
        self.with_conn(db_list_users)
    }

    fn delete_user(&self, id: UserId) -> StorageResult<bool> {
        self.with_conn(|conn| db_delete_user(conn, id))
    }

    fn count_users(&self) -> StorageResult<u64> {
        self.with_conn(|conn| db_count(conn, "users"))
    }

    fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        self.with_conn(|conn| db_find_by_email(conn, email))
    }

    fn exists_by_email(&self, email: &str) -> StorageResult<bool> {
        self.with_conn(|conn| db_exists_by_email(conn, email))
    }
}

impl FlashcardSetRepository for SqliteStorage {
    fn save_set(&self, draft: &FlashcardSetDraft) -> StorageResult<FlashcardSet> {
        self.in_tx(|conn| db_save_set(conn, draft))
    }

    fn find_set(&self, id: FlashcardSetId) -> StorageResult<Option<FlashcardSet>> {
        self.with_conn(|conn| db_find_set(conn, id))
    }

    fn list_sets(&self) -> StorageResult<Vec<FlashcardSet>> {
        self.with_conn(db_list_sets)
    }

    fn list_sets_by_user(&self, user_id: UserId) -> StorageResult<Vec<FlashcardSet>> {
        self.with_conn(|conn| db_list_sets_by_user(conn, user_id))
    }

    fn list_cards(&self, set_id: FlashcardSetId) -> StorageResult<Vec<Flashcard>> {
        self.with_conn(|conn| db_list_cards(conn, set_id))
    }

    fn delete_set(&self, id: FlashcardSetId) -> StorageResult<bool> {
        self.in_tx(|conn| db_delete_set(conn, id))
    }

    fn count_sets(&self) -> StorageResult<u64> {
        self.with_conn(|conn| db_count(conn, "flashcard_sets"))
    }
}
