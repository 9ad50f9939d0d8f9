use anyhow::{Context, Result};

use crate::{auth::TokenIssuer, context, rest, storage};

pub fn init_data_dir(ctx: &context::Context) -> Result<()> {
    std::fs::create_dir_all(&ctx.data_dir)?;
    Ok(())
}

pub fn init_storage(ctx: &context::Context) -> Result<storage::SqliteStorage> {
    let sqlite = storage::SqliteStorage::new(ctx.db_path());
    if ctx.reset {
        log::warn!("🧹 Resetting database {}", ctx.db_path().display());
        sqlite.reset_all().context("resetting storage")?;
    }
    sqlite.init().context("initializing storage")?;
    Ok(sqlite)
}

pub fn build_state(
    ctx: &context::Context,
    storage: storage::SqliteStorage,
) -> rest::AppState<storage::SqliteStorage> {
    let tokens = TokenIssuer::from_config(ctx.jwt_secret.as_deref(), ctx.token_ttl);
    rest::AppState::new(storage, tokens, ctx.bcrypt_cost)
}
