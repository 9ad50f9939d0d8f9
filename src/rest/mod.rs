use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{auth::TokenIssuer, storage::Storage};

mod error;
mod extract;
mod handlers;
mod models;

pub use error::ApiError;
pub use extract::{ApiJson, ApiPath, AuthUser};

use handlers::{
    create_set, delete_set, get_set, health, list_sets, login, not_found, register, root,
    update_set,
};

#[derive(Clone)]
pub struct AppState<S: Storage> {
    pub storage: S,
    pub tokens: TokenIssuer,
    pub bcrypt_cost: u32,
    pub started_at: std::time::SystemTime,
}

impl<S: Storage> AppState<S> {
    pub fn new(storage: S, tokens: TokenIssuer, bcrypt_cost: u32) -> Self {
        Self {
            storage,
            tokens,
            bcrypt_cost,
            started_at: std::time::SystemTime::now(),
        }
    }
}

pub fn router<S: Storage + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health::<S>))
        .route("/register", post(register::<S>))
        .route("/login", post(login::<S>))
        .route(
            "/flashcard-sets",
            get(list_sets::<S>).post(create_set::<S>),
        )
        .route(
            "/flashcard-sets/:id",
            get(get_set::<S>).put(update_set::<S>).delete(delete_set::<S>),
        )
        .fallback(not_found)
        .with_state(state)
}

pub async fn serve<S: Storage + Clone + Send + Sync + 'static>(
    addr: SocketAddr,
    state: AppState<S>,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("🌐 REST listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
