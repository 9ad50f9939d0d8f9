use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::{
    models::{
        AuthResponse, CardRequest, FlashcardSetRequest, FlashcardSetResponse, HealthResponse,
        LoginRequest, MessageResponse, RegisterRequest,
    },
    ApiError, ApiJson, ApiPath, AppState, AuthUser,
};
use crate::{
    auth,
    model::{
        clean_description, clean_name, validate_cards, validate_email, validate_password,
        validate_title,
    },
    storage::{
        traits::{FlashcardSetId, StorageTx, UserId},
        FlashcardSet, FlashcardSetDraft, FlashcardSetRepository, NewFlashcard, Storage, User,
        UserDraft,
    },
};

pub async fn root() -> &'static str {
    "Healzy API running!"
}

pub async fn health<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            uptime_secs,
        }),
    )
}

pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

fn auth_response<S: Storage>(state: &AppState<S>, user: User) -> Result<AuthResponse, ApiError> {
    let token = state.tokens.issue(user.id)?;
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

pub async fn register<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let password = req.password.unwrap_or_default();
    validate_password(&password)?;
    let email = validate_email(req.email.as_deref().unwrap_or_default())?;

    if state.storage.exists_by_email(&email)? {
        return Err(ApiError::EmailInUse);
    }

    let cost = state.bcrypt_cost;
    let password_hash =
        tokio::task::spawn_blocking(move || auth::hash_password(&password, cost)).await??;

    let name = clean_name(req.name);
    // A concurrent registration that slipped past the check above hits the unique constraint.
    let user = state
        .storage
        .save_user(&UserDraft::new(email, password_hash).with_name(name))?;
    log::info!("👤 Registered user {} ({})", user.id, user.email);

    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

pub async fn login<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = req.email.unwrap_or_default();
    let user = match state.storage.find_by_email(&email)? {
        Some(user) => user,
        None => return Err(ApiError::InvalidCredentials),
    };

    let password = req.password.unwrap_or_default();
    let hash = user.password_hash.clone();
    let matches =
        tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash)).await??;
    if !matches {
        return Err(ApiError::InvalidCredentials);
    }

    Ok(Json(auth_response(&state, user)?))
}

/// Loads a set only if `user_id` owns it; other owners' sets look missing.
fn owned_set<R: FlashcardSetRepository>(
    repo: &R,
    id: FlashcardSetId,
    user_id: UserId,
) -> Result<FlashcardSet, ApiError> {
    match repo.find_set(id)? {
        Some(set) if set.user_id == user_id => Ok(set),
        _ => Err(ApiError::SetNotFound),
    }
}

fn request_cards(cards: Option<Vec<CardRequest>>) -> Result<Vec<NewFlashcard>, ApiError> {
    let cards = cards.unwrap_or_default();
    Ok(validate_cards(cards.into_iter().map(|c| {
        (c.term.unwrap_or_default(), c.definition.unwrap_or_default())
    }))?)
}

pub async fn create_set<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user_id): AuthUser,
    ApiJson(req): ApiJson<FlashcardSetRequest>,
) -> Result<(StatusCode, Json<FlashcardSetResponse>), ApiError> {
    let title = validate_title(req.title.as_deref().unwrap_or_default())?;
    let draft = FlashcardSetDraft::new(title, user_id)
        .with_description(clean_description(req.description))
        .with_cards(request_cards(req.cards)?);

    let set = state.storage.save_set(&draft)?;
    log::info!(
        "🗂️ User {} created set {} with {} cards",
        user_id,
        set.id,
        set.cards.len()
    );
    Ok((StatusCode::CREATED, Json(set.into())))
}

pub async fn list_sets<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<FlashcardSetResponse>>, ApiError> {
    let sets = state.storage.list_sets_by_user(user_id)?;
    Ok(Json(sets.into_iter().map(FlashcardSetResponse::from).collect()))
}

pub async fn get_set<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<FlashcardSetId>,
) -> Result<Json<FlashcardSetResponse>, ApiError> {
    let set = owned_set(&state.storage, id, user_id)?;
    Ok(Json(set.into()))
}

fn apply_update<S: Storage>(
    storage: &S,
    id: FlashcardSetId,
    user_id: UserId,
    req: FlashcardSetRequest,
) -> Result<FlashcardSet, ApiError> {
    let tx = storage.begin_tx()?;
    let mut draft = FlashcardSetDraft::from(owned_set(&tx, id, user_id)?);

    if let Some(title) = req.title.as_deref() {
        draft.title = validate_title(title)?;
    }
    if req.description.is_some() {
        draft.description = clean_description(req.description);
    }
    if req.cards.is_some() {
        draft.cards = request_cards(req.cards)?;
    }

    let set = tx.save_set(&draft)?;
    tx.commit()?;
    Ok(set)
}

pub async fn update_set<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<FlashcardSetId>,
    ApiJson(req): ApiJson<FlashcardSetRequest>,
) -> Result<Json<FlashcardSetResponse>, ApiError> {
    let set = apply_update(&state.storage, id, user_id, req)?;
    log::info!("✏️ User {} updated set {}", user_id, set.id);
    Ok(Json(set.into()))
}

pub async fn delete_set<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<FlashcardSetId>,
) -> Result<Json<MessageResponse>, ApiError> {
    owned_set(&state.storage, id, user_id)?;
    if !state.storage.delete_set(id)? {
        return Err(ApiError::SetNotFound);
    }
    log::info!("🗑️ User {} deleted set {}", user_id, id);
    Ok(Json(MessageResponse {
        message: "Set deleted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{ttl_from_hours, TokenIssuer, DEFAULT_TOKEN_TTL_HOURS},
        rest::{
            models::{ErrorResponse, UserResponse},
            router,
        },
        storage::{SqliteStorage, UserRepository},
    };
    use axum::{
        body::Body,
        http::{header, Request},
        Router,
    };
    use http_body_util::BodyExt;
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestApp {
        _dir: TempDir,
        storage: SqliteStorage,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let storage = SqliteStorage::new(dir.path().join("healzy.sqlite"));
            storage.init().unwrap();
            let state = AppState::new(
                storage.clone(),
                TokenIssuer::new(b"test-secret", ttl_from_hours(DEFAULT_TOKEN_TTL_HOURS)),
                4,
            );
            Self {
                _dir: dir,
                storage,
                router: router(state),
            }
        }

        async fn send(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> axum::response::Response {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let body = match body {
                Some(value) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(value.to_string())
                }
                None => Body::empty(),
            };
            self.router
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap()
        }

        async fn send_raw(
            &self,
            uri: &str,
            content_type: Option<&str>,
            body: &str,
        ) -> axum::response::Response {
            let mut builder = Request::builder().method("POST").uri(uri);
            if let Some(content_type) = content_type {
                builder = builder.header(header::CONTENT_TYPE, content_type);
            }
            self.router
                .clone()
                .oneshot(builder.body(Body::from(body.to_string())).unwrap())
                .await
                .unwrap()
        }

        async fn register(&self, email: &str) -> AuthResponse {
            let response = self
                .send(
                    "POST",
                    "/register",
                    None,
                    Some(json!({ "email": email, "password": "pw123456", "name": "Test" })),
                )
                .await;
            assert_eq!(response.status(), StatusCode::CREATED);
            read_json(response).await
        }

        async fn create_set(&self, token: &str, title: &str) -> FlashcardSetResponse {
            let response = self
                .send(
                    "POST",
                    "/flashcard-sets",
                    Some(token),
                    Some(json!({
                        "title": title,
                        "description": "Basics",
                        "cards": [
                            { "term": "Femur", "definition": "Thigh bone" },
                            { "term": "Ulna", "definition": "Forearm bone" }
                        ]
                    })),
                )
                .await;
            assert_eq!(response.status(), StatusCode::CREATED);
            read_json(response).await
        }
    }

    async fn read_json<T: DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn read_error(response: axum::response::Response) -> String {
        read_json::<ErrorResponse>(response).await.error
    }

    #[tokio::test]
    async fn root_reports_running() {
        let app = TestApp::new();
        let response = app.send("GET", "/", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Healzy API running!");
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = TestApp::new();
        let response = app.send("GET", "/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload: HealthResponse = read_json(response).await;
        assert_eq!(payload.status, "ok");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = TestApp::new();
        let response = app.send("GET", "/nope", None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(read_error(response).await, "Not found");
    }

    #[tokio::test]
    async fn register_issues_token_and_stores_hashed_password() {
        let app = TestApp::new();
        let auth = app.register(" Ana@Healzy.App").await;

        let UserResponse { id, email, name } = auth.user;
        assert_eq!(email, "ana@healzy.app");
        assert_eq!(name.as_deref(), Some("Test"));

        let stored = app.storage.find_by_email("ana@healzy.app").unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_ne!(stored.password_hash, "pw123456");

        let claims = TokenIssuer::new(b"test-secret", ttl_from_hours(DEFAULT_TOKEN_TTL_HOURS))
            .verify(&auth.token)
            .unwrap();
        assert_eq!(claims.user_id, id);
    }

    #[tokio::test]
    async fn register_requires_email_and_password() {
        let app = TestApp::new();
        let response = app
            .send("POST", "/register", None, Some(json!({ "email": "a@b.c" })))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_error(response).await, "Email and password required");
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let app = TestApp::new();
        app.register("ana@healzy.app").await;

        let response = app
            .send(
                "POST",
                "/register",
                None,
                Some(json!({ "email": "ANA@healzy.app", "password": "other" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_error(response).await, "Email already in use");
        assert_eq!(app.storage.count_users().unwrap(), 1);
    }

    #[tokio::test]
    async fn login_checks_password() {
        let app = TestApp::new();
        let registered = app.register("ana@healzy.app").await;

        let ok = app
            .send(
                "POST",
                "/login",
                None,
                Some(json!({ "email": "ana@healzy.app", "password": "pw123456" })),
            )
            .await;
        assert_eq!(ok.status(), StatusCode::OK);
        let auth: AuthResponse = read_json(ok).await;
        assert_eq!(auth.user.id, registered.user.id);

        let wrong = app
            .send(
                "POST",
                "/login",
                None,
                Some(json!({ "email": "ana@healzy.app", "password": "nope" })),
            )
            .await;
        assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_error(wrong).await, "Invalid credentials");

        let unknown = app
            .send(
                "POST",
                "/login",
                None,
                Some(json!({ "email": "bob@healzy.app", "password": "pw123456" })),
            )
            .await;
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn flashcard_sets_require_token() {
        let app = TestApp::new();

        let missing = app.send("GET", "/flashcard-sets", None, None).await;
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_error(missing).await, "No token");

        let invalid = app
            .send("GET", "/flashcard-sets", Some("garbage"), None)
            .await;
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_error(invalid).await, "Invalid token");
    }

    #[tokio::test]
    async fn create_get_and_list_sets() {
        let app = TestApp::new();
        let auth = app.register("ana@healzy.app").await;

        let first = app.create_set(&auth.token, "Bones").await;
        assert_eq!(first.user_id, auth.user.id);
        assert_eq!(first.description.as_deref(), Some("Basics"));
        let terms: Vec<_> = first.cards.iter().map(|c| c.term.as_str()).collect();
        assert_eq!(terms, vec!["Femur", "Ulna"]);

        let second = app.create_set(&auth.token, "Muscles").await;

        let response = app
            .send(
                "GET",
                &format!("/flashcard-sets/{}", first.id),
                Some(&auth.token),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let fetched: FlashcardSetResponse = read_json(response).await;
        assert_eq!(fetched.title, "Bones");
        assert_eq!(fetched.cards.len(), 2);

        let response = app
            .send("GET", "/flashcard-sets", Some(&auth.token), None)
            .await;
        let listed: Vec<FlashcardSetResponse> = read_json(response).await;
        let ids: Vec<_> = listed.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn create_set_requires_title() {
        let app = TestApp::new();
        let auth = app.register("ana@healzy.app").await;

        let response = app
            .send(
                "POST",
                "/flashcard-sets",
                Some(&auth.token),
                Some(json!({ "description": "no title" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_error(response).await, "title is required");
        assert_eq!(app.storage.count_sets().unwrap(), 0);
    }

    #[tokio::test]
    async fn other_users_sets_are_hidden() {
        let app = TestApp::new();
        let ana = app.register("ana@healzy.app").await;
        let bob = app.register("bob@healzy.app").await;
        let set = app.create_set(&ana.token, "Bones").await;
        let uri = format!("/flashcard-sets/{}", set.id);

        let response = app.send("GET", &uri, Some(&bob.token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(read_error(response).await, "Set not found");

        let response = app
            .send("PUT", &uri, Some(&bob.token), Some(json!({ "title": "Mine" })))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.send("DELETE", &uri, Some(&bob.token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.send("GET", "/flashcard-sets", Some(&bob.token), None).await;
        let listed: Vec<FlashcardSetResponse> = read_json(response).await;
        assert!(listed.is_empty());

        assert_eq!(app.storage.find_set(set.id).unwrap().unwrap().title, "Bones");
    }

    #[tokio::test]
    async fn update_replaces_only_given_fields() {
        let app = TestApp::new();
        let auth = app.register("ana@healzy.app").await;
        let set = app.create_set(&auth.token, "Bones").await;
        let uri = format!("/flashcard-sets/{}", set.id);

        let response = app
            .send("PUT", &uri, Some(&auth.token), Some(json!({ "title": "Skeleton" })))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated: FlashcardSetResponse = read_json(response).await;
        assert_eq!(updated.title, "Skeleton");
        assert_eq!(updated.description.as_deref(), Some("Basics"));
        assert_eq!(updated.cards.len(), 2);

        let response = app
            .send(
                "PUT",
                &uri,
                Some(&auth.token),
                Some(json!({ "cards": [{ "term": "Skull", "definition": "Cranium" }] })),
            )
            .await;
        let updated: FlashcardSetResponse = read_json(response).await;
        assert_eq!(updated.title, "Skeleton");
        assert_eq!(updated.cards.len(), 1);
        assert_eq!(updated.cards[0].term, "Skull");
    }

    #[tokio::test]
    async fn invalid_update_leaves_set_untouched() {
        let app = TestApp::new();
        let auth = app.register("ana@healzy.app").await;
        let set = app.create_set(&auth.token, "Bones").await;
        let uri = format!("/flashcard-sets/{}", set.id);

        let response = app
            .send(
                "PUT",
                &uri,
                Some(&auth.token),
                Some(json!({ "title": "New", "cards": [{ "term": "Skull" }] })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let stored = app.storage.find_set(set.id).unwrap().unwrap();
        assert_eq!(stored.title, "Bones");
        assert_eq!(stored.cards.len(), 2);
    }

    #[tokio::test]
    async fn delete_removes_set_and_cards() {
        let app = TestApp::new();
        let auth = app.register("ana@healzy.app").await;
        let set = app.create_set(&auth.token, "Bones").await;
        let uri = format!("/flashcard-sets/{}", set.id);

        let response = app.send("DELETE", &uri, Some(&auth.token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload: MessageResponse = read_json(response).await;
        assert_eq!(payload.message, "Set deleted");

        assert!(app.storage.find_set(set.id).unwrap().is_none());
        assert!(app.storage.list_cards(set.id).unwrap().is_empty());

        let again = app.send("DELETE", &uri, Some(&auth.token), None).await;
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn null_credentials_count_as_missing() {
        let app = TestApp::new();
        let response = app
            .send(
                "POST",
                "/register",
                None,
                Some(json!({ "email": null, "password": "pw" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_error(response).await, "Email and password required");

        let response = app
            .send(
                "POST",
                "/login",
                None,
                Some(json!({ "email": "ana@healzy.app", "password": null })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_error(response).await, "Invalid credentials");
    }

    #[tokio::test]
    async fn unreadable_bodies_get_json_errors() {
        let app = TestApp::new();

        let response = app
            .send_raw("/register", None, r#"{"email":"a@b.c","password":"pw"}"#)
            .await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(read_error(response).await.contains("Content-Type"));

        let response = app
            .send_raw("/register", Some("application/json"), "{not json")
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!read_error(response).await.is_empty());

        let auth = app.register("ana@healzy.app").await;
        let response = app
            .send(
                "POST",
                "/flashcard-sets",
                Some(&auth.token),
                Some(json!({ "title": 5 })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!read_error(response).await.is_empty());
        assert_eq!(app.storage.count_sets().unwrap(), 0);
    }

    #[tokio::test]
    async fn null_card_definition_is_incomplete() {
        let app = TestApp::new();
        let auth = app.register("ana@healzy.app").await;

        let response = app
            .send(
                "POST",
                "/flashcard-sets",
                Some(&auth.token),
                Some(json!({
                    "title": "Bones",
                    "cards": [{ "term": "Femur", "definition": null }]
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            read_error(response).await,
            "card 0 needs both a term and a definition"
        );
        assert_eq!(app.storage.count_sets().unwrap(), 0);
    }

    #[tokio::test]
    async fn non_numeric_set_id_is_bad_request() {
        let app = TestApp::new();
        let auth = app.register("ana@healzy.app").await;

        for method in ["GET", "DELETE"] {
            let response = app
                .send(method, "/flashcard-sets/abc", Some(&auth.token), None)
                .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert!(read_error(response).await.contains("abc"));
        }
    }
}
