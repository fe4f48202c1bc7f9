//! Serve mode.

use super::*;

use axum::Json;
use axum::extract::{Path, Query, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;

use studyfeed::{
    BlobStore, DateTime, IdentityProvider, PostBuilder, PostId, PostStore,
    SessionToken, StoreError, User,
};

mod cache;
mod config;

use cache::*;
pub use config::*;

/// Serve the studystream API over http.
pub async fn serve_cli(
    port: Option<u16>,
    config: Arc<Config>,
    backend: Backend,
    sessions: Sessions,
    cancel_token: CancellationToken,
) -> Result<()> {
    // Create the feed cache, when configured.
    let cache = config.serve.cache.map(|duration| {
        Arc::new(Mutex::new(Cache::new(studyfeed::Duration::from_std(
            duration,
        ))))
    });

    // Create server.
    let app = axum::Router::new()
        .route("/auth/signup", axum::routing::post(post_signup))
        .route("/auth/login", axum::routing::post(post_login))
        .route("/auth/logout", axum::routing::post(post_logout))
        .route("/me", axum::routing::get(get_me).put(put_me))
        .route("/me/posts", axum::routing::get(get_my_posts))
        .route("/feed", axum::routing::get(get_feed))
        .route("/posts", axum::routing::post(post_posts))
        .route("/posts/{id}", axum::routing::get(get_post))
        .route("/files", axum::routing::post(post_files))
        .route("/files/{name}", axum::routing::get(get_file))
        .with_state(Arc::new(ServeState {
            config: config.clone(),
            database: backend.database,
            blobs: backend.blobs,
            sessions,
            cache,
        }));
    let port = port.unwrap_or(config.serve.port.unwrap_or(DEFAULT_PORT));
    let listener =
        match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await
        {
            Ok(listener) => listener,
            Err(e) => bail!("Unable to bind to port {}: {}", port, e),
        };

    // Serve.
    tracing::info!("studystream serve");
    tracing::info!("Serving api @ 0.0.0.0:{}", port);

    let served = axum::serve(listener, app);
    let cancelled = cancel_token.cancelled();
    tokio::select! {
        served_res = served => {
            if let Err(e) = served_res {
                tracing::error!("Error serving: {}", e);
                cancel_token.cancel();
            }
        },
        _ = cancelled => {
            // Quit.
        },
    };

    Ok(())
}

struct ServeState {
    config: Arc<Config>,
    database: Arc<Database>,
    blobs: Arc<FsBlobs>,
    sessions: Sessions,
    cache: Option<Arc<Mutex<Cache>>>,
}
type StateType = axum::extract::State<Arc<ServeState>>;

/// Error surfaced to the client.
/// The message stays generic; detail lives in the log.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "unauthorized".into(),
        }
    }

    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "not found".into(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "something went wrong".into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unauthorized => ApiError::unauthorized(),
            StoreError::AccountExists => Self {
                status: StatusCode::CONFLICT,
                message: value.to_string(),
            },
            StoreError::NotFound => ApiError::not_found(),
            StoreError::Invalid(message) => ApiError::bad_request(message),
            // Already logged at the backend.
            StoreError::Backend(_) => ApiError::internal(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// Pull the session token out of the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    if token.is_empty() {
        return None;
    }
    Some(SessionToken::new(token))
}

/// Resolve the calling user or reject the request.
async fn require_user(
    state: &ServeState,
    headers: &HeaderMap,
) -> Result<User, ApiError> {
    let token = match bearer_token(headers) {
        Some(token) => token,
        None => return Err(ApiError::unauthorized()),
    };
    match state
        .sessions
        .resolve(&token, &*state.database)
        .await?
    {
        Some(user) => Ok(user),
        None => Err(ApiError::unauthorized()),
    }
}

#[derive(Deserialize)]
struct SignupRequest {
    email: String,
    display_name: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct SessionResponse {
    token: String,
    user: User,
}

async fn post_signup(
    State(state): StateType,
    Json(request): Json<SignupRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    tracing::debug!("/auth/signup");
    state
        .database
        .sign_up(&request.email, &request.display_name, &request.password)
        .await?;
    let (user, token) = state
        .database
        .sign_in(&request.email, &request.password)
        .await?;
    state.sessions.insert(token.clone(), user.clone()).await;
    Ok(Json(SessionResponse {
        token: token.to_string(),
        user,
    }))
}

async fn post_login(
    State(state): StateType,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    tracing::debug!("/auth/login");
    let (user, token) = state
        .database
        .sign_in(&request.email, &request.password)
        .await?;
    state.sessions.insert(token.clone(), user.clone()).await;
    Ok(Json(SessionResponse {
        token: token.to_string(),
        user,
    }))
}

async fn post_logout(
    State(state): StateType,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    tracing::debug!("/auth/logout");
    let token = match bearer_token(&headers) {
        Some(token) => token,
        None => return Err(ApiError::unauthorized()),
    };
    state.database.sign_out(&token).await?;
    state.sessions.remove(&token).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_me(
    State(state): StateType,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(user))
}

async fn put_me(
    State(state): StateType,
    headers: HeaderMap,
    Json(update): Json<studyfeed::ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
    let user = require_user(&state, &headers).await?;
    let updated = state.database.update_profile(&user.id, &update).await?;
    Ok(Json(updated))
}

/// The caller's own posts, newest-first. Backs the profile page.
async fn get_my_posts(
    State(state): StateType,
    headers: HeaderMap,
) -> Result<Json<Vec<studyfeed::Post>>, ApiError> {
    tracing::debug!("/me/posts");
    let user = require_user(&state, &headers).await?;
    let set = state
        .database
        .posts_by_author(&user.id, state.config.feed_limit())
        .await?;
    Ok(Json(set.as_slice().to_vec()))
}

#[derive(Deserialize)]
struct FeedQuery {
    subject: Option<String>,
    kind: Option<String>,
    q: Option<String>,
}

impl FeedQuery {
    /// Turn query params into filter criteria.
    /// Missing params and the literal "all" mean no constraint; the
    /// free-text query is passed through untrimmed.
    fn criteria(&self) -> Result<studyfeed::FilterCriteria, ApiError> {
        let subject = match self.subject.as_deref() {
            None | Some("all") => None,
            Some(subject) => match studyfeed::Subject::try_from(subject) {
                Ok(subject) => Some(subject),
                Err(_) => {
                    return Err(ApiError::bad_request("unknown subject"));
                }
            },
        };
        let kind = match self.kind.as_deref() {
            None | Some("all") => None,
            Some(kind) => match studyfeed::PostKind::try_from(kind) {
                Ok(kind) => Some(kind),
                Err(_) => return Err(ApiError::bad_request("unknown kind")),
            },
        };
        Ok(studyfeed::FilterCriteria {
            subject,
            kind,
            query: self.q.clone().unwrap_or_default(),
        })
    }
}

async fn get_feed(
    State(state): StateType,
    Query(query): Query<FeedQuery>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    tracing::debug!("/feed");
    require_user(&state, &headers).await?;
    let criteria = query.criteria()?;

    let database = state.database.clone();
    let limit = state.config.feed_limit();
    let produce = async move {
        let set = database.recent_posts(limit).await?;
        let posts: Vec<&studyfeed::Post> = set.filtered(&criteria).collect();
        match serde_json::to_string(&posts) {
            Ok(body) => Ok(body),
            Err(e) => {
                tracing::error!("Failed to serialize feed: {}", e);
                Err(ApiError::internal())
            }
        }
    };

    let body = match &state.cache {
        Some(cache) => {
            let uri =
                format!("/feed?{}", raw_query.unwrap_or_default());
            let mut cache = cache.lock().await;
            cache.get(uri, produce).await?
        }
        None => produce.await?,
    };

    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

#[derive(Deserialize)]
struct CreatePostRequest {
    title: String,
    #[serde(default)]
    description: String,
    subject: studyfeed::Subject,
    kind: studyfeed::PostKind,
    due: Option<String>,
    #[serde(default)]
    attachments: Vec<studyfeed::Attachment>,
}

async fn post_posts(
    State(state): StateType,
    headers: HeaderMap,
    Json(request): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::debug!("/posts");
    let user = require_user(&state, &headers).await?;
    if request.title.is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }

    let mut builder = PostBuilder::new();
    builder
        .id(uuid::Uuid::new_v4().to_string())
        .title(request.title)
        .description(request.description)
        .author(user.display_name)
        .author_id(user.id)
        .avatar(user.avatar)
        .subject(request.subject)
        .kind(request.kind)
        .created(DateTime::now());
    if let Some(due) = &request.due {
        match DateTime::try_from(due) {
            Ok(due) => {
                builder.due(due);
            }
            Err(_) => return Err(ApiError::bad_request("invalid due date")),
        }
    }
    for attachment in request.attachments {
        builder.attachment(attachment);
    }

    let post = builder.build();
    state.database.create_post(&post).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    State(state): StateType,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<studyfeed::Post>, ApiError> {
    tracing::debug!("/posts/{}", id);
    require_user(&state, &headers).await?;
    match state.database.post(&PostId::new(id)).await? {
        Some(post) => Ok(Json(post)),
        None => Err(ApiError::not_found()),
    }
}

#[derive(Deserialize)]
struct UploadQuery {
    name: String,
}

#[derive(Serialize)]
struct UploadResponse {
    url: String,
}

async fn post_files(
    State(state): StateType,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, ApiError> {
    tracing::debug!("/files");
    require_user(&state, &headers).await?;
    let url = state.blobs.store(&query.name, body.to_vec()).await?;
    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

async fn get_file(
    State(state): StateType,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::debug!("/files/{}", name);
    let bytes = state.blobs.read(&name).await?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    ))
}
