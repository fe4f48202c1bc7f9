//! Backend seams.
//!
//! All persistence, authentication, and file storage sit behind these
//! traits. The application wires in concrete implementations; the
//! domain code only ever sees the traits.

use super::*;

/// Errors surfaced by backend implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Credentials were wrong, or the session is unknown.
    #[error("unauthorized")]
    Unauthorized,
    /// Sign-up with an email that already has an account.
    #[error("an account with this email already exists")]
    AccountExists,
    /// The requested record does not exist.
    #[error("not found")]
    NotFound,
    /// The record was rejected before storage.
    #[error("invalid record: {0}")]
    Invalid(String),
    /// Anything the backend itself failed at.
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Opaque session token handed out at sign-in.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A signed-up user, as the identity provider sees them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier from the identity provider.
    pub id: String,
    /// Display name shown on posts.
    pub display_name: String,
    /// Sign-in email.
    pub email: String,
    /// Avatar url.
    pub avatar: String,
}

/// Fields a user may change on their profile.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New display name, if changing.
    pub display_name: Option<String>,
    /// New avatar url, if changing.
    pub avatar: Option<String>,
}

/// Event emitted by the identity provider when a profile changes.
/// Session holders subscribe to keep their view of the user fresh.
#[derive(Clone, Debug)]
pub enum ProfileEvent {
    /// A user's profile fields changed.
    Updated(User),
    /// A user signed out everywhere; their sessions are gone.
    SignedOut(String),
}

/// Identity provider: sign-up, sign-in, sign-out, current-user
/// observation, and profile updates.
#[backend_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Create an account and return the new user.
    async fn sign_up(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> Result<User, StoreError>;

    /// Check credentials and mint a session token.
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, SessionToken), StoreError>;

    /// Invalidate a session token.
    async fn sign_out(&self, token: &SessionToken) -> Result<(), StoreError>;

    /// Resolve a session token to its user, if the session is live.
    async fn user_for_token(
        &self,
        token: &SessionToken,
    ) -> Result<Option<User>, StoreError>;

    /// Update profile fields and return the refreshed user.
    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<User, StoreError>;

    /// Subscribe to profile changes.
    /// Used by session holders to refresh their copy of a user.
    fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ProfileEvent>;
}

/// Document store for posts.
/// The store owns ordering: reads come back newest-first.
#[backend_trait]
pub trait PostStore: Send + Sync + 'static {
    /// Persist a post.
    async fn create_post(&self, post: &Post) -> Result<(), StoreError>;

    /// Fetch the most recent posts, newest-first.
    async fn recent_posts(&self, limit: usize) -> Result<PostSet, StoreError>;

    /// Fetch one user's posts, newest-first.
    async fn posts_by_author(
        &self,
        author_id: &str,
        limit: usize,
    ) -> Result<PostSet, StoreError>;

    /// Fetch one post by id.
    async fn post(&self, id: &PostId) -> Result<Option<Post>, StoreError>;
}

/// Object store for uploaded files.
#[backend_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Store a blob and return its public url.
    async fn store(
        &self,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StoreError>;

    /// Read a stored blob back by its stored name.
    async fn read(&self, name: &str) -> Result<Vec<u8>, StoreError>;
}
