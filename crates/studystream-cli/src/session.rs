//! Session context.
//!
//! Signed-in users are held in one app-owned registry instead of a
//! global current-user singleton. The registry caches token -> user
//! and is refreshed by profile-change events from the identity
//! provider; the refresh task lives and dies with the server.

use super::*;

use tokio::sync::broadcast;

use studyfeed::{ProfileEvent, SessionToken, StoreError, User};

/// Registry of live sessions.
#[derive(Clone)]
pub struct Sessions {
    inner: Arc<RwLock<HashMap<SessionToken, User>>>,
}

impl Sessions {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Resolve a token to its user.
    /// Falls back to the identity provider on a registry miss.
    pub async fn resolve(
        &self,
        token: &SessionToken,
        identity: &dyn studyfeed::IdentityProvider,
    ) -> Result<Option<User>, StoreError> {
        if let Some(user) = self.inner.read().await.get(token) {
            return Ok(Some(user.clone()));
        }
        match identity.user_for_token(token).await? {
            Some(user) => {
                self.inner
                    .write()
                    .await
                    .insert(token.clone(), user.clone());
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Record a fresh sign-in.
    pub async fn insert(&self, token: SessionToken, user: User) {
        self.inner.write().await.insert(token, user);
    }

    /// Drop one session.
    pub async fn remove(&self, token: &SessionToken) {
        self.inner.write().await.remove(token);
    }

    /// Number of live sessions in the registry.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Apply a profile-change event to every affected session.
    pub async fn handle_event(&self, event: ProfileEvent) {
        match event {
            ProfileEvent::Updated(user) => {
                let mut inner = self.inner.write().await;
                for session_user in inner.values_mut() {
                    if session_user.id == user.id {
                        *session_user = user.clone();
                    }
                }
            }
            ProfileEvent::SignedOut(user_id) => {
                let mut inner = self.inner.write().await;
                inner.retain(|_, session_user| session_user.id != user_id);
            }
        }
    }
}

/// Keep the session registry fresh until cancelled.
pub async fn refresh_sessions(
    sessions: Sessions,
    mut events: broadcast::Receiver<ProfileEvent>,
    cancel_token: CancellationToken,
) -> Result<()> {
    'refresh: loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => sessions.handle_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // Dropped events only mean some cached profiles
                        // go stale until their next update.
                        tracing::warn!("Session refresh lagged; missed {} events.", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break 'refresh,
                }
            },
            _ = cancel_token.cancelled() => break 'refresh,
        }
    }

    Ok(())
}
