//! Identity boundary.
//!
//! The engine never manages credentials itself; it asks a [`TokenProvider`]
//! for a fresh bearer token before every backend call. Tokens are never
//! cached — identity providers rotate them, and a stale token is an `Auth`
//! failure the engine cannot recover from on its own.

use async_trait::async_trait;

use crate::errors::EngineError;

/// Source of the current user's identity and bearer credential.
///
/// Carried as `Arc<dyn TokenProvider>` by the HTTP client. Implementations
/// wrap whatever identity provider the embedding application uses.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The signed-in user's id, or `None` when nobody is signed in.
    fn current_user_id(&self) -> Option<String>;

    /// A freshly issued bearer token for the current user.
    /// Fails with [`EngineError::Auth`] when no user is signed in.
    async fn fresh_token(&self) -> Result<String, EngineError>;
}

/// Fixed-credential provider for tests and local development.
pub struct StaticTokenProvider {
    user_id: String,
    token: String,
}

impl StaticTokenProvider {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    fn current_user_id(&self) -> Option<String> {
        Some(self.user_id.clone())
    }

    async fn fresh_token(&self) -> Result<String, EngineError> {
        Ok(self.token.clone())
    }
}
