use thiserror::Error;

/// Engine-level error taxonomy.
///
/// Every remote failure surfaced by [`crate::client::DocumentBackend`] maps
/// onto one of these variants; the engine never retries on its own, so a
/// variant also tells the caller whether a user-initiated repeat makes sense.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No authenticated user, or the credential was rejected.
    #[error("not signed in")]
    Auth,

    /// A required local input is missing or blank. No network call was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// Network unreachable or an opaque server failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The referenced document no longer exists.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend understood the request but the source failed to compile.
    /// Carries the backend's message verbatim.
    #[error("compilation failed: {0}")]
    Compilation(String),

    /// The backend rejected or could not apply a refinement/tailoring
    /// instruction. Carries the backend's message verbatim.
    #[error("refinement rejected: {0}")]
    Refinement(String),

    /// Another operation on the same session is still in flight.
    #[error("operation already in flight: {0}")]
    Busy(&'static str),
}

impl EngineError {
    /// Whether a user-initiated repeat of the same action is sensible.
    /// Advisory only — the engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
