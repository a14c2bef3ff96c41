//! Refinement session — the per-document state machine.
//!
//! Owns ordering and consistency for one open document: load, compile,
//! refine, close. The state lives behind a mutex that is never held across
//! an await; the session handle is cheaply cloneable so a UI can observe
//! state while an operation is in flight.
//!
//! # Invariants
//! - At most one `refine` is in flight per session (re-entrancy guard, not
//!   locking).
//! - Rebinding to another document makes any in-flight result stale: a
//!   generation counter is checked after every suspension point, and stale
//!   results are discarded without installing their artifact bytes.
//! - A failed refinement never blanks the preview and never discards the
//!   user's instruction text.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::artifact::{ArtifactCache, ArtifactHandle, HandleAllocator};
use crate::client::DocumentBackend;
use crate::errors::EngineError;
use crate::models::{Document, DocumentId};

/// Observable session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No document bound.
    Idle,
    /// `open` is fetching and compiling the bound document.
    Loading,
    /// Document bound with a live preview; accepts `refine` and `close`.
    Ready,
    /// A refinement is in flight.
    Refining,
    /// `open` failed; terminal for that attempt, a fresh `open` is required.
    LoadFailed,
    /// Torn down; accepts a fresh `open`.
    Closed,
}

struct SessionInner {
    state: SessionState,
    bound: Option<DocumentId>,
    document: Option<Document>,
    cache: ArtifactCache<Arc<dyn HandleAllocator>>,
    /// Instruction text retained after a failed refinement so the user can
    /// edit and re-issue it.
    pending_instruction: Option<String>,
    last_error: Option<EngineError>,
    /// Bumped on every bind and teardown; results carrying an older value
    /// are stale.
    generation: u64,
}

impl SessionInner {
    /// Tears down the current binding and binds `id`. Prior artifact
    /// released, pending text discarded, in-flight results invalidated.
    fn rebind(&mut self, id: DocumentId) {
        self.cache.clear();
        self.document = None;
        self.pending_instruction = None;
        self.last_error = None;
        self.bound = Some(id);
        self.state = SessionState::Loading;
        self.generation += 1;
    }
}

/// The live binding between one open document and its compiled preview.
#[derive(Clone)]
pub struct RefinementSession {
    backend: Arc<dyn DocumentBackend>,
    inner: Arc<Mutex<SessionInner>>,
}

impl RefinementSession {
    pub fn new(backend: Arc<dyn DocumentBackend>, allocator: Arc<dyn HandleAllocator>) -> Self {
        Self {
            backend,
            inner: Arc::new(Mutex::new(SessionInner {
                state: SessionState::Idle,
                bound: None,
                document: None,
                cache: ArtifactCache::new(allocator),
                pending_instruction: None,
                last_error: None,
                generation: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().expect("session state lock poisoned")
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn bound_id(&self) -> Option<DocumentId> {
        self.lock().bound.clone()
    }

    pub fn document(&self) -> Option<Document> {
        self.lock().document.clone()
    }

    /// The current preview handle. Consumers only ever read it here; the
    /// session retains exclusive ownership.
    pub fn artifact(&self) -> Option<ArtifactHandle> {
        self.lock().cache.current()
    }

    pub fn artifact_bytes(&self) -> Option<bytes::Bytes> {
        self.lock().cache.bytes()
    }

    pub fn pending_instruction(&self) -> Option<String> {
        self.lock().pending_instruction.clone()
    }

    pub fn last_error(&self) -> Option<EngineError> {
        self.lock().last_error.clone()
    }

    /// Binds `id` and loads it: fetch the record, compile the preview,
    /// install the artifact. Rebinding while an earlier operation is in
    /// flight is allowed — the earlier result becomes stale and is
    /// discarded when it resolves.
    pub async fn open(&self, id: DocumentId) -> Result<(), EngineError> {
        let generation = {
            let mut inner = self.lock();
            inner.rebind(id.clone());
            inner.generation
        };
        info!(document = %id, "opening session");

        let document = match self.backend.fetch_document(&id).await {
            Ok(document) => document,
            Err(err) => return self.fail_load(generation, err),
        };
        let preview = match self.backend.compile_preview(&id).await {
            Ok(bytes) => bytes,
            Err(err) => return self.fail_load(generation, err),
        };

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(document = %id, "discarding stale load result");
            return Ok(());
        }
        inner.cache.set(preview);
        inner.document = Some(document);
        inner.state = SessionState::Ready;
        Ok(())
    }

    /// Asks the backend to apply `instruction` to the bound document, then
    /// recompiles and swaps in the fresh preview.
    ///
    /// Rejected without any network call when the instruction is blank, no
    /// document is bound, or another operation is in flight. On failure the
    /// prior preview stays live and the instruction is retained in
    /// [`Self::pending_instruction`].
    pub async fn refine(&self, instruction: &str) -> Result<(), EngineError> {
        let trimmed = instruction.trim();
        if trimmed.is_empty() {
            return Err(EngineError::Validation(
                "instruction must not be empty".to_string(),
            ));
        }

        let (generation, id, job_description) = {
            let mut inner = self.lock();
            if matches!(inner.state, SessionState::Loading | SessionState::Refining) {
                return Err(EngineError::Busy("refine"));
            }
            let Some(document) = inner.document.as_ref() else {
                return Err(EngineError::Validation(
                    "no document bound to this session".to_string(),
                ));
            };
            let id = document.id.clone();
            let job_description = document.job_description.clone().unwrap_or_default();
            inner.state = SessionState::Refining;
            inner.last_error = None;
            (inner.generation, id, job_description)
        };
        info!(document = %id, "submitting refinement");

        if let Err(err) = self
            .backend
            .submit_refinement(&id, trimmed, &job_description)
            .await
        {
            return self.fail_refine(generation, trimmed, err);
        }
        let preview = match self.backend.compile_preview(&id).await {
            Ok(bytes) => bytes,
            Err(err) => return self.fail_refine(generation, trimmed, err),
        };

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(document = %id, "discarding stale refinement result");
            return Ok(());
        }
        inner.cache.set(preview);
        inner.pending_instruction = None;
        inner.state = SessionState::Ready;
        Ok(())
    }

    /// Releases the preview, discards in-flight instruction text, and tears
    /// the binding down. A later `open` starts from scratch.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.cache.clear();
        inner.document = None;
        inner.bound = None;
        inner.pending_instruction = None;
        inner.last_error = None;
        inner.state = SessionState::Closed;
        inner.generation += 1;
    }

    fn fail_load(&self, generation: u64, err: EngineError) -> Result<(), EngineError> {
        let mut inner = self.lock();
        if inner.generation == generation {
            warn!(error = %err, "session load failed");
            inner.state = SessionState::LoadFailed;
            inner.last_error = Some(err.clone());
        }
        Err(err)
    }

    fn fail_refine(
        &self,
        generation: u64,
        instruction: &str,
        err: EngineError,
    ) -> Result<(), EngineError> {
        let mut inner = self.lock();
        if inner.generation == generation {
            warn!(error = %err, "refinement failed; preview unchanged");
            // Prior artifact stays live; the user can edit and retry.
            inner.state = SessionState::Ready;
            inner.pending_instruction = Some(instruction.to_string());
            inner.last_error = Some(err.clone());
        }
        Err(err)
    }
}
