//! Compiled-artifact lifecycle.
//!
//! A compiled preview is held behind an opaque, locally-scoped
//! [`ArtifactHandle`] — the generalization of a browser object URL. Handles
//! are issued by a pluggable [`HandleAllocator`] so the embedding
//! environment can substitute its own resource mechanism; the cache enforces
//! the replace discipline: the new handle exists before the superseded one
//! is released, and at most one handle is ever live per session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use tracing::debug;

/// Opaque reference to a locally-held compiled preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactHandle(u64);

impl ArtifactHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Environment-specific handle mechanism. A browser target would wrap
/// `createObjectURL`/`revokeObjectURL`; [`InMemoryAllocator`] is the default.
pub trait HandleAllocator: Send + Sync {
    fn allocate(&self, bytes: &Bytes) -> ArtifactHandle;
    fn release(&self, handle: ArtifactHandle);
}

impl<T: HandleAllocator + ?Sized> HandleAllocator for std::sync::Arc<T> {
    fn allocate(&self, bytes: &Bytes) -> ArtifactHandle {
        (**self).allocate(bytes)
    }

    fn release(&self, handle: ArtifactHandle) {
        (**self).release(handle)
    }
}

/// Default allocator: handles index an in-process byte table.
#[derive(Default)]
pub struct InMemoryAllocator {
    next: AtomicU64,
    total: AtomicU64,
    live: Mutex<HashMap<u64, Bytes>>,
}

impl InMemoryAllocator {
    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Bytes>> {
        self.live.lock().expect("artifact table lock poisoned")
    }

    /// Dereferences a live handle (preview display, download).
    pub fn resolve(&self, handle: ArtifactHandle) -> Option<Bytes> {
        self.table().get(&handle.raw()).cloned()
    }

    pub fn is_live(&self, handle: ArtifactHandle) -> bool {
        self.table().contains_key(&handle.raw())
    }

    pub fn live_count(&self) -> usize {
        self.table().len()
    }

    /// Handles ever issued, live or not.
    pub fn total_allocated(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}

impl HandleAllocator for InMemoryAllocator {
    fn allocate(&self, bytes: &Bytes) -> ArtifactHandle {
        let raw = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        self.total.fetch_add(1, Ordering::SeqCst);
        self.table().insert(raw, bytes.clone());
        ArtifactHandle(raw)
    }

    fn release(&self, handle: ArtifactHandle) {
        if self.table().remove(&handle.raw()).is_none() {
            debug!(handle = handle.raw(), "release of unknown artifact handle");
        }
    }
}

/// Holds the single live compiled preview for one session.
pub struct ArtifactCache<A: HandleAllocator> {
    allocator: A,
    current: Option<(ArtifactHandle, Bytes)>,
}

impl<A: HandleAllocator> ArtifactCache<A> {
    pub fn new(allocator: A) -> Self {
        Self {
            allocator,
            current: None,
        }
    }

    /// Installs a fresh preview, replacing any prior one. The new handle is
    /// allocated before the superseded handle is released, so a consumer
    /// reading across the swap never observes a gap.
    pub fn set(&mut self, bytes: Bytes) -> ArtifactHandle {
        let handle = self.allocator.allocate(&bytes);
        if let Some((old, _)) = self.current.replace((handle, bytes)) {
            self.allocator.release(old);
        }
        handle
    }

    pub fn current(&self) -> Option<ArtifactHandle> {
        self.current.as_ref().map(|(handle, _)| *handle)
    }

    pub fn bytes(&self) -> Option<Bytes> {
        self.current.as_ref().map(|(_, bytes)| bytes.clone())
    }

    /// Releases the current handle, if any.
    pub fn clear(&mut self) {
        if let Some((handle, _)) = self.current.take() {
            self.allocator.release(handle);
        }
    }
}

impl<A: HandleAllocator> Drop for ArtifactCache<A> {
    // The final live handle is released on teardown.
    fn drop(&mut self) {
        self.clear();
    }
}
