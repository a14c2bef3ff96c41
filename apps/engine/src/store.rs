//! Metadata store boundary.
//!
//! The engine treats the document/profile store as a simple keyed service:
//! document records queryable per owner (newest first) and profile records
//! that are read/merge-write only. [`InMemoryStore`] is the reference
//! implementation and test double; a deployment substitutes its own.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::EngineError;
use crate::models::{Document, UserProfile};

/// Partial profile update. `None` fields are left untouched by
/// [`MetadataStore::merge_profile`] — writes are never destructive of
/// unspecified fields.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub custom_instructions: Option<String>,
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// All documents belonging to `owner_id`, newest first.
    async fn documents_for_owner(&self, owner_id: &str) -> Result<Vec<Document>, EngineError>;

    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, EngineError>;

    /// Merge-writes `patch` into the user's profile, creating the record if
    /// absent.
    async fn merge_profile(&self, user_id: &str, patch: ProfilePatch) -> Result<(), EngineError>;
}

#[derive(Default)]
pub struct InMemoryStore {
    documents: Mutex<Vec<Document>>,
    profiles: Mutex<HashMap<String, UserProfile>>,
}

impl InMemoryStore {
    pub fn insert_document(&self, document: Document) {
        self.documents
            .lock()
            .expect("document table lock poisoned")
            .push(document);
    }
}

#[async_trait]
impl MetadataStore for InMemoryStore {
    async fn documents_for_owner(&self, owner_id: &str) -> Result<Vec<Document>, EngineError> {
        let mut matching: Vec<Document> = self
            .documents
            .lock()
            .expect("document table lock poisoned")
            .iter()
            .filter(|document| document.owner_id == owner_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, EngineError> {
        Ok(self
            .profiles
            .lock()
            .expect("profile table lock poisoned")
            .get(user_id)
            .cloned())
    }

    async fn merge_profile(&self, user_id: &str, patch: ProfilePatch) -> Result<(), EngineError> {
        let mut profiles = self.profiles.lock().expect("profile table lock poisoned");
        let profile = profiles.entry(user_id.to_string()).or_default();
        if let Some(display_name) = patch.display_name {
            profile.display_name = display_name;
        }
        if let Some(custom_instructions) = patch.custom_instructions {
            profile.custom_instructions = custom_instructions;
        }
        Ok(())
    }
}
