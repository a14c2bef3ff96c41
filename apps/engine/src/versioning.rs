//! Versioning controller — derives new document records and manages
//! document lifecycle edges (tailoring, import, confirmed delete).
//!
//! Validation happens here, before any network call; backend failures pass
//! through to the caller unchanged, and nothing is left bound on failure —
//! the caller opens a fresh session on the returned id only after success.

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::client::DocumentBackend;
use crate::errors::EngineError;
use crate::models::DocumentId;

/// Explicit acknowledgement that a delete is permanent. The terminal
/// confirmation step precedes every destruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteConfirmation {
    Confirmed,
    Cancelled,
}

pub struct VersioningController {
    backend: Arc<dyn DocumentBackend>,
}

impl VersioningController {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    /// Derives a new document from `base_id` tailored to `job_description`.
    /// All three inputs must be non-blank; returns the new document's id,
    /// which the caller binds to a fresh session.
    pub async fn tailor(
        &self,
        base_id: &DocumentId,
        job_description: &str,
        new_name: &str,
    ) -> Result<DocumentId, EngineError> {
        if base_id.as_str().trim().is_empty() {
            return Err(EngineError::Validation(
                "select a base resume to tailor".to_string(),
            ));
        }
        if job_description.trim().is_empty() {
            return Err(EngineError::Validation(
                "provide a job description".to_string(),
            ));
        }
        if new_name.trim().is_empty() {
            return Err(EngineError::Validation(
                "name the tailored resume".to_string(),
            ));
        }

        let new_id = self
            .backend
            .submit_tailoring(base_id, job_description, new_name)
            .await?;
        info!(base = %base_id, new = %new_id, "tailored new document");
        Ok(new_id)
    }

    /// Permanently deletes a document. Requires an explicit
    /// [`DeleteConfirmation::Confirmed`]; anything else fails validation
    /// with zero network calls.
    pub async fn delete(
        &self,
        id: &DocumentId,
        confirmation: DeleteConfirmation,
    ) -> Result<(), EngineError> {
        if confirmation != DeleteConfirmation::Confirmed {
            return Err(EngineError::Validation(
                "delete requires explicit confirmation".to_string(),
            ));
        }
        self.backend.delete_document(id).await?;
        info!(document = %id, "document deleted");
        Ok(())
    }

    /// Uploads a PDF for AI conversion into a new document.
    pub async fn import_pdf(
        &self,
        file_name: &str,
        payload: Bytes,
        resume_name: &str,
    ) -> Result<DocumentId, EngineError> {
        if resume_name.trim().is_empty() {
            return Err(EngineError::Validation(
                "name the imported resume".to_string(),
            ));
        }
        if payload.is_empty() {
            return Err(EngineError::Validation("empty PDF payload".to_string()));
        }
        self.backend.upload_pdf(file_name, payload, resume_name).await
    }

    /// Imports an existing TeX source as a new document.
    pub async fn import_tex(
        &self,
        file_name: &str,
        source: &str,
        resume_name: &str,
    ) -> Result<DocumentId, EngineError> {
        if resume_name.trim().is_empty() {
            return Err(EngineError::Validation(
                "name the imported resume".to_string(),
            ));
        }
        if source.trim().is_empty() {
            return Err(EngineError::Validation("empty TeX source".to_string()));
        }
        self.backend
            .upload_tex(file_name, source.to_string(), resume_name)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::client::mock::MockBackend;

    fn controller() -> (VersioningController, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::default());
        (VersioningController::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn tailor_rejects_blank_inputs_without_network_calls() {
        let (controller, backend) = controller();
        let base = DocumentId::new("docA");

        let cases = [
            controller.tailor(&DocumentId::new(""), "JD text", "New Name").await,
            controller.tailor(&base, "", "New Name").await,
            controller.tailor(&base, "JD text", "   ").await,
        ];
        for result in cases {
            assert!(matches!(result, Err(EngineError::Validation(_))));
        }
        assert_eq!(backend.tailor_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn tailor_returns_new_document_id() {
        let (controller, backend) = controller();

        let new_id = controller
            .tailor(&DocumentId::new("docA"), "JD text", "New Name")
            .await
            .unwrap();

        assert_eq!(new_id, DocumentId::new("tailored-docA"));
        assert_eq!(backend.tailor_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tailor_failure_passes_through_unchanged() {
        let (controller, backend) = controller();
        backend.fail_tailor(EngineError::Refinement("base resume has no source".into()));

        let err = controller
            .tailor(&DocumentId::new("docA"), "JD text", "New Name")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            EngineError::Refinement("base resume has no source".into())
        );
    }

    #[tokio::test]
    async fn delete_requires_explicit_confirmation() {
        let (controller, backend) = controller();
        let id = DocumentId::new("docA");

        let err = controller
            .delete(&id, DeleteConfirmation::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(backend.delete_calls.load(Ordering::SeqCst), 0);

        controller
            .delete(&id, DeleteConfirmation::Confirmed)
            .await
            .unwrap();
        assert_eq!(backend.delete_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn imports_validate_name_and_payload() {
        let (controller, backend) = controller();

        let err = controller
            .import_pdf("resume.pdf", Bytes::from_static(b"%PDF"), "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let err = controller
            .import_tex("resume.tex", "", "Imported")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(backend.upload_calls.load(Ordering::SeqCst), 0);

        let id = controller
            .import_tex("resume.tex", "\\documentclass{article}", "Imported")
            .await
            .unwrap();
        assert_eq!(id, DocumentId::new("imported-Imported"));
        assert_eq!(backend.upload_calls.load(Ordering::SeqCst), 1);
    }
}
