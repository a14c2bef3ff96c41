//! Remote document client — the single point of entry for all backend calls.
//!
//! ARCHITECTURAL RULE: no other module talks to the backend directly. The
//! session and versioning layers only ever see the [`DocumentBackend`] trait,
//! so tests (and alternative transports) swap the implementation without
//! touching the engine logic.
//!
//! Pure transport: no business logic, no retries. Every failure is returned
//! to the caller; a repeat is always a fresh, user-initiated call.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::auth::TokenProvider;
use crate::config::Config;
use crate::errors::EngineError;
use crate::models::{Document, DocumentId};

#[cfg(test)]
pub(crate) mod mock;

/// Typed request/response contract to the metadata store and compiler
/// backend. Carried as `Arc<dyn DocumentBackend>` by the engine components.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Fetches a document record. Safe to retry.
    async fn fetch_document(&self, id: &DocumentId) -> Result<Document, EngineError>;

    /// Triggers compilation of the document's current source and returns the
    /// PDF bytes. Safe to retry.
    async fn compile_preview(&self, id: &DocumentId) -> Result<Bytes, EngineError>;

    /// Returns the raw source text. Safe to retry.
    async fn download_source(&self, id: &DocumentId) -> Result<String, EngineError>;

    /// Asks the backend to mutate the document's source per `instruction`.
    /// On success the source has changed server-side. Not safe to retry
    /// silently.
    async fn submit_refinement(
        &self,
        id: &DocumentId,
        instruction: &str,
        job_description: &str,
    ) -> Result<(), EngineError>;

    /// Derives a new document from `base_id` tailored to `job_description`.
    /// Not safe to retry silently.
    async fn submit_tailoring(
        &self,
        base_id: &DocumentId,
        job_description: &str,
        new_name: &str,
    ) -> Result<DocumentId, EngineError>;

    /// Permanently deletes a document. Not safe to retry silently.
    async fn delete_document(&self, id: &DocumentId) -> Result<(), EngineError>;

    /// Uploads a PDF for AI conversion into a new document.
    async fn upload_pdf(
        &self,
        file_name: &str,
        payload: Bytes,
        resume_name: &str,
    ) -> Result<DocumentId, EngineError>;

    /// Imports an existing TeX source as a new document.
    async fn upload_tex(
        &self,
        file_name: &str,
        source: String,
        resume_name: &str,
    ) -> Result<DocumentId, EngineError>;
}

/// Which taxonomy variant a structured `{error}` body maps to. Depends on
/// the endpoint: compile failures are source-level, refine/tailor failures
/// are instruction-level, everything else is opaque transport.
#[derive(Debug, Clone, Copy)]
enum RemoteFault {
    Compilation,
    Refinement,
    Opaque,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct TailorResponse {
    #[serde(rename = "newResumeId")]
    new_resume_id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "resumeId")]
    resume_id: String,
}

/// Maps a non-success HTTP status plus an optional parsed `{error}` message
/// onto the engine taxonomy.
fn classify(status: StatusCode, message: Option<String>, fault: RemoteFault) -> EngineError {
    if status == StatusCode::NOT_FOUND {
        return EngineError::NotFound(
            message.unwrap_or_else(|| "document no longer exists".to_string()),
        );
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return EngineError::Auth;
    }
    match (message, fault) {
        // The backend understood the request and reported why it failed —
        // surface its message verbatim.
        (Some(msg), RemoteFault::Compilation) => EngineError::Compilation(msg),
        (Some(msg), RemoteFault::Refinement) => EngineError::Refinement(msg),
        (Some(msg), RemoteFault::Opaque) => EngineError::Transport(msg),
        (None, _) => EngineError::Transport(format!("backend returned {status}")),
    }
}

/// HTTP implementation of [`DocumentBackend`] over the backend REST surface.
///
/// Every call fetches a fresh bearer token from the [`TokenProvider`] —
/// tokens are never cached across calls.
pub struct HttpDocumentClient {
    http: Client,
    base_url: String,
    auth: Arc<dyn TokenProvider>,
}

impl HttpDocumentClient {
    pub fn new(config: &Config, auth: Arc<dyn TokenProvider>) -> Result<Self, EngineError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Precondition check plus fresh credential. Absence of a current user
    /// is an `Auth` failure before any network I/O.
    async fn bearer(&self) -> Result<String, EngineError> {
        if self.auth.current_user_id().is_none() {
            return Err(EngineError::Auth);
        }
        self.auth.fresh_token().await
    }

    /// Consumes a non-success response and classifies it.
    async fn reject(&self, response: reqwest::Response, fault: RemoteFault) -> EngineError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body).map(|b| b.error).ok();
        debug!(%status, "backend call rejected");
        classify(status, message, fault)
    }
}

#[async_trait]
impl DocumentBackend for HttpDocumentClient {
    async fn fetch_document(&self, id: &DocumentId) -> Result<Document, EngineError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .get(self.endpoint(&format!("/api/resumes/{id}/")))
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.reject(response, RemoteFault::Opaque).await);
        }
        Ok(response.json::<Document>().await?)
    }

    async fn compile_preview(&self, id: &DocumentId) -> Result<Bytes, EngineError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .get(self.endpoint(&format!("/api/resumes/{id}/download/")))
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.reject(response, RemoteFault::Compilation).await);
        }
        Ok(response.bytes().await?)
    }

    async fn download_source(&self, id: &DocumentId) -> Result<String, EngineError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .get(self.endpoint(&format!("/api/resumes/{id}/download-tex/")))
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.reject(response, RemoteFault::Opaque).await);
        }
        Ok(response.text().await?)
    }

    async fn submit_refinement(
        &self,
        id: &DocumentId,
        instruction: &str,
        job_description: &str,
    ) -> Result<(), EngineError> {
        let token = self.bearer().await?;
        let form = multipart::Form::new()
            .text("instruction", instruction.to_string())
            .text("job_description", job_description.to_string());
        let response = self
            .http
            .post(self.endpoint(&format!("/api/resumes/{id}/refine/")))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.reject(response, RemoteFault::Refinement).await);
        }
        Ok(())
    }

    async fn submit_tailoring(
        &self,
        base_id: &DocumentId,
        job_description: &str,
        new_name: &str,
    ) -> Result<DocumentId, EngineError> {
        // Required-field check before any network I/O, including the token
        // fetch.
        if base_id.as_str().trim().is_empty()
            || job_description.trim().is_empty()
            || new_name.trim().is_empty()
        {
            return Err(EngineError::Validation(
                "tailoring requires a base resume, a job description, and a name".to_string(),
            ));
        }
        let token = self.bearer().await?;
        let form = multipart::Form::new()
            .text("base_resume_id", base_id.as_str().to_string())
            .text("job_description", job_description.to_string())
            .text("new_resume_name", new_name.to_string());
        let response = self
            .http
            .post(self.endpoint("/api/tailor-resume/"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.reject(response, RemoteFault::Refinement).await);
        }
        let body = response.json::<TailorResponse>().await?;
        Ok(DocumentId::new(body.new_resume_id))
    }

    async fn delete_document(&self, id: &DocumentId) -> Result<(), EngineError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .delete(self.endpoint(&format!("/api/resumes/{id}/delete/")))
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.reject(response, RemoteFault::Opaque).await);
        }
        Ok(())
    }

    async fn upload_pdf(
        &self,
        file_name: &str,
        payload: Bytes,
        resume_name: &str,
    ) -> Result<DocumentId, EngineError> {
        let token = self.bearer().await?;
        let part = multipart::Part::bytes(payload.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new()
            .part("resume_pdf", part)
            .text("resume_name", resume_name.to_string());
        let response = self
            .http
            .post(self.endpoint("/api/upload-resume/"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.reject(response, RemoteFault::Refinement).await);
        }
        let body = response.json::<UploadResponse>().await?;
        Ok(DocumentId::new(body.resume_id))
    }

    async fn upload_tex(
        &self,
        file_name: &str,
        source: String,
        resume_name: &str,
    ) -> Result<DocumentId, EngineError> {
        let token = self.bearer().await?;
        let part = multipart::Part::text(source).file_name(file_name.to_string());
        let form = multipart::Form::new()
            .part("resume_tex", part)
            .text("resume_name", resume_name.to_string());
        let response = self
            .http
            .post(self.endpoint("/api/upload-tex/"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.reject(response, RemoteFault::Refinement).await);
        }
        let body = response.json::<UploadResponse>().await?;
        Ok(DocumentId::new(body.resume_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_wins_over_fault_kind() {
        let err = classify(
            StatusCode::NOT_FOUND,
            Some("gone".to_string()),
            RemoteFault::Compilation,
        );
        assert_eq!(err, EngineError::NotFound("gone".to_string()));
    }

    #[test]
    fn unauthorized_maps_to_auth() {
        let err = classify(StatusCode::UNAUTHORIZED, None, RemoteFault::Opaque);
        assert_eq!(err, EngineError::Auth);
        let err = classify(StatusCode::FORBIDDEN, None, RemoteFault::Refinement);
        assert_eq!(err, EngineError::Auth);
    }

    #[test]
    fn structured_error_keeps_backend_message_verbatim() {
        let err = classify(
            StatusCode::UNPROCESSABLE_ENTITY,
            Some("Undefined control sequence at line 12".to_string()),
            RemoteFault::Compilation,
        );
        assert_eq!(
            err,
            EngineError::Compilation("Undefined control sequence at line 12".to_string())
        );

        let err = classify(
            StatusCode::BAD_REQUEST,
            Some("instruction too vague".to_string()),
            RemoteFault::Refinement,
        );
        assert_eq!(
            err,
            EngineError::Refinement("instruction too vague".to_string())
        );
    }

    #[test]
    fn opaque_failure_is_transport() {
        let err = classify(StatusCode::BAD_GATEWAY, None, RemoteFault::Compilation);
        assert!(matches!(err, EngineError::Transport(_)));
        assert!(err.is_retryable());
    }
}
