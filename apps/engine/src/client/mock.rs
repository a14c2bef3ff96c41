//! Scripted [`DocumentBackend`] used by session and versioning tests.
//!
//! Supports call counting, per-operation failure injection, and awaitable
//! gates so a test can hold an operation in flight while it pokes the
//! session from outside.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::Notify;

use super::DocumentBackend;
use crate::errors::EngineError;
use crate::models::{Document, DocumentId, SourceFormat};

pub(crate) fn document(id: &str, job_description: Option<&str>) -> Document {
    let now = Utc::now();
    Document {
        id: DocumentId::new(id),
        owner_id: "user-1".to_string(),
        name: format!("Resume {id}"),
        source_format: SourceFormat::Generated,
        job_description: job_description.map(str::to_string),
        created_at: now,
        last_updated: now,
    }
}

#[derive(Default)]
pub(crate) struct MockBackend {
    pub fetch_calls: AtomicUsize,
    pub compile_calls: AtomicUsize,
    pub refine_calls: AtomicUsize,
    pub tailor_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    compile_seq: AtomicUsize,
    fetch_error: Mutex<Option<EngineError>>,
    compile_error: Mutex<Option<EngineError>>,
    refine_error: Mutex<Option<EngineError>>,
    tailor_error: Mutex<Option<EngineError>>,
    compile_gates: Mutex<HashMap<String, Arc<Notify>>>,
    refine_gates: Mutex<HashMap<String, Arc<Notify>>>,
    pub last_refinement: Mutex<Option<(String, String)>>,
}

impl MockBackend {
    pub fn fail_fetch(&self, err: EngineError) {
        *self.fetch_error.lock().unwrap() = Some(err);
    }

    pub fn fail_compile(&self, err: EngineError) {
        *self.compile_error.lock().unwrap() = Some(err);
    }

    pub fn fail_refine(&self, err: EngineError) {
        *self.refine_error.lock().unwrap() = Some(err);
    }

    pub fn fail_tailor(&self, err: EngineError) {
        *self.tailor_error.lock().unwrap() = Some(err);
    }

    /// Makes `compile_preview` for `id` block until the returned gate is
    /// notified.
    pub fn gate_compile(&self, id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.compile_gates
            .lock()
            .unwrap()
            .insert(id.to_string(), gate.clone());
        gate
    }

    /// Makes `submit_refinement` for `id` block until the returned gate is
    /// notified.
    pub fn gate_refine(&self, id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.refine_gates
            .lock()
            .unwrap()
            .insert(id.to_string(), gate.clone());
        gate
    }
}

#[async_trait]
impl DocumentBackend for MockBackend {
    async fn fetch_document(&self, id: &DocumentId) -> Result<Document, EngineError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fetch_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(document(id.as_str(), Some("JD text")))
    }

    async fn compile_preview(&self, id: &DocumentId) -> Result<Bytes, EngineError> {
        self.compile_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.compile_gates.lock().unwrap().get(id.as_str()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.compile_error.lock().unwrap().clone() {
            return Err(err);
        }
        let seq = self.compile_seq.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from(format!("pdf:{id}:{seq}")))
    }

    async fn download_source(&self, id: &DocumentId) -> Result<String, EngineError> {
        Ok(format!("\\documentclass{{article}} % {id}"))
    }

    async fn submit_refinement(
        &self,
        id: &DocumentId,
        instruction: &str,
        job_description: &str,
    ) -> Result<(), EngineError> {
        self.refine_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.refine_gates.lock().unwrap().get(id.as_str()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.refine_error.lock().unwrap().clone() {
            return Err(err);
        }
        *self.last_refinement.lock().unwrap() =
            Some((instruction.to_string(), job_description.to_string()));
        Ok(())
    }

    async fn submit_tailoring(
        &self,
        base_id: &DocumentId,
        _job_description: &str,
        _new_name: &str,
    ) -> Result<DocumentId, EngineError> {
        self.tailor_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.tailor_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(DocumentId::new(format!("tailored-{base_id}")))
    }

    async fn delete_document(&self, _id: &DocumentId) -> Result<(), EngineError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upload_pdf(
        &self,
        _file_name: &str,
        _payload: Bytes,
        resume_name: &str,
    ) -> Result<DocumentId, EngineError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        Ok(DocumentId::new(format!("uploaded-{resume_name}")))
    }

    async fn upload_tex(
        &self,
        _file_name: &str,
        _source: String,
        resume_name: &str,
    ) -> Result<DocumentId, EngineError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        Ok(DocumentId::new(format!("imported-{resume_name}")))
    }
}
