//! Document refinement & compiled-artifact synchronization engine.
//!
//! Tracks a resume document's source state, issues refinement instructions
//! to a remote compiler/AI backend, regenerates and caches the compiled PDF
//! preview, and keeps observable state consistent despite slow,
//! failure-prone, and possibly overlapping network operations.
//!
//! The backend itself (compilation, AI) and the identity provider are
//! external collaborators reached through the [`client::DocumentBackend`]
//! and [`auth::TokenProvider`] traits.

pub mod artifact;
pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod session;
pub mod store;
pub mod versioning;

pub use artifact::{ArtifactCache, ArtifactHandle, HandleAllocator, InMemoryAllocator};
pub use auth::{StaticTokenProvider, TokenProvider};
pub use client::{DocumentBackend, HttpDocumentClient};
pub use config::Config;
pub use errors::EngineError;
pub use models::{Document, DocumentId, SourceFormat, UserProfile};
pub use session::{RefinementSession, SessionState};
pub use store::{InMemoryStore, MetadataStore, ProfilePatch};
pub use versioning::{DeleteConfirmation, VersioningController};
