use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, store-assigned document identifier. Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh id. Used by local stores; the remote backend assigns
    /// its own ids on creation.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a document's source came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Produced by the backend (PDF conversion or tailoring).
    Generated,
    /// Imported verbatim from a user-supplied TeX file.
    Imported,
}

/// A named, user-owned unit of source content.
///
/// The engine never mutates source locally — all changes go through the
/// backend's refinement operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    #[serde(rename = "userId")]
    pub owner_id: String,
    #[serde(rename = "resumeName")]
    pub name: String,
    #[serde(rename = "sourceFormat")]
    pub source_format: SourceFormat,
    /// Present when the document was produced by a tailoring operation.
    #[serde(rename = "jobDescription", default)]
    pub job_description: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}
