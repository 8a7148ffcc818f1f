//! Reference Library Port - Source of the documents attached to each turn.
//!
//! The conversational service reads the BOIN guideline documents alongside
//! every request. A library loads them once per session; a document that
//! cannot be read is reported and skipped, the rest are still sent.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Port for loading reference documents.
///
/// # Contract
///
/// Implementations must:
/// - Never fail as a whole; collect per-document failures instead
/// - Preserve the configured document order
#[async_trait]
pub trait ReferenceLibrary: Send + Sync {
    /// Load every configured document.
    async fn load_all(&self) -> LoadedDocuments;
}

/// A document sent alongside the transcript.
///
/// Content is shared, so handing the documents to every turn's request does
/// not copy them.
#[derive(Clone, PartialEq, Eq)]
pub struct ReferenceDocument {
    /// Display name, usually the file name.
    pub name: String,
    /// MIME type: `application/pdf` or a `text/*` type.
    pub media_type: String,
    /// Raw content.
    pub bytes: Arc<[u8]>,
}

impl ReferenceDocument {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type == "application/pdf"
    }

    /// Content as text, for `text/*` documents holding valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        if !self.media_type.starts_with("text/") {
            return None;
        }
        std::str::from_utf8(&self.bytes).ok()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Content is omitted so request logging stays readable.
impl fmt::Debug for ReferenceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceDocument")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Result of loading the library.
#[derive(Debug, Default)]
pub struct LoadedDocuments {
    pub documents: Vec<ReferenceDocument>,
    pub failures: Vec<DocumentError>,
}

impl LoadedDocuments {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Failure to load one reference document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Reference document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read reference document {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reference document is empty: {}", .0.display())]
    Empty(PathBuf),

    #[error("Reference document {} is not PDF or plain text", .0.display())]
    UnsupportedType(PathBuf),

    #[error("Reference document {} is not valid UTF-8 text", .0.display())]
    NotUtf8(PathBuf),
}

impl DocumentError {
    /// Path of the document that failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            DocumentError::NotFound(path) => path,
            DocumentError::Read { path, .. } => path,
            DocumentError::Empty(path)
            | DocumentError::UnsupportedType(path)
            | DocumentError::NotUtf8(path) => path,
        }
    }
}
