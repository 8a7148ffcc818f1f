//! Filesystem Reference Library - Implementation of ReferenceLibrary.
//!
//! Reads each configured path with `tokio::fs`. The media type comes from
//! the file extension. Only PDF and UTF-8 text are accepted, since those are
//! the document kinds every provider can take; anything else is reported as a
//! failure and left out of the session.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::ports::{DocumentError, LoadedDocuments, ReferenceDocument, ReferenceLibrary};

/// Reference documents read from local files.
///
/// # Usage
///
/// ```rust,ignore
/// let library = FileReferenceLibrary::new(vec!["guidelines.pdf".into()]);
/// let loaded = library.load_all().await;
/// for failure in &loaded.failures {
///     eprintln!("{}", failure);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileReferenceLibrary {
    paths: Vec<PathBuf>,
}

impl FileReferenceLibrary {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    async fn load_one(path: &Path) -> Result<ReferenceDocument, DocumentError> {
        let bytes = fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DocumentError::NotFound(path.to_path_buf()),
            _ => DocumentError::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        if bytes.is_empty() {
            return Err(DocumentError::Empty(path.to_path_buf()));
        }

        let media_type =
            media_type_for(path).ok_or_else(|| DocumentError::UnsupportedType(path.to_path_buf()))?;
        if media_type.starts_with("text/") && std::str::from_utf8(&bytes).is_err() {
            return Err(DocumentError::NotUtf8(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(ReferenceDocument::new(name, media_type, bytes))
    }
}

#[async_trait]
impl ReferenceLibrary for FileReferenceLibrary {
    async fn load_all(&self) -> LoadedDocuments {
        let mut loaded = LoadedDocuments::default();

        for path in &self.paths {
            match Self::load_one(path).await {
                Ok(doc) => {
                    tracing::info!(document = %doc.name, bytes = doc.len(), "Loaded reference document");
                    loaded.documents.push(doc);
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Skipping reference document");
                    loaded.failures.push(err);
                }
            }
        }

        loaded
    }
}

/// MIME type for a supported document extension.
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let media_type = match ext.as_deref()? {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        _ => return None,
    };
    Some(media_type)
}
