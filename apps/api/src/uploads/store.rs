//! Upload Store — at most one pending documentation file per session.
//!
//! A file is written once on upload and read-and-deleted at most once, by the
//! next analysis call from the same session. `consume` takes the entry out of
//! the map before touching the disk, so two concurrent analysis calls from one
//! session cannot both see the same document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::session::SessionId;

/// Extensions accepted as plain-text documentation (lowercase, no dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text", "log", "csv"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file part in the request.")]
    MissingFile,

    #[error("No file selected.")]
    EmptyFilename,

    #[error("Unsupported file type. Please upload a plain-text file (.txt, .md).")]
    UnsupportedExtension,

    #[error("Malformed upload: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pending documentation files keyed by session.
#[derive(Clone)]
pub struct UploadStore {
    dir: PathBuf,
    pending: Arc<DashMap<SessionId, PathBuf>>,
}

impl UploadStore {
    /// Creates the store, creating `dir` if it does not exist.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            pending: Arc::new(DashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Saves `contents` as the pending document for `session`, replacing any
    /// earlier pending upload. Returns the sanitized filename.
    pub async fn store(
        &self,
        session: &SessionId,
        filename: &str,
        contents: &[u8],
    ) -> Result<String, UploadError> {
        let safe_name = sanitize_filename(filename).ok_or(UploadError::EmptyFilename)?;
        if !has_allowed_extension(&safe_name) {
            return Err(UploadError::UnsupportedExtension);
        }

        let path = self.dir.join(format!("{session}-{safe_name}"));
        tokio::fs::write(&path, contents).await?;

        if let Some(previous) = self.pending.insert(session.clone(), path.clone()) {
            if previous != path {
                remove_quietly(&previous).await;
            }
        }

        info!(
            "Stored documentation upload for session {session}: {} ({} bytes)",
            safe_name,
            contents.len()
        );
        Ok(safe_name)
    }

    /// Takes the pending document for `session`, deleting it from disk.
    /// Returns an empty string when nothing is pending.
    pub async fn consume(&self, session: &SessionId) -> String {
        let Some((_, path)) = self.pending.remove(session) else {
            return String::new();
        };

        let text = match tokio::fs::read(&path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("Pending upload {} could not be read: {e}", path.display());
                String::new()
            }
        };
        remove_quietly(&path).await;

        debug!(
            "Consumed documentation for session {session} ({} chars)",
            text.chars().count()
        );
        text
    }

    /// Whether `session` has a document waiting.
    #[cfg(test)]
    pub fn has_pending(&self, session: &SessionId) -> bool {
        self.pending.contains_key(session)
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to delete upload {}: {e}", path.display());
        }
    }
}

/// Reduces a client-supplied filename to a safe final component made of
/// `[A-Za-z0-9._-]`. Returns `None` when nothing usable remains.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let last = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Case-insensitive check against `ALLOWED_EXTENSIONS`.
pub fn has_allowed_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
