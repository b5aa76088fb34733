//! Product image storage on the local filesystem.
//!
//! Files are written as `<unix millis>-<sanitised original name>` into the
//! uploads directory and served back under `/uploads/`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

/// URL prefix stored images are served under.
pub const UPLOADS_PATH: &str = "/uploads";

/// Errors writing an uploaded file.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes uploaded images to a directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store `bytes` and return the public path, e.g. `/uploads/1700000000000-tee.png`.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Io` if the directory cannot be created or the file
    /// cannot be written.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitise_file_name(original_name)
        );
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;

        tracing::info!(file = %file_name, size = bytes.len(), "stored upload");
        Ok(format!("{UPLOADS_PATH}/{file_name}"))
    }
}

/// Keep the last path component and replace anything outside `[A-Za-z0-9._-]`.
fn sanitise_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_owned()
    } else {
        cleaned.to_owned()
    }
}
