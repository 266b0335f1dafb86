//! Profile picture storage
//!
//! Uploaded images are written to the configured directory as
//! `{unix_millis}-{sanitized original name}` and served back under the
//! configured public prefix.

use anyhow::Context;
use thiserror::Error;
use tokio::fs;

use crate::config::UploadConfig;

/// Upload errors
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid file type: {content_type}. Allowed types: {allowed}")]
    InvalidType {
        content_type: String,
        allowed: String,
    },

    #[error("File too large. Maximum size: {} MB", .max / 1024 / 1024)]
    TooLarge { max: u64 },

    #[error("Empty file")]
    Empty,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A file received from a client but not yet written to disk
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Writes uploads to the upload directory
#[derive(Debug, Clone)]
pub struct UploadStore {
    config: UploadConfig,
}

impl UploadStore {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    /// Check type and size without touching the disk.
    pub fn validate(&self, upload: &PendingUpload) -> Result<(), UploadError> {
        if !self.config.is_type_allowed(&upload.content_type) {
            return Err(UploadError::InvalidType {
                content_type: upload.content_type.clone(),
                allowed: self.config.allowed_types.join(", "),
            });
        }

        if upload.data.is_empty() {
            return Err(UploadError::Empty);
        }

        if upload.data.len() as u64 > self.config.max_file_size {
            return Err(UploadError::TooLarge {
                max: self.config.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate and write the upload, returning its public path.
    pub async fn save(&self, upload: &PendingUpload) -> Result<String, UploadError> {
        self.validate(upload)?;

        fs::create_dir_all(&self.config.path)
            .await
            .with_context(|| format!("Failed to create upload directory: {:?}", self.config.path))?;

        let file_name = format!(
            "{}-{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_file_name(&upload.file_name)
        );
        let file_path = self.config.path.join(&file_name);

        fs::write(&file_path, &upload.data)
            .await
            .with_context(|| format!("Failed to save file: {:?}", file_path))?;

        tracing::info!("Stored upload {} ({} bytes)", file_name, upload.data.len());

        Ok(format!(
            "{}/{}",
            self.config.public_prefix.trim_end_matches('/'),
            file_name
        ))
    }
}

/// Reduce a client-supplied file name to a safe single path component.
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]`
/// becomes `_`. Falls back to `upload` when nothing usable remains.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

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
        "upload".to_string()
    } else {
        cleaned.chars().take(100).collect()
    }
}
