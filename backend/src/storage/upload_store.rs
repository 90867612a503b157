use chrono::Utc;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::config::ALLOWED_EXTENSIONS;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No video file provided")]
    MissingFile,
    #[error("No file selected")]
    EmptyFilename,
    #[error("Invalid file type. Please upload MP4, MOV, AVI, or MKV files.")]
    InvalidFormat,
    #[error("File too large. Maximum upload size is {0} MB")]
    FileTooLarge(u64),
    #[error("Upload stream error: {0}")]
    Stream(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UploadError::Stream(_) | UploadError::Io(_))
    }
}

/// Scratch directory for uploads that only live for one request.
#[derive(Clone, Debug)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: u64,
}

impl UploadStore {
    pub fn new(dir: PathBuf, max_bytes: u64) -> Self {
        Self { dir, max_bytes }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Keeps ASCII letters, digits, `_`, `.` and `-` after NFKD folding, so
    /// accented letters lose their marks instead of vanishing. Whitespace and
    /// path separators collapse to `_`, leading/trailing dots and underscores go.
    pub fn sanitize_filename(file_name: &str) -> String {
        let spaced: String = file_name
            .nfkd()
            .filter(char::is_ascii)
            .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
            .collect();
        let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
        let cleaned: String = joined
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
            .collect();
        cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
    }

    pub fn extract_file_extension(file_name: &str) -> Option<String> {
        let (_, ext) = file_name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }

    /// Sanitized name for an uploaded file, or the reason it is refused.
    pub fn validate_filename(file_name: &str) -> Result<String, UploadError> {
        if file_name.is_empty() {
            return Err(UploadError::EmptyFilename);
        }
        let sanitized = Self::sanitize_filename(file_name);
        match Self::extract_file_extension(&sanitized) {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(sanitized),
            _ => Err(UploadError::InvalidFormat),
        }
    }

    pub fn generate_file_name(sanitized: &str) -> String {
        let unique = Uuid::new_v4().simple().to_string();
        format!(
            "{}_{}_{}",
            Utc::now().format("%Y%m%d%H%M%S%3f"),
            &unique[..8],
            sanitized
        )
    }

    /// Streams `chunks` to a fresh file. The returned guard deletes the file
    /// when dropped, so a failed write leaves nothing behind either.
    pub async fn persist<S, B, E>(
        &self,
        sanitized: &str,
        chunks: S,
    ) -> Result<TransientUpload, UploadError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        let file_name = Self::generate_file_name(sanitized);
        let mut upload = TransientUpload::new(self.dir.join(&file_name), file_name);
        log::info!("Saving video as: {}", upload.file_name());

        let mut file = tokio::fs::File::create(upload.path()).await?;
        let mut chunks = std::pin::pin!(chunks);
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| UploadError::Stream(e.to_string()))?;
            let bytes = chunk.as_ref();
            upload.size += bytes.len() as u64;
            if upload.size > self.max_bytes {
                return Err(UploadError::FileTooLarge(self.max_bytes / (1024 * 1024)));
            }
            file.write_all(bytes).await?;
        }
        file.flush().await?;

        log::info!(
            "File size: {:.2} MB",
            upload.size as f64 / (1024.0 * 1024.0)
        );
        Ok(upload)
    }
}

/// An uploaded file on disk, removed on [`TransientUpload::remove`] or drop.
#[derive(Debug)]
pub struct TransientUpload {
    path: PathBuf,
    file_name: String,
    size: u64,
    removed: bool,
}

impl TransientUpload {
    fn new(path: PathBuf, file_name: String) -> Self {
        Self {
            path,
            file_name,
            size: 0,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn remove(mut self) -> std::io::Result<()> {
        log::info!("Cleaning up temporary file: {}", self.file_name);
        self.removed = true;
        std::fs::remove_file(&self.path)
    }
}

impl Drop for TransientUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed abandoned upload {}", self.file_name),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::error!("Failed to remove upload {}: {}", self.file_name, e),
        }
    }
}
