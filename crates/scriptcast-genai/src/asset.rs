//! Locally materialized video assets.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::error::GenAiResult;

/// Handle to a downloaded video stored in a local temporary file.
///
/// The caller owns the file until [`release`](Self::release) or
/// [`persist`](Self::persist) is called. An unreleased handle removes its
/// file when dropped.
#[derive(Debug)]
pub struct VideoAssetHandle {
    id: Uuid,
    path: TempPath,
    size: u64,
    content_type: Option<String>,
    source_uri: String,
    downloaded_at: DateTime<Utc>,
}

impl VideoAssetHandle {
    /// Stream a successful download response into a new temporary file.
    pub(crate) async fn from_response(
        mut response: reqwest::Response,
        source_uri: &str,
    ) -> GenAiResult<Self> {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let (file, path) = new_temp_file()?.into_parts();
        let mut out = tokio::fs::File::from_std(file);

        let mut size = 0u64;
        while let Some(chunk) = response.chunk().await? {
            out.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        out.flush().await?;

        let handle = Self {
            id: Uuid::new_v4(),
            path,
            size,
            content_type,
            source_uri: source_uri.to_string(),
            downloaded_at: Utc::now(),
        };
        debug!(asset = %handle.id, size, "Video asset written to {}", handle.path().display());
        Ok(handle)
    }

    /// Materialize an in-memory payload.
    pub fn from_bytes(
        bytes: &[u8],
        source_uri: impl Into<String>,
        content_type: Option<String>,
    ) -> GenAiResult<Self> {
        let (mut file, path) = new_temp_file()?.into_parts();
        file.write_all(bytes)?;
        file.flush()?;

        Ok(Self {
            id: Uuid::new_v4(),
            path,
            size: bytes.len() as u64,
            content_type,
            source_uri: source_uri.into(),
            downloaded_at: Utc::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Local path of the asset; valid until the handle is released.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Content type reported by the server, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// URI the asset was fetched from (without credentials).
    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    pub fn downloaded_at(&self) -> DateTime<Utc> {
        self.downloaded_at
    }

    /// Read the whole payload into memory.
    pub async fn read_bytes(&self) -> GenAiResult<Vec<u8>> {
        Ok(tokio::fs::read(self.path()).await?)
    }

    /// Move the asset to `dest`, consuming the handle.
    ///
    /// Falls back to copy-and-delete when a rename is not possible
    /// (e.g. the destination is on another filesystem).
    pub fn persist(self, dest: impl AsRef<Path>) -> GenAiResult<PathBuf> {
        let dest = dest.as_ref().to_path_buf();
        match self.path.persist(&dest) {
            Ok(()) => Ok(dest),
            Err(e) => {
                std::fs::copy(&e.path, &dest)?;
                e.path.close()?;
                Ok(dest)
            }
        }
    }

    /// Delete the local file.
    pub fn release(self) -> GenAiResult<()> {
        debug!(asset = %self.id, "Releasing video asset");
        self.path.close()?;
        Ok(())
    }
}

fn new_temp_file() -> std::io::Result<tempfile::NamedTempFile> {
    tempfile::Builder::new()
        .prefix("scriptcast-")
        .suffix(".mp4")
        .tempfile()
}
