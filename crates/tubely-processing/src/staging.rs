//! Temporary staging of upload bodies.
//!
//! A [`StagedFile`] owns both the open handle and the on-disk path. Dropping it closes the
//! handle and removes the file, so every exit path of a request cleans up, including early
//! returns and cancelled futures.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

const STAGING_PREFIX: &str = "tubely-upload";

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to create staging file: {0}")]
    Create(#[source] io::Error),

    #[error("failed to write staging file: {0}")]
    Write(#[source] io::Error),

    #[error("upload exceeds the maximum size of {max_bytes} bytes")]
    TooLarge { max_bytes: u64 },
}

/// Creates staging files in a scratch directory.
#[derive(Debug, Clone, Default)]
pub struct Stager {
    dir: Option<PathBuf>,
}

impl Stager {
    /// `dir` of `None` uses the system temp directory.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Copy `reader` into a fresh temporary file and rewind it to byte zero.
    ///
    /// At most `max_bytes` are accepted; a longer stream fails with
    /// [`StagingError::TooLarge`] after reading one byte past the limit.
    pub async fn stage<R>(&self, reader: R, max_bytes: u64) -> Result<StagedFile, StagingError>
    where
        R: AsyncRead + Unpin,
    {
        let start = std::time::Instant::now();

        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        let named = match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(StagingError::Create)?;

        let (std_file, path) = named.into_parts();
        let mut file = File::from_std(std_file);

        let mut limited = reader.take(max_bytes.saturating_add(1));
        let len = tokio::io::copy(&mut limited, &mut file)
            .await
            .map_err(StagingError::Write)?;

        if len > max_bytes {
            tracing::debug!(max_bytes, "Upload stream exceeded size limit while staging");
            return Err(StagingError::TooLarge { max_bytes });
        }

        file.flush().await.map_err(StagingError::Write)?;
        file.seek(SeekFrom::Start(0))
            .await
            .map_err(StagingError::Write)?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = len,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload staged"
        );

        Ok(StagedFile { file, path, len })
    }
}

/// Exclusively owned temporary copy of an upload body.
#[derive(Debug)]
pub struct StagedFile {
    // Declared before `path` so the handle is closed before the file is removed.
    file: File,
    path: TempPath,
    len: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read the whole staged payload from the start, then remove the file.
    pub async fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(0)).await?;
        let mut data = Vec::with_capacity(self.len as usize);
        self.file.read_to_end(&mut data).await?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_copies_and_rewinds() {
        let dir = tempfile::tempdir().unwrap();
        let stager = Stager::new(Some(dir.path().to_path_buf()));

        let staged = stager
            .stage(Cursor::new(b"video bytes".to_vec()), 1024)
            .await
            .unwrap();
        assert_eq!(staged.len(), 11);
        assert!(staged.path().exists());
        assert!(staged
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(STAGING_PREFIX));

        let data = staged.into_bytes().await.unwrap();
        assert_eq!(data, b"video bytes");
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let stager = Stager::new(Some(dir.path().to_path_buf()));

        let staged = stager.stage(Cursor::new(vec![1u8; 64]), 64).await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_oversized_stream_is_rejected_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let stager = Stager::new(Some(dir.path().to_path_buf()));

        let result = stager.stage(Cursor::new(vec![0u8; 65]), 64).await;
        assert!(matches!(
            result,
            Err(StagingError::TooLarge { max_bytes: 64 })
        ));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_directory_fails_create() {
        let dir = tempfile::tempdir().unwrap();
        let stager = Stager::new(Some(dir.path().join("does-not-exist")));

        let result = stager.stage(Cursor::new(vec![0u8; 4]), 64).await;
        assert!(matches!(result, Err(StagingError::Create(_))));
    }

    #[tokio::test]
    async fn test_truncated_stream_fails_write() {
        struct Broken;

        impl AsyncRead for Broken {
            fn poll_read(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<io::Result<()>> {
                std::task::Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "client went away",
                )))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let stager = Stager::new(Some(dir.path().to_path_buf()));

        let result = stager.stage(Broken, 64).await;
        assert!(matches!(result, Err(StagingError::Write(_))));
        assert_eq!(entries(dir.path()), 0);
    }
}
