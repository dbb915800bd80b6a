//! Filesystem bucket storage.
//!
//! Each bucket is a directory under the media root. Public URLs are
//! `{public_base}/{bucket}/{name}`, for whatever server exposes that root.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use folio_core::Bucket;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{BlobStore, StoredObject, validate_object_name};
use crate::error::StoreError;

/// Bucket storage in a local directory tree.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base: Url,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base: Url) -> Self {
        Self {
            root: root.into(),
            public_base,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: Bucket) -> PathBuf {
        self.root.join(bucket.name())
    }
}

/// Write `bytes` to `out`, removing the file at `path` if the write fails.
async fn write_or_discard<W>(path: &Path, mut out: W, bytes: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        out.write_all(bytes).await?;
        out.flush().await
    }
    .await;
    if let Err(e) = written {
        drop(out);
        if let Err(cleanup) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %cleanup, "Could not remove partial object");
        }
        return Err(e);
    }
    Ok(())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    #[instrument(skip(self, bytes), fields(bucket = %bucket, size = bytes.len()))]
    async fn upload(&self, bucket: Bucket, name: &str, bytes: Vec<u8>) -> Result<StoredObject, StoreError> {
        validate_object_name(name)?;
        let dir = self.bucket_dir(bucket);
        fs::create_dir_all(&dir).await?;

        let path = dir.join(name);
        let file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::Conflict(format!("{bucket}/{name} already exists")));
            }
            Err(e) => return Err(e.into()),
        };
        write_or_discard(&path, file, &bytes).await?;

        debug!(name, "Stored object");
        Ok(StoredObject {
            bucket,
            name: name.to_owned(),
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
        })
    }

    fn public_url(&self, bucket: Bucket, name: &str) -> String {
        format!(
            "{}/{bucket}/{name}",
            self.public_base.as_str().trim_end_matches('/')
        )
    }

    #[instrument(skip(self), fields(bucket = %bucket))]
    async fn remove(&self, bucket: Bucket, names: &[String]) -> Result<(), StoreError> {
        let dir = self.bucket_dir(bucket);
        for name in names {
            validate_object_name(name)?;
            match fs::remove_file(dir.join(name)).await {
                Ok(()) => debug!(name, "Removed object"),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(name, "Object already absent");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use super::*;

    /// A writer whose every write fails.
    struct DiskFull;

    impl AsyncWrite for DiskFull {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::other("no space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn store(dir: &tempfile::TempDir) -> FsBlobStore {
        FsBlobStore::new(
            dir.path(),
            Url::parse("https://media.winxel.test/storage/").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_upload_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = store(&dir);

        let object = blobs
            .upload(Bucket::HeroImages, "a.png", vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(object.size, 3);
        let path = dir.path().join("hero-images").join("a.png");
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);

        blobs
            .remove(Bucket::HeroImages, &["a.png".to_owned(), "missing.png".to_owned()])
            .await
            .unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_upload_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = store(&dir);
        blobs.upload(Bucket::PortfolioMedia, "x.mp4", vec![0]).await.unwrap();
        let err = blobs
            .upload(Bucket::PortfolioMedia, "x.mp4", vec![1])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_upload_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = store(&dir);
        assert!(blobs.upload(Bucket::HeroImages, "../x", vec![]).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_partial_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("half.png");
        std::fs::write(&path, [1]).unwrap();

        let err = write_or_discard(&path, DiskFull, &[1, 2, 3]).await.unwrap_err();
        assert_eq!(err.to_string(), "no space left on device");
        assert!(!path.exists());
    }

    #[test]
    fn test_public_url() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            store(&dir).public_url(Bucket::PortfolioMedia, "b.mp3"),
            "https://media.winxel.test/storage/portfolio-media/b.mp3"
        );
    }
}
