//! In-process bucket storage.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use folio_core::Bucket;

use super::{BlobStore, StoredObject, validate_object_name};
use crate::error::StoreError;

/// Base of the URLs handed out by [`MemoryBlobStore`].
pub const MEMORY_PUBLIC_BASE: &str = "memory://storage";

/// Blob storage held in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<(Bucket, String), Vec<u8>>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `bucket` holds `name`.
    #[must_use]
    pub fn contains(&self, bucket: Bucket, name: &str) -> bool {
        self.objects
            .read()
            .is_ok_and(|o| o.contains_key(&(bucket, name.to_owned())))
    }

    /// Object names in `bucket`, sorted.
    #[must_use]
    pub fn names(&self, bucket: Bucket) -> Vec<String> {
        let mut names: Vec<String> = self.objects.read().map_or_else(
            |_| Vec::new(),
            |o| {
                o.keys()
                    .filter(|(b, _)| *b == bucket)
                    .map(|(_, n)| n.clone())
                    .collect()
            },
        );
        names.sort();
        names
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("blob store lock poisoned".to_owned())
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, bucket: Bucket, name: &str, bytes: Vec<u8>) -> Result<StoredObject, StoreError> {
        validate_object_name(name)?;
        let mut objects = self.objects.write().map_err(|_| poisoned())?;
        let key = (bucket, name.to_owned());
        if objects.contains_key(&key) {
            return Err(StoreError::Conflict(format!("{bucket}/{name} already exists")));
        }
        let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        objects.insert(key, bytes);
        Ok(StoredObject {
            bucket,
            name: name.to_owned(),
            size,
        })
    }

    fn public_url(&self, bucket: Bucket, name: &str) -> String {
        format!("{MEMORY_PUBLIC_BASE}/{bucket}/{name}")
    }

    async fn remove(&self, bucket: Bucket, names: &[String]) -> Result<(), StoreError> {
        let mut objects = self.objects.write().map_err(|_| poisoned())?;
        for name in names {
            objects.remove(&(bucket, name.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::blob::object_name_from_url;

    #[tokio::test]
    async fn test_public_url_names_the_object() {
        let blobs = MemoryBlobStore::new();
        blobs.upload(Bucket::HeroImages, "a.jpg", vec![7]).await.unwrap();

        let url = blobs.public_url(Bucket::HeroImages, "a.jpg");
        assert_eq!(object_name_from_url(&url).as_deref(), Some("a.jpg"));
        assert!(blobs.contains(Bucket::HeroImages, "a.jpg"));
        assert!(!blobs.contains(Bucket::PortfolioMedia, "a.jpg"));
    }

    #[tokio::test]
    async fn test_remove_skips_missing() {
        let blobs = MemoryBlobStore::new();
        blobs.upload(Bucket::PortfolioMedia, "b.mp3", vec![]).await.unwrap();
        blobs
            .remove(Bucket::PortfolioMedia, &["b.mp3".to_owned(), "c.mp3".to_owned()])
            .await
            .unwrap();
        assert!(blobs.names(Bucket::PortfolioMedia).is_empty());
    }
}
