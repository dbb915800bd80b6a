//! Bucket storage for uploaded media.
//!
//! Objects are addressed by bucket and flat object name. Names are generated
//! by [`random_object_name`] on upload, and recovered from a stored public
//! URL by [`object_name_from_url`] when the owning row is deleted.

mod fs;
mod memory;

use async_trait::async_trait;
use folio_core::Bucket;
use uuid::Uuid;

use crate::error::StoreError;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

/// An object written by [`BlobStore::upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: Bucket,
    pub name: String,
    pub size: u64,
}

/// Remote blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` as `name`. Fails if the name is taken.
    async fn upload(&self, bucket: Bucket, name: &str, bytes: Vec<u8>) -> Result<StoredObject, StoreError>;

    /// Public URL an object is served from. Pure; the object need not exist.
    fn public_url(&self, bucket: Bucket, name: &str) -> String;

    /// Remove objects. Names that do not exist are skipped.
    async fn remove(&self, bucket: Bucket, names: &[String]) -> Result<(), StoreError>;
}

/// Fresh object name keeping the uploaded file's extension.
#[must_use]
pub fn random_object_name(file_name: &str) -> String {
    let id = Uuid::new_v4();
    match extension(file_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Lower-cased extension of `file_name`, if it has a usable one.
fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    let valid = !stem.is_empty()
        && !ext.is_empty()
        && ext.len() <= 10
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

/// Object name from a public URL: its last path segment.
#[must_use]
pub fn object_name_from_url(public_url: &str) -> Option<String> {
    let path = url::Url::parse(public_url)
        .map(|u| u.path().to_owned())
        .unwrap_or_else(|_| public_url.to_owned());
    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
}

/// Reject names that could escape their bucket.
pub(crate) fn validate_object_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(StoreError::Unavailable(format!("invalid object name '{name}'")))
    }
}
