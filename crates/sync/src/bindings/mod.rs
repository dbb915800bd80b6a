//! View bindings.
//!
//! A binding is the controller behind one screen. It holds the last
//! snapshot fetched for that screen, derives filtered views from it without
//! re-querying, and runs the screen's mutations. Every mutation follows one
//! pattern:
//!
//! - validate input, before any remote call
//! - make the remote call(s)
//! - on success, notify and [`Binding::reload`] the snapshot
//! - on failure, notify and leave the snapshot as it was
//!
//! Wrap a binding in [`LiveView`](crate::live::LiveView) to keep it
//! refreshed as the content store changes.

pub mod about;
pub mod admin;
pub mod contact;
pub mod hero;
pub mod news;
pub mod portfolio;

use async_trait::async_trait;
use folio_core::{Bucket, Collection, EmailError};
use thiserror::Error;
use tracing::warn;

use crate::blob::{object_name_from_url, random_object_name};
use crate::client::SiteClient;
use crate::error::StoreError;

pub use about::AboutBinding;
pub use contact::{ContactDraft, ContactForm};
pub use hero::{Carousel, HERO_ROTATION_INTERVAL, HeroBinding};
pub use news::{NEWS_FEED_LIMIT, NewsBinding};
pub use portfolio::{ALL_CATEGORIES, PortfolioBinding};

/// Controller for one screen.
#[async_trait]
pub trait Binding: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Collections whose changes invalidate the snapshot.
    fn watches(&self) -> &'static [Collection];

    /// Re-run the screen's queries and replace the snapshot wholesale.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the previous snapshot is kept.
    async fn refresh(&mut self) -> Result<(), StoreError>;

    /// Refresh, logging a failure instead of returning it.
    async fn reload(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!(view = self.name(), error = %e, "Refresh failed, keeping previous snapshot");
        }
    }
}

/// What an action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    /// The remote call succeeded and the snapshot was refreshed.
    Applied,
    /// Input was invalid; nothing was sent.
    Rejected,
    /// A remote call failed.
    Failed,
    /// The user declined the confirmation prompt.
    Declined,
}

impl Outcome {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Input problems caught before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("Please enter a valid email: {0}")]
    Email(#[from] EmailError),
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// An uploaded object and the URL it is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Published {
    pub name: String,
    pub url: String,
}

/// Store `upload` under a fresh name and resolve its public URL.
pub(crate) async fn publish(
    client: &SiteClient,
    bucket: Bucket,
    upload: Upload,
) -> Result<Published, StoreError> {
    let name = random_object_name(&upload.file_name);
    let stored = client.blobs().upload(bucket, &name, upload.bytes).await?;
    let url = client.blobs().public_url(bucket, &stored.name);
    Ok(Published {
        name: stored.name,
        url,
    })
}

/// Remove objects uploaded for a write that did not land.
pub(crate) async fn discard(client: &SiteClient, bucket: Bucket, names: Vec<String>) {
    if names.is_empty() {
        return;
    }
    if let Err(e) = client.blobs().remove(bucket, &names).await {
        warn!(%bucket, ?names, error = %e, "Could not remove orphaned upload");
    }
}

/// Remove the objects behind `urls` that live in `bucket`. Failures are
/// logged; the caller goes on to delete the row regardless.
pub(crate) async fn remove_media(client: &SiteClient, bucket: Bucket, urls: &[&str]) {
    let prefix = client.blobs().public_url(bucket, "");
    let mut names: Vec<String> = urls
        .iter()
        .filter(|url| url.starts_with(&prefix))
        .filter_map(|url| object_name_from_url(url))
        .collect();
    names.dedup();
    if names.is_empty() {
        return;
    }
    if let Err(e) = client.blobs().remove(bucket, &names).await {
        warn!(%bucket, ?names, error = %e, "Could not remove media, deleting row anyway");
    }
}

/// Report the result of an action's remote call(s) and refresh on success.
pub(crate) async fn settle<B: Binding>(
    binding: &mut B,
    client: &SiteClient,
    result: Result<(), StoreError>,
    success: &str,
    failure: &str,
) -> Outcome {
    match result {
        Ok(()) => {
            client.notifier().success(success);
            binding.reload().await;
            Outcome::Applied
        }
        Err(e) => {
            warn!(view = binding.name(), error = %e, "{failure}");
            client.notifier().error(failure);
            Outcome::Failed
        }
    }
}

/// Trimmed text, or `None` when blank.
pub(crate) fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Trimmed text, or a `Required` error naming `field`.
pub(crate) fn required(text: &str, field: &'static str) -> Result<String, ValidationError> {
    non_blank(text).ok_or(ValidationError::Required(field))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::client::{InMemory, SiteClient};
    use crate::notify::RecordingNotifier;

    /// A client over fresh in-process services.
    pub(crate) fn fixture() -> (SiteClient, InMemory, Arc<RecordingNotifier>) {
        let services = InMemory::new();
        let notices = Arc::new(RecordingNotifier::new());
        let client = SiteClient::new(services.backend(notices.clone()));
        (client, services, notices)
    }
}
