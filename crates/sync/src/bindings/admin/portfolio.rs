//! Portfolio management.

use async_trait::async_trait;
use folio_core::{Bucket, Collection, MediaKind, PortfolioItem, PortfolioItemId, PortfolioItemInput};
use serde_json::json;
use tracing::warn;

use crate::bindings::{
    Binding, Outcome, Upload, discard, non_blank, publish, remove_media, required, settle,
};
use crate::client::SiteClient;
use crate::error::StoreError;
use crate::store::{Direction, Query};

/// Asked before an item is deleted.
pub const DELETE_ITEM_PROMPT: &str = "Are you sure you want to delete this item?";

/// The add/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortfolioDraft {
    pub title: String,
    pub description: String,
    pub media_kind: MediaKind,
    pub category: String,
    editing: Option<PortfolioItemId>,
}

impl PortfolioDraft {
    /// Item being edited, or `None` when adding.
    #[must_use]
    pub const fn editing(&self) -> Option<PortfolioItemId> {
        self.editing
    }
}

/// Every portfolio item, published or not.
pub struct PortfolioAdmin {
    client: SiteClient,
    items: Vec<PortfolioItem>,
    pub draft: PortfolioDraft,
}

impl PortfolioAdmin {
    #[must_use]
    pub fn new(client: &SiteClient) -> Self {
        Self {
            client: client.clone(),
            items: Vec::new(),
            draft: PortfolioDraft::default(),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[PortfolioItem] {
        &self.items
    }

    fn find(&self, id: PortfolioItemId) -> Option<&PortfolioItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Load an item into the form for editing. Returns false if it is not
    /// in the snapshot.
    pub fn start_edit(&mut self, id: PortfolioItemId) -> bool {
        let Some(item) = self.find(id) else {
            return false;
        };
        self.draft = PortfolioDraft {
            title: item.title.clone(),
            description: item.description.clone().unwrap_or_default(),
            media_kind: item.media_type,
            category: item.category.clone().unwrap_or_default(),
            editing: Some(id),
        };
        true
    }

    /// Abandon the form.
    pub fn reset_draft(&mut self) {
        self.draft = PortfolioDraft::default();
    }

    /// Upload the media (and thumbnail, if any) and save the form.
    ///
    /// Adding appends the item after the current last one. Editing replaces
    /// every field but keeps the item's position, and removes the files it
    /// replaced. Uploads are removed again if the row cannot be written.
    pub async fn submit(&mut self, media: Upload, thumbnail: Option<Upload>) -> Outcome {
        let client = self.client.clone();
        let title = match required(&self.draft.title, "Title") {
            Ok(title) => title,
            Err(e) => {
                client.notifier().error(e.to_string());
                return Outcome::Rejected;
            }
        };
        if media.bytes.is_empty() {
            client.notifier().error("Please choose a media file to upload");
            return Outcome::Rejected;
        }

        let mut uploaded = Vec::new();
        let media = match publish(&client, Bucket::PortfolioMedia, media).await {
            Ok(media) => media,
            Err(e) => {
                warn!(error = %e, "Portfolio media upload failed");
                client.notifier().error("Failed to upload media");
                return Outcome::Failed;
            }
        };
        uploaded.push(media.name);

        let thumbnail_url = match thumbnail {
            Some(file) => match publish(&client, Bucket::PortfolioMedia, file).await {
                Ok(thumb) => {
                    uploaded.push(thumb.name);
                    thumb.url
                }
                Err(e) => {
                    warn!(error = %e, "Portfolio thumbnail upload failed");
                    discard(&client, Bucket::PortfolioMedia, uploaded).await;
                    client.notifier().error("Failed to upload media");
                    return Outcome::Failed;
                }
            },
            None => media.url.clone(),
        };

        let editing = self.draft.editing;
        let replaced = editing
            .and_then(|id| self.find(id))
            .map(|item| (item.media_url.clone(), item.thumbnail_url.clone()));
        let input = PortfolioItemInput {
            title,
            description: non_blank(&self.draft.description),
            media_url: media.url,
            media_type: self.draft.media_kind,
            thumbnail_url: Some(thumbnail_url),
            category: non_blank(&self.draft.category),
            display_order: editing
                .is_none()
                .then(|| i32::try_from(self.items.len()).unwrap_or(i32::MAX)),
        };

        let table = client.table::<PortfolioItem>();
        let (result, success) = match editing {
            Some(id) => (table.update(id, &input).await, "Item updated!"),
            None => (table.insert(&input).await.map(drop), "Item added!"),
        };
        if result.is_ok() {
            if let Some((old_media, old_thumbnail)) = &replaced {
                let stale: Vec<&str> = std::iter::once(old_media.as_str())
                    .chain(old_thumbnail.as_deref())
                    .filter(|url| {
                        *url != input.media_url && Some(*url) != input.thumbnail_url.as_deref()
                    })
                    .collect();
                remove_media(&client, Bucket::PortfolioMedia, &stale).await;
            }
            self.reset_draft();
        } else {
            discard(&client, Bucket::PortfolioMedia, uploaded).await;
        }
        settle(self, &client, result, success, "Failed to save item").await
    }

    /// Show or hide an item on the public site.
    pub async fn toggle_published(&mut self, id: PortfolioItemId) -> Outcome {
        let client = self.client.clone();
        let result = match self.find(id) {
            Some(item) => {
                client
                    .table::<PortfolioItem>()
                    .update(id, &json!({ "is_published": !item.is_published }))
                    .await
            }
            None => Err(StoreError::NotFound(format!("portfolio item {id}"))),
        };
        settle(self, &client, result, "Status updated", "Failed to update status").await
    }

    /// Delete an item's files, then its row.
    pub async fn delete(&mut self, id: PortfolioItemId, confirm: impl FnOnce(&str) -> bool) -> Outcome {
        if !confirm(DELETE_ITEM_PROMPT) {
            return Outcome::Declined;
        }
        let client = self.client.clone();
        let urls = self
            .find(id)
            .map(|item| (item.media_url.clone(), item.thumbnail_url.clone()));
        let result = match urls {
            Some((media_url, thumbnail_url)) => {
                let mut urls = vec![media_url.as_str()];
                urls.extend(thumbnail_url.as_deref());
                remove_media(&client, Bucket::PortfolioMedia, &urls).await;
                let deleted = client.table::<PortfolioItem>().delete(id).await;
                if deleted.is_err() {
                    warn!(item = %id, media_url = %media_url, "Row delete failed after its files were removed");
                }
                deleted
            }
            None => Err(StoreError::NotFound(format!("portfolio item {id}"))),
        };
        settle(self, &client, result, "Item deleted", "Failed to delete").await
    }
}

#[async_trait]
impl Binding for PortfolioAdmin {
    fn name(&self) -> &'static str {
        "admin-portfolio"
    }

    fn watches(&self) -> &'static [Collection] {
        &[Collection::PortfolioItems]
    }

    async fn refresh(&mut self) -> Result<(), StoreError> {
        self.items = self
            .client
            .table::<PortfolioItem>()
            .fetch(&Query::new().order_by("display_order", Direction::Ascending))
            .await?;
        Ok(())
    }
}
