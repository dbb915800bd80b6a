//! Hero image management.

use async_trait::async_trait;
use folio_core::{Bucket, Collection, HeroImage, HeroImageId, NewHeroImage};
use serde_json::json;
use tracing::{info, warn};

use crate::bindings::{Binding, Outcome, Upload, discard, non_blank, publish, remove_media, settle};
use crate::client::SiteClient;
use crate::error::StoreError;
use crate::store::{Direction, Query};

/// Asked before an image is deleted.
pub const DELETE_IMAGE_PROMPT: &str = "Are you sure you want to delete this image?";

/// Caption typed alongside an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeroDraft {
    pub title: String,
    pub subtitle: String,
}

/// Every hero image, active or not.
pub struct HeroAdmin {
    client: SiteClient,
    images: Vec<HeroImage>,
    pub draft: HeroDraft,
}

impl HeroAdmin {
    #[must_use]
    pub fn new(client: &SiteClient) -> Self {
        Self {
            client: client.clone(),
            images: Vec::new(),
            draft: HeroDraft::default(),
        }
    }

    #[must_use]
    pub fn images(&self) -> &[HeroImage] {
        &self.images
    }

    fn find(&self, id: HeroImageId) -> Option<&HeroImage> {
        self.images.iter().find(|image| image.id == id)
    }

    /// Upload an image and append it to the carousel with the draft caption.
    ///
    /// If the row cannot be written the uploaded file is removed again.
    pub async fn upload(&mut self, file: Upload) -> Outcome {
        let client = self.client.clone();
        if file.bytes.is_empty() {
            client.notifier().error("Please choose an image to upload");
            return Outcome::Rejected;
        }

        let published = match publish(&client, Bucket::HeroImages, file).await {
            Ok(published) => published,
            Err(e) => {
                warn!(error = %e, "Hero upload failed");
                client.notifier().error("Failed to upload image");
                return Outcome::Failed;
            }
        };

        let payload = NewHeroImage {
            image_url: published.url,
            title: non_blank(&self.draft.title),
            subtitle: non_blank(&self.draft.subtitle),
            display_order: i32::try_from(self.images.len()).unwrap_or(i32::MAX),
            is_active: None,
        };
        let result = client.table::<HeroImage>().insert(&payload).await;
        if let Err(e) = &result {
            warn!(error = %e, object = %published.name, "Hero row insert failed, removing upload");
            discard(&client, Bucket::HeroImages, vec![published.name]).await;
        } else {
            info!(object = %published.name, "Hero image uploaded");
            self.draft = HeroDraft::default();
        }

        settle(
            self,
            &client,
            result.map(drop),
            "Hero image uploaded successfully!",
            "Failed to upload image",
        )
        .await
    }

    /// Show or hide an image in the public carousel.
    pub async fn toggle_active(&mut self, id: HeroImageId) -> Outcome {
        let client = self.client.clone();
        let result = match self.find(id) {
            Some(image) => {
                client
                    .table::<HeroImage>()
                    .update(id, &json!({ "is_active": !image.is_active }))
                    .await
            }
            None => Err(StoreError::NotFound(format!("hero image {id}"))),
        };
        settle(self, &client, result, "Status updated", "Failed to update status").await
    }

    /// Delete an image file, then its row.
    pub async fn delete(&mut self, id: HeroImageId, confirm: impl FnOnce(&str) -> bool) -> Outcome {
        if !confirm(DELETE_IMAGE_PROMPT) {
            return Outcome::Declined;
        }
        let client = self.client.clone();
        let result = match self.find(id).map(|image| image.image_url.clone()) {
            Some(url) => {
                remove_media(&client, Bucket::HeroImages, &[&url]).await;
                let deleted = client.table::<HeroImage>().delete(id).await;
                if deleted.is_err() {
                    warn!(image = %id, url = %url, "Row delete failed after its file was removed");
                }
                deleted
            }
            None => Err(StoreError::NotFound(format!("hero image {id}"))),
        };
        settle(self, &client, result, "Image deleted", "Failed to delete").await
    }
}

#[async_trait]
impl Binding for HeroAdmin {
    fn name(&self) -> &'static str {
        "admin-hero"
    }

    fn watches(&self) -> &'static [Collection] {
        &[Collection::HeroImages]
    }

    async fn refresh(&mut self) -> Result<(), StoreError> {
        self.images = self
            .client
            .table::<HeroImage>()
            .fetch(&Query::new().order_by("display_order", Direction::Ascending))
            .await?;
        Ok(())
    }
}
