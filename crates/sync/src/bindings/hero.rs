//! Landing page hero carousel.

use std::time::Duration;

use async_trait::async_trait;
use folio_core::{Collection, HeroImage, SettingKey, SiteSetting, SiteSettings};

use super::Binding;
use crate::client::SiteClient;
use crate::error::StoreError;
use crate::store::{Direction, Filter, Query};

/// How often the carousel moves to the next image.
pub const HERO_ROTATION_INTERVAL: Duration = Duration::from_secs(5);

/// Position within a rotating set of slides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Carousel {
    index: usize,
    len: usize,
}

impl Carousel {
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether there is anything to rotate through.
    #[must_use]
    pub const fn rotates(&self) -> bool {
        self.len > 1
    }

    /// Track a new slide count. Any change restarts from the first slide.
    pub const fn resize(&mut self, len: usize) {
        if len != self.len {
            self.len = len;
            self.index = 0;
        }
    }

    /// Move to the next slide, wrapping. Returns whether the index moved.
    pub const fn advance(&mut self) -> bool {
        if !self.rotates() {
            return false;
        }
        self.index = (self.index + 1) % self.len;
        true
    }
}

/// Active hero images and the artist name shown over them.
pub struct HeroBinding {
    client: SiteClient,
    images: Vec<HeroImage>,
    artist_name: String,
    carousel: Carousel,
}

impl HeroBinding {
    #[must_use]
    pub fn new(client: &SiteClient) -> Self {
        Self {
            client: client.clone(),
            images: Vec::new(),
            artist_name: SettingKey::ArtistName.default_value().to_owned(),
            carousel: Carousel::default(),
        }
    }

    /// Active images in display order.
    #[must_use]
    pub fn images(&self) -> &[HeroImage] {
        &self.images
    }

    #[must_use]
    pub fn artist_name(&self) -> &str {
        &self.artist_name
    }

    #[must_use]
    pub const fn carousel(&self) -> Carousel {
        self.carousel
    }

    /// Image currently on screen.
    #[must_use]
    pub fn current(&self) -> Option<&HeroImage> {
        self.images.get(self.carousel.index())
    }

    /// Rotation timer fired. Returns whether the current image changed.
    pub const fn tick(&mut self) -> bool {
        self.carousel.advance()
    }
}

#[async_trait]
impl Binding for HeroBinding {
    fn name(&self) -> &'static str {
        "hero"
    }

    fn watches(&self) -> &'static [Collection] {
        &[Collection::HeroImages]
    }

    async fn refresh(&mut self) -> Result<(), StoreError> {
        let images = self
            .client
            .table::<HeroImage>()
            .fetch(
                &Query::new()
                    .filter(Filter::eq("is_active", true))
                    .order_by("display_order", Direction::Ascending),
            )
            .await?;
        let settings = self
            .client
            .table::<SiteSetting>()
            .fetch(&Query::new().filter(Filter::eq("key", SettingKey::ArtistName.as_str())))
            .await?;

        self.artist_name = SiteSettings::from_rows(settings).artist_name;
        self.carousel.resize(images.len());
        self.images = images;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use folio_core::NewHeroImage;
    use serde_json::json;

    use super::*;
    use crate::bindings::testing::fixture;

    fn slide(url: &str, order: i32, active: bool) -> NewHeroImage {
        NewHeroImage {
            image_url: url.to_owned(),
            title: None,
            subtitle: None,
            display_order: order,
            is_active: Some(active),
        }
    }

    #[test]
    fn test_single_slide_does_not_rotate() {
        let mut carousel = Carousel::default();
        carousel.resize(1);
        assert!(!carousel.advance());
        assert_eq!(carousel.index(), 0);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut carousel = Carousel::default();
        carousel.resize(3);
        assert!(carousel.advance());
        assert!(carousel.advance());
        assert_eq!(carousel.index(), 2);
        assert!(carousel.advance());
        assert_eq!(carousel.index(), 0);
    }

    #[test]
    fn test_resize_resets_index() {
        let mut carousel = Carousel::default();
        carousel.resize(3);
        let _ = carousel.advance();
        carousel.resize(3);
        assert_eq!(carousel.index(), 1);
        carousel.resize(2);
        assert_eq!(carousel.index(), 0);
    }

    #[tokio::test]
    async fn test_refresh_keeps_active_images_in_order() {
        let (client, _services, _notices) = fixture();
        let heroes = client.table::<HeroImage>();
        heroes.insert(&slide("memory://storage/hero-images/b.png", 2, true)).await.unwrap();
        heroes.insert(&slide("memory://storage/hero-images/hidden.png", 0, false)).await.unwrap();
        heroes.insert(&slide("memory://storage/hero-images/a.png", 1, true)).await.unwrap();

        let mut hero = HeroBinding::new(&client);
        hero.refresh().await.unwrap();

        let urls: Vec<&str> = hero.images().iter().map(|i| i.image_url.as_str()).collect();
        assert_eq!(
            urls,
            ["memory://storage/hero-images/a.png", "memory://storage/hero-images/b.png"]
        );
        assert_eq!(hero.artist_name(), "Winxel ( Yna )*");
        assert_eq!(hero.carousel().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_reads_artist_name() {
        let (client, _services, _notices) = fixture();
        client
            .table::<SiteSetting>()
            .upsert(&json!({"key": "artist_name", "value": "Yna"}))
            .await
            .unwrap();

        let mut hero = HeroBinding::new(&client);
        hero.refresh().await.unwrap();
        assert_eq!(hero.artist_name(), "Yna");
        assert!(hero.current().is_none());
    }
}
