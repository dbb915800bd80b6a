//! About page.

use async_trait::async_trait;
use folio_core::{Collection, SettingKey, SiteSetting, SiteSettings, SocialLink};

use super::Binding;
use crate::client::SiteClient;
use crate::error::StoreError;
use crate::store::{Filter, Query};

/// Artist bio and social links, read from site settings.
pub struct AboutBinding {
    client: SiteClient,
    settings: SiteSettings,
}

impl AboutBinding {
    #[must_use]
    pub fn new(client: &SiteClient) -> Self {
        Self {
            client: client.clone(),
            settings: SiteSettings::default(),
        }
    }

    #[must_use]
    pub fn artist_name(&self) -> &str {
        &self.settings.artist_name
    }

    #[must_use]
    pub fn about_text(&self) -> &str {
        &self.settings.about_text
    }

    /// Configured links, Instagram, Twitter, YouTube then Spotify.
    #[must_use]
    pub fn social_links(&self) -> Vec<SocialLink> {
        self.settings.social_links()
    }
}

#[async_trait]
impl Binding for AboutBinding {
    fn name(&self) -> &'static str {
        "about"
    }

    fn watches(&self) -> &'static [Collection] {
        &[]
    }

    async fn refresh(&mut self) -> Result<(), StoreError> {
        let keys = SettingKey::ALL.map(SettingKey::as_str);
        let rows = self
            .client
            .table::<SiteSetting>()
            .fetch(&Query::new().filter(Filter::is_in("key", keys)))
            .await?;
        self.settings = SiteSettings::from_rows(rows);
        Ok(())
    }
}
