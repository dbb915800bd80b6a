//! Site settings form.

use async_trait::async_trait;
use folio_core::{Collection, SiteSetting, SiteSettings};
use tracing::warn;

use crate::bindings::{Binding, Outcome};
use crate::client::SiteClient;
use crate::error::StoreError;
use crate::store::Query;

const SAVED: &str = "Settings saved successfully!";
const SAVE_FAILED: &str = "Failed to save settings";

/// Settings as stored, and the form being edited.
///
/// A refresh only replaces the form while it has no unsaved edits, so a
/// change notification never discards what the admin typed.
pub struct SettingsAdmin {
    client: SiteClient,
    saved: SiteSettings,
    pub form: SiteSettings,
}

impl SettingsAdmin {
    #[must_use]
    pub fn new(client: &SiteClient) -> Self {
        Self {
            client: client.clone(),
            saved: SiteSettings::default(),
            form: SiteSettings::default(),
        }
    }

    /// Settings as last fetched.
    #[must_use]
    pub const fn saved(&self) -> &SiteSettings {
        &self.saved
    }

    /// Whether the form differs from the stored settings.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.form != self.saved
    }

    /// Drop unsaved edits.
    pub fn discard_edits(&mut self) {
        self.form = self.saved.clone();
    }

    /// Upsert every key in order.
    ///
    /// Stops at the first failure: keys before it stay written, the rest
    /// are not attempted, and the form keeps everything typed.
    pub async fn save(&mut self) -> Outcome {
        let client = self.client.clone();
        let table = client.table::<SiteSetting>();
        for row in self.form.to_rows() {
            if let Err(e) = table.upsert(&row).await {
                warn!(key = %row.key, error = %e, "Failed to save setting");
                client.notifier().error(format!("{SAVE_FAILED}: {e}"));
                return Outcome::Failed;
            }
        }

        self.saved = self.form.clone();
        client.notifier().success(SAVED);
        self.reload().await;
        Outcome::Applied
    }
}

#[async_trait]
impl Binding for SettingsAdmin {
    fn name(&self) -> &'static str {
        "admin-settings"
    }

    fn watches(&self) -> &'static [Collection] {
        &[]
    }

    async fn refresh(&mut self) -> Result<(), StoreError> {
        let rows = self.client.table::<SiteSetting>().fetch(&Query::new()).await?;
        let fetched = SiteSettings::from_rows(rows);
        if !self.is_dirty() {
            self.form = fetched.clone();
        }
        self.saved = fetched;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use folio_core::SettingKey;

    use super::*;
    use crate::bindings::testing::fixture;

    #[tokio::test]
    async fn test_save_writes_every_key() {
        let (client, services, notices) = fixture();
        let mut admin = SettingsAdmin::new(&client);
        admin.refresh().await.unwrap();
        admin.form.set(SettingKey::ArtistName, "Yna".to_owned());
        assert!(admin.is_dirty());

        assert_eq!(admin.save().await, Outcome::Applied);
        assert!(!admin.is_dirty());
        assert_eq!(admin.saved().artist_name, "Yna");
        assert_eq!(services.store.len(Collection::SiteSettings), SettingKey::ALL.len());
        assert_eq!(notices.last().unwrap().message, SAVED);
    }

    #[tokio::test]
    async fn test_refresh_keeps_unsaved_edits() {
        let (client, _services, _notices) = fixture();
        let mut admin = SettingsAdmin::new(&client);
        admin.form.set(SettingKey::AboutText, "Draft bio".to_owned());

        client
            .table::<SiteSetting>()
            .upsert(&SiteSetting {
                key: "artist_name".to_owned(),
                value: Some("Elsewhere".to_owned()),
            })
            .await
            .unwrap();
        admin.refresh().await.unwrap();

        assert_eq!(admin.form.about_text, "Draft bio");
        assert_eq!(admin.saved().artist_name, "Elsewhere");

        admin.discard_edits();
        assert_eq!(admin.form.artist_name, "Elsewhere");
    }
}
