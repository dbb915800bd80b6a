//! Site-wide settings.
//!
//! The store keeps settings as free-form key/value rows. The site reads them
//! through [`SiteSettings`], a fixed-shape record built by folding the rows
//! over named defaults. Unknown keys are ignored and blank values fall back
//! to the default for their key.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Entity;
use crate::types::Collection;

/// Artist name shown when none is configured.
pub const DEFAULT_ARTIST_NAME: &str = "Winxel ( Yna )*";
/// About text shown when none is configured.
pub const DEFAULT_ABOUT_TEXT: &str = "Artist, Creator, Dreamer";
/// Social links are hidden when unset.
pub const DEFAULT_SOCIAL_URL: &str = "";

/// A recognized settings key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    ArtistName,
    AboutText,
    SocialInstagram,
    SocialTwitter,
    SocialYoutube,
    SocialSpotify,
}

impl SettingKey {
    /// Every recognized key, in save order.
    pub const ALL: [Self; 6] = [
        Self::ArtistName,
        Self::AboutText,
        Self::SocialInstagram,
        Self::SocialTwitter,
        Self::SocialYoutube,
        Self::SocialSpotify,
    ];

    /// Key as stored in the `key` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ArtistName => "artist_name",
            Self::AboutText => "about_text",
            Self::SocialInstagram => "social_instagram",
            Self::SocialTwitter => "social_twitter",
            Self::SocialYoutube => "social_youtube",
            Self::SocialSpotify => "social_spotify",
        }
    }

    /// Fallback used when the key is missing or blank.
    #[must_use]
    pub const fn default_value(self) -> &'static str {
        match self {
            Self::ArtistName => DEFAULT_ARTIST_NAME,
            Self::AboutText => DEFAULT_ABOUT_TEXT,
            Self::SocialInstagram
            | Self::SocialTwitter
            | Self::SocialYoutube
            | Self::SocialSpotify => DEFAULT_SOCIAL_URL,
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unrecognized settings key.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown setting '{0}'")]
pub struct UnknownSettingKey(pub String);

impl FromStr for SettingKey {
    type Err = UnknownSettingKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownSettingKey(s.to_owned()))
    }
}

/// One key/value row. Also the upsert payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSetting {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl Entity for SiteSetting {
    const COLLECTION: Collection = Collection::SiteSettings;
}

/// Social platforms linked from the about page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocialPlatform {
    Instagram,
    Twitter,
    YouTube,
    Spotify,
}

impl SocialPlatform {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Instagram => "Instagram",
            Self::Twitter => "Twitter",
            Self::YouTube => "YouTube",
            Self::Spotify => "Spotify",
        }
    }
}

/// A configured social link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialLink {
    pub platform: SocialPlatform,
    pub url: String,
}

/// The fixed-shape view of all site settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    pub artist_name: String,
    pub about_text: String,
    pub social_instagram: String,
    pub social_twitter: String,
    pub social_youtube: String,
    pub social_spotify: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            artist_name: DEFAULT_ARTIST_NAME.to_owned(),
            about_text: DEFAULT_ABOUT_TEXT.to_owned(),
            social_instagram: DEFAULT_SOCIAL_URL.to_owned(),
            social_twitter: DEFAULT_SOCIAL_URL.to_owned(),
            social_youtube: DEFAULT_SOCIAL_URL.to_owned(),
            social_spotify: DEFAULT_SOCIAL_URL.to_owned(),
        }
    }
}

impl SiteSettings {
    /// Fold key/value rows over the defaults.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = SiteSetting>,
    {
        rows.into_iter().fold(Self::default(), |mut settings, row| {
            let Ok(key) = row.key.parse::<SettingKey>() else {
                return settings;
            };
            match row.value {
                Some(value) if !value.trim().is_empty() => settings.set(key, value),
                _ => settings.set(key, key.default_value().to_owned()),
            }
            settings
        })
    }

    /// Current value for `key`.
    #[must_use]
    pub fn get(&self, key: SettingKey) -> &str {
        match key {
            SettingKey::ArtistName => &self.artist_name,
            SettingKey::AboutText => &self.about_text,
            SettingKey::SocialInstagram => &self.social_instagram,
            SettingKey::SocialTwitter => &self.social_twitter,
            SettingKey::SocialYoutube => &self.social_youtube,
            SettingKey::SocialSpotify => &self.social_spotify,
        }
    }

    /// Replace the value for `key`.
    pub fn set(&mut self, key: SettingKey, value: String) {
        let slot = match key {
            SettingKey::ArtistName => &mut self.artist_name,
            SettingKey::AboutText => &mut self.about_text,
            SettingKey::SocialInstagram => &mut self.social_instagram,
            SettingKey::SocialTwitter => &mut self.social_twitter,
            SettingKey::SocialYoutube => &mut self.social_youtube,
            SettingKey::SocialSpotify => &mut self.social_spotify,
        };
        *slot = value;
    }

    /// All keys with their values, in save order.
    #[must_use]
    pub fn entries(&self) -> [(SettingKey, &str); 6] {
        SettingKey::ALL.map(|key| (key, self.get(key)))
    }

    /// Upsert payloads, one per key, in save order.
    #[must_use]
    pub fn to_rows(&self) -> Vec<SiteSetting> {
        self.entries()
            .into_iter()
            .map(|(key, value)| SiteSetting {
                key: key.as_str().to_owned(),
                value: Some(value.to_owned()),
            })
            .collect()
    }

    /// Non-empty social links in display order.
    #[must_use]
    pub fn social_links(&self) -> Vec<SocialLink> {
        [
            (SocialPlatform::Instagram, &self.social_instagram),
            (SocialPlatform::Twitter, &self.social_twitter),
            (SocialPlatform::YouTube, &self.social_youtube),
            (SocialPlatform::Spotify, &self.social_spotify),
        ]
        .into_iter()
        .filter(|(_, url)| !url.trim().is_empty())
        .map(|(platform, url)| SocialLink {
            platform,
            url: url.clone(),
        })
        .collect()
    }
}
