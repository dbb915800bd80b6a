//! Names of the remote collections and storage buckets.
//!
//! Column lists double as an allowlist: store adapters refuse any filter,
//! ordering or payload field that is not listed here before it reaches the
//! database.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A named set of structured records in the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    HeroImages,
    PortfolioItems,
    NewsPosts,
    ContactSubmissions,
    SiteSettings,
}

impl Collection {
    /// Every collection the site uses.
    pub const ALL: [Self; 5] = [
        Self::HeroImages,
        Self::PortfolioItems,
        Self::NewsPosts,
        Self::ContactSubmissions,
        Self::SiteSettings,
    ];

    /// Collections with live change subscriptions.
    pub const WATCHED: [Self; 4] = [
        Self::HeroImages,
        Self::PortfolioItems,
        Self::NewsPosts,
        Self::ContactSubmissions,
    ];

    /// Table name in the content store.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::HeroImages => "hero_images",
            Self::PortfolioItems => "portfolio_items",
            Self::NewsPosts => "news_posts",
            Self::ContactSubmissions => "contact_submissions",
            Self::SiteSettings => "site_settings",
        }
    }

    /// Look up a collection by its table name.
    #[must_use]
    pub fn from_table_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.table_name() == name)
    }

    /// Column names, in table order.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::HeroImages => &[
                "id",
                "image_url",
                "title",
                "subtitle",
                "is_active",
                "display_order",
                "created_at",
            ],
            Self::PortfolioItems => &[
                "id",
                "title",
                "description",
                "media_url",
                "media_type",
                "thumbnail_url",
                "category",
                "is_published",
                "display_order",
                "created_at",
            ],
            Self::NewsPosts => &[
                "id",
                "title",
                "content",
                "excerpt",
                "image_url",
                "is_published",
                "published_at",
                "created_at",
            ],
            Self::ContactSubmissions => &[
                "id",
                "name",
                "email",
                "subject",
                "message",
                "is_read",
                "created_at",
            ],
            Self::SiteSettings => &["id", "key", "value", "updated_at"],
        }
    }

    /// Columns without a store-side default that every insert must set.
    #[must_use]
    pub const fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::HeroImages => &["image_url"],
            Self::PortfolioItems => &["title", "media_url"],
            Self::NewsPosts => &["title", "content"],
            Self::ContactSubmissions => &["name", "email", "message"],
            Self::SiteSettings => &["key"],
        }
    }

    /// Whether `column` belongs to this collection.
    #[must_use]
    pub fn has_column(self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// Column used to identify a row for upserts.
    #[must_use]
    pub const fn conflict_key(self) -> &'static str {
        match self {
            Self::SiteSettings => "key",
            _ => "id",
        }
    }

    /// Whether a change subscription can be opened on this collection.
    #[must_use]
    pub fn is_watched(self) -> bool {
        Self::WATCHED.contains(&self)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// A blob storage bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    HeroImages,
    PortfolioMedia,
}

impl Bucket {
    /// Both buckets.
    pub const ALL: [Self; 2] = [Self::HeroImages, Self::PortfolioMedia];

    /// Bucket name as used in storage paths and public URLs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HeroImages => "hero-images",
            Self::PortfolioMedia => "portfolio-media",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
