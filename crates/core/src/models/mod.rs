//! Persisted content entities.
//!
//! Each entity maps one row of a [`Collection`]. Read types carry every
//! column; the `New*`/`*Input` types are write payloads that only serialize
//! the columns the caller sets, so store-side defaults (ids, timestamps,
//! flags) apply on insert.

pub mod contact;
pub mod hero;
pub mod news;
pub mod portfolio;
pub mod settings;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::Collection;

pub use contact::{ContactSubmission, NewContactSubmission};
pub use hero::{HeroImage, NewHeroImage};
pub use news::{NewsPost, NewsPostInput};
pub use portfolio::{PortfolioItem, PortfolioItemInput};
pub use settings::{
    SettingKey, SiteSetting, SiteSettings, SocialLink, SocialPlatform, UnknownSettingKey,
};

/// A record type stored in a content collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection rows of this type live in.
    const COLLECTION: Collection;
}
