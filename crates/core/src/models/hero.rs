//! Hero carousel images.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::types::{Collection, HeroImageId};

/// An image shown in the landing page carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroImage {
    pub id: HeroImageId,
    pub image_url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub is_active: bool,
    /// Carousel position; ties keep fetch order.
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

impl Entity for HeroImage {
    const COLLECTION: Collection = Collection::HeroImages;
}

/// Insert payload for a freshly uploaded hero image.
#[derive(Debug, Clone, Serialize)]
pub struct NewHeroImage {
    pub image_url: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub display_order: i32,
    /// Left unset to take the store default (active).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
