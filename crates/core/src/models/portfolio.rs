//! Portfolio gallery items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::types::{Collection, MediaKind, PortfolioItemId};

/// A published (or draft) piece of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: PortfolioItemId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub media_url: String,
    pub media_type: MediaKind,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub is_published: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

impl PortfolioItem {
    /// Image to show in the grid: the thumbnail, or the media itself.
    #[must_use]
    pub fn display_image(&self) -> &str {
        self.thumbnail_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(&self.media_url)
    }

    /// Category, ignoring blank values.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.trim().is_empty())
    }
}

impl Entity for PortfolioItem {
    const COLLECTION: Collection = Collection::PortfolioItems;
}

/// Write payload for creating or fully replacing a portfolio item.
///
/// Optional fields serialize as `null` so an edit clears them.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioItemInput {
    pub title: String,
    pub description: Option<String>,
    pub media_url: String,
    pub media_type: MediaKind,
    pub thumbnail_url: Option<String>,
    pub category: Option<String>,
    /// Set on create; omitted on edit so the item keeps its position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(thumbnail: Option<&str>) -> PortfolioItem {
        PortfolioItem {
            id: PortfolioItemId::random(),
            title: "Nightfall".to_string(),
            description: None,
            media_url: "https://cdn.test/media.png".to_string(),
            media_type: MediaKind::Image,
            thumbnail_url: thumbnail.map(String::from),
            category: Some("  ".to_string()),
            is_published: true,
            display_order: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_image_prefers_thumbnail() {
        let it = item(Some("https://cdn.test/thumb.png"));
        assert_eq!(it.display_image(), "https://cdn.test/thumb.png");
    }

    #[test]
    fn test_display_image_falls_back_to_media() {
        assert_eq!(item(None).display_image(), "https://cdn.test/media.png");
        assert_eq!(item(Some("")).display_image(), "https://cdn.test/media.png");
    }

    #[test]
    fn test_blank_category_is_none() {
        assert_eq!(item(None).category(), None);
    }

    #[test]
    fn test_edit_payload_omits_display_order() {
        let input = PortfolioItemInput {
            title: "t".to_string(),
            description: None,
            media_url: "m".to_string(),
            media_type: MediaKind::Video,
            thumbnail_url: None,
            category: None,
            display_order: None,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert!(json.get("display_order").is_none());
        assert!(json.get("description").unwrap().is_null());
    }
}
