//! News feed posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::types::{Collection, NewsPostId};

/// A news post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsPost {
    pub id: NewsPostId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub is_published: bool,
    /// Sole sort key for the feed (newest first).
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewsPost {
    /// Text shown on the feed card: the excerpt, or the full content.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.excerpt
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(&self.content)
    }
}

impl Entity for NewsPost {
    const COLLECTION: Collection = Collection::NewsPosts;
}

/// Write payload for creating or editing a post.
///
/// Edits replace all four fields; `None` clears the optional ones.
#[derive(Debug, Clone, Serialize)]
pub struct NewsPostInput {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_falls_back_to_content() {
        let mut post = NewsPost {
            id: NewsPostId::random(),
            title: "Tour".to_string(),
            content: "Full story".to_string(),
            excerpt: None,
            image_url: None,
            is_published: true,
            published_at: Utc::now(),
            created_at: Utc::now(),
        };
        assert_eq!(post.summary(), "Full story");

        post.excerpt = Some(String::new());
        assert_eq!(post.summary(), "Full story");

        post.excerpt = Some("Short".to_string());
        assert_eq!(post.summary(), "Short");
    }
}
