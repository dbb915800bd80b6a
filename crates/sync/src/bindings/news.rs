//! Public news feed.

use async_trait::async_trait;
use folio_core::{Collection, NewsPost};

use super::Binding;
use crate::client::SiteClient;
use crate::error::StoreError;
use crate::store::{Direction, Filter, Query};

/// Posts shown on the landing page.
pub const NEWS_FEED_LIMIT: usize = 6;

/// The latest published posts, newest first.
pub struct NewsBinding {
    client: SiteClient,
    posts: Vec<NewsPost>,
}

impl NewsBinding {
    #[must_use]
    pub fn new(client: &SiteClient) -> Self {
        Self {
            client: client.clone(),
            posts: Vec::new(),
        }
    }

    #[must_use]
    pub fn posts(&self) -> &[NewsPost] {
        &self.posts
    }
}

#[async_trait]
impl Binding for NewsBinding {
    fn name(&self) -> &'static str {
        "news"
    }

    fn watches(&self) -> &'static [Collection] {
        &[Collection::NewsPosts]
    }

    async fn refresh(&mut self) -> Result<(), StoreError> {
        self.posts = self
            .client
            .table::<NewsPost>()
            .fetch(
                &Query::new()
                    .filter(Filter::eq("is_published", true))
                    .order_by("published_at", Direction::Descending)
                    .limit(NEWS_FEED_LIMIT),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::bindings::testing::fixture;

    #[tokio::test]
    async fn test_feed_is_newest_first_and_capped() {
        let (client, _services, _notices) = fixture();
        let table = client.table::<NewsPost>();
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        for day in 0..8 {
            table
                .insert(&json!({
                    "title": format!("Day {day}"),
                    "content": "...",
                    "published_at": (base + Duration::days(day)).to_rfc3339(),
                }))
                .await
                .unwrap();
        }
        table
            .insert(&json!({
                "title": "Draft",
                "content": "...",
                "is_published": false,
                "published_at": (base + Duration::days(30)).to_rfc3339(),
            }))
            .await
            .unwrap();

        let mut news = NewsBinding::new(&client);
        news.refresh().await.unwrap();

        let titles: Vec<&str> = news.posts().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Day 7", "Day 6", "Day 5", "Day 4", "Day 3", "Day 2"]);
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_fetch_order_across_the_cap() {
        let (client, _services, _notices) = fixture();
        let table = client.table::<NewsPost>();
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

        // Three posts share day 2 and three share day 1; the day 1 group
        // straddles the sixth slot.
        let mut ids = HashMap::new();
        for (title, day) in [
            ("D", 1),
            ("A", 2),
            ("Newest", 3),
            ("E", 1),
            ("B", 2),
            ("F", 1),
            ("C", 2),
            ("Oldest", 0),
        ] {
            let post = table
                .insert(&json!({
                    "title": title,
                    "content": "...",
                    "published_at": (base + Duration::days(day)).to_rfc3339(),
                }))
                .await
                .unwrap();
            ids.insert(title, post.id);
        }

        let mut news = NewsBinding::new(&client);
        news.refresh().await.unwrap();

        let shown: Vec<_> = news.posts().iter().map(|p| p.id).collect();
        let expected: Vec<_> = ["Newest", "A", "B", "C", "D", "E"]
            .iter()
            .map(|title| ids[title])
            .collect();
        assert_eq!(shown, expected);
    }
}
