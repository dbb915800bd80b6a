//! Public views following content changes.

#![allow(clippy::unwrap_used)]

use folio_core::{Collection, HeroImage, NewsPost};
use folio_integration_tests::{SETTLE_TIMEOUT, TestSite, settle};
use folio_sync::bindings::{ContactForm, HeroBinding, NEWS_FEED_LIMIT, NewsBinding, PortfolioBinding};
use folio_sync::live::LiveView;
use folio_sync::notify::NoticeLevel;
use folio_sync::store::encode_row;
use serde_json::json;

/// Publication timestamp `days` days before the newest post.
fn days_ago(days: u32) -> String {
    format!("2026-01-{:02}T12:00:00Z", 28 - days)
}

// =============================================================================
// News Feed
// =============================================================================

#[tokio::test]
async fn test_news_feed_shows_newest_published_posts() {
    let site = TestSite::new();
    let posts = site.client.table::<NewsPost>();
    for day in 0..8 {
        posts
            .insert(&json!({
                "title": format!("Post {day}"),
                "content": "Body",
                "published_at": days_ago(day),
            }))
            .await
            .unwrap();
    }
    posts
        .insert(&json!({
            "title": "Draft",
            "content": "Unfinished",
            "is_published": false,
            "published_at": days_ago(0),
        }))
        .await
        .unwrap();

    let view = LiveView::bind(&site.client, NewsBinding::new(&site.client))
        .await
        .unwrap();
    let feed = view.lock().await;
    let titles: Vec<&str> = feed.posts().iter().map(|p| p.title.as_str()).collect();

    assert_eq!(titles.len(), NEWS_FEED_LIMIT);
    assert_eq!(titles, ["Post 0", "Post 1", "Post 2", "Post 3", "Post 4", "Post 5"]);
}

#[tokio::test]
async fn test_news_feed_refetches_on_remote_change() {
    let site = TestSite::new();
    let view = LiveView::bind(&site.client, NewsBinding::new(&site.client))
        .await
        .unwrap();
    assert!(view.lock().await.posts().is_empty());

    let seen = view.refresh_count();
    let post = site
        .client
        .table::<NewsPost>()
        .insert(&json!({"title": "Opening night", "content": "Doors at eight"}))
        .await
        .unwrap();
    assert!(
        tokio::time::timeout(SETTLE_TIMEOUT, view.refreshed_since(seen))
            .await
            .unwrap()
    );
    assert_eq!(view.lock().await.posts()[0].id, post.id);

    // Unpublishing is an update like any other; the post leaves the feed.
    let seen = view.refresh_count();
    site.client
        .table::<NewsPost>()
        .update(post.id, &json!({"is_published": false}))
        .await
        .unwrap();
    assert!(
        tokio::time::timeout(SETTLE_TIMEOUT, view.refreshed_since(seen))
            .await
            .unwrap()
    );
    assert!(view.lock().await.posts().is_empty());
}

// =============================================================================
// Hero Carousel
// =============================================================================

#[tokio::test]
async fn test_hero_rotation_restarts_when_images_change() {
    let site = TestSite::new();
    let images = site.client.table::<HeroImage>();
    for (url, order) in [("https://cdn.test/b.png", 1), ("https://cdn.test/a.png", 0)] {
        images
            .insert(&json!({"image_url": url, "display_order": order}))
            .await
            .unwrap();
    }
    images
        .insert(&json!({"image_url": "https://cdn.test/hidden.png", "is_active": false}))
        .await
        .unwrap();

    let view = LiveView::bind(&site.client, HeroBinding::new(&site.client))
        .await
        .unwrap();
    {
        let mut hero = view.lock().await;
        assert_eq!(hero.images().len(), 2);
        assert_eq!(hero.current().unwrap().image_url, "https://cdn.test/a.png");
        assert!(hero.tick());
        assert_eq!(hero.current().unwrap().image_url, "https://cdn.test/b.png");
        assert!(hero.tick());
        assert_eq!(hero.carousel().index(), 0);
        assert!(hero.tick());
    }

    let seen = view.refresh_count();
    images
        .insert(&json!({"image_url": "https://cdn.test/c.png", "display_order": 2}))
        .await
        .unwrap();
    assert!(
        tokio::time::timeout(SETTLE_TIMEOUT, view.refreshed_since(seen))
            .await
            .unwrap()
    );

    let hero = view.lock().await;
    assert_eq!(hero.images().len(), 3);
    assert_eq!(hero.carousel().index(), 0);
}

// =============================================================================
// Portfolio
// =============================================================================

#[tokio::test]
async fn test_portfolio_filter_does_not_refetch() {
    let site = TestSite::new();
    for (title, category) in [("Nocturne", "music"), ("Sketch", "art"), ("Reel", "music")] {
        site.client
            .store()
            .insert(
                Collection::PortfolioItems,
                encode_row(&json!({
                    "title": title,
                    "media_url": format!("https://cdn.test/{title}"),
                    "category": category,
                }))
                .unwrap(),
            )
            .await
            .unwrap();
    }

    let view = LiveView::bind(&site.client, PortfolioBinding::new(&site.client))
        .await
        .unwrap();
    let queries = site.store.total_queries();

    let mut portfolio = view.lock().await;
    assert_eq!(portfolio.categories(), ["all", "music", "art"]);
    portfolio.select_category("music");
    let visible: Vec<&str> = portfolio.visible().into_iter().map(|i| i.title.as_str()).collect();
    assert_eq!(visible, ["Nocturne", "Reel"]);
    portfolio.select_category("all");
    assert_eq!(portfolio.visible().len(), 3);

    assert_eq!(site.store.total_queries(), queries);
}

// =============================================================================
// Contact Form
// =============================================================================

#[tokio::test]
async fn test_contact_form_validates_then_clears_on_send() {
    let site = TestSite::new();
    let mut form = ContactForm::new(&site.client);

    form.draft.name = "Ada".to_owned();
    form.draft.email = "not-an-email".to_owned();
    form.draft.message = "Commission?".to_owned();
    assert!(!form.submit().await.is_applied());
    assert!(
        site.notices.last().unwrap().message.starts_with("Please enter a valid email"),
        "unexpected notice: {:?}",
        site.notices.last()
    );
    assert_eq!(form.draft.name, "Ada");

    form.draft.email = "ada@example.com".to_owned();
    assert!(form.submit().await.is_applied());
    assert!(form.draft.name.is_empty());
    assert_eq!(
        site.notices.messages(NoticeLevel::Success),
        ["Message sent successfully! I'll get back to you soon."]
    );

    settle().await;
    assert_eq!(site.services.store.len(Collection::ContactSubmissions), 1);
}
