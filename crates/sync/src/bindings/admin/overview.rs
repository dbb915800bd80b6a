//! Dashboard overview counts.

use async_trait::async_trait;
use folio_core::{Collection, ContactSubmission, HeroImage, NewsPost, PortfolioItem};

use crate::bindings::Binding;
use crate::client::SiteClient;
use crate::error::StoreError;
use crate::store::Filter;

/// Row counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub hero_images: u64,
    pub portfolio_items: u64,
    pub news_posts: u64,
    pub messages: u64,
    pub unread_messages: u64,
}

impl DashboardStats {
    /// Messages card text: `unread/total`.
    #[must_use]
    pub fn messages_label(&self) -> String {
        format!("{}/{}", self.unread_messages, self.messages)
    }
}

pub struct OverviewAdmin {
    client: SiteClient,
    stats: DashboardStats,
}

impl OverviewAdmin {
    #[must_use]
    pub fn new(client: &SiteClient) -> Self {
        Self {
            client: client.clone(),
            stats: DashboardStats::default(),
        }
    }

    #[must_use]
    pub const fn stats(&self) -> DashboardStats {
        self.stats
    }
}

#[async_trait]
impl Binding for OverviewAdmin {
    fn name(&self) -> &'static str {
        "admin-overview"
    }

    fn watches(&self) -> &'static [Collection] {
        &[
            Collection::HeroImages,
            Collection::PortfolioItems,
            Collection::NewsPosts,
            Collection::ContactSubmissions,
        ]
    }

    async fn refresh(&mut self) -> Result<(), StoreError> {
        let unread = [Filter::eq("is_read", false)];
        let hero = self.client.table::<HeroImage>();
        let portfolio = self.client.table::<PortfolioItem>();
        let news = self.client.table::<NewsPost>();
        let inbox = self.client.table::<ContactSubmission>();

        let (hero_images, portfolio_items, news_posts, messages, unread_messages) = tokio::try_join!(
            hero.count(&[]),
            portfolio.count(&[]),
            news.count(&[]),
            inbox.count(&[]),
            inbox.count(&unread),
        )?;

        self.stats = DashboardStats {
            hero_images,
            portfolio_items,
            news_posts,
            messages,
            unread_messages,
        };
        Ok(())
    }
}
