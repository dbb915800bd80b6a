//! Public portfolio grid and gallery.

use async_trait::async_trait;
use folio_core::{Collection, PortfolioItem, PortfolioItemId};

use super::Binding;
use crate::client::SiteClient;
use crate::error::StoreError;
use crate::store::{Direction, Filter, Query};

/// Category entry that shows every item.
pub const ALL_CATEGORIES: &str = "all";

/// Published portfolio items with a category filter and a selected item.
pub struct PortfolioBinding {
    client: SiteClient,
    items: Vec<PortfolioItem>,
    category: String,
    selected: Option<PortfolioItemId>,
}

impl PortfolioBinding {
    #[must_use]
    pub fn new(client: &SiteClient) -> Self {
        Self {
            client: client.clone(),
            items: Vec::new(),
            category: ALL_CATEGORIES.to_owned(),
            selected: None,
        }
    }

    /// Every published item in display order.
    #[must_use]
    pub fn items(&self) -> &[PortfolioItem] {
        &self.items
    }

    /// `"all"` followed by each distinct category in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut categories = vec![ALL_CATEGORIES];
        for category in self.items.iter().filter_map(PortfolioItem::category) {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        categories
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Change the category filter. Does not re-query.
    pub fn select_category(&mut self, category: &str) {
        category.clone_into(&mut self.category);
    }

    /// Items in the selected category.
    #[must_use]
    pub fn visible(&self) -> Vec<&PortfolioItem> {
        self.items
            .iter()
            .filter(|item| self.category == ALL_CATEGORIES || item.category() == Some(self.category.as_str()))
            .collect()
    }

    /// Open an item in the detail view. Ignored if the item is not loaded.
    pub fn select_item(&mut self, id: PortfolioItemId) {
        if self.items.iter().any(|item| item.id == id) {
            self.selected = Some(id);
        }
    }

    pub fn close_item(&mut self) {
        self.selected = None;
    }

    /// Item open in the detail view.
    #[must_use]
    pub fn selected(&self) -> Option<&PortfolioItem> {
        let id = self.selected?;
        self.items.iter().find(|item| item.id == id)
    }
}

#[async_trait]
impl Binding for PortfolioBinding {
    fn name(&self) -> &'static str {
        "portfolio"
    }

    fn watches(&self) -> &'static [Collection] {
        &[Collection::PortfolioItems]
    }

    async fn refresh(&mut self) -> Result<(), StoreError> {
        let items = self
            .client
            .table::<PortfolioItem>()
            .fetch(
                &Query::new()
                    .filter(Filter::eq("is_published", true))
                    .order_by("display_order", Direction::Ascending),
            )
            .await?;

        self.items = items;
        if let Some(id) = self.selected
            && !self.items.iter().any(|item| item.id == id)
        {
            self.selected = None;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use folio_core::{MediaKind, PortfolioItemInput};
    use serde_json::json;

    use super::*;
    use crate::bindings::testing::fixture;

    fn piece(title: &str, category: Option<&str>, order: i32) -> PortfolioItemInput {
        PortfolioItemInput {
            title: title.to_owned(),
            description: None,
            media_url: format!("memory://storage/portfolio-media/{title}.png"),
            media_type: MediaKind::Image,
            thumbnail_url: None,
            category: category.map(String::from),
            display_order: Some(order),
        }
    }

    #[tokio::test]
    async fn test_categories_in_first_seen_order() {
        let (client, _services, _notices) = fixture();
        let table = client.table::<PortfolioItem>();
        table.insert(&piece("a", Some("Music"), 0)).await.unwrap();
        table.insert(&piece("b", Some("Art"), 1)).await.unwrap();
        table.insert(&piece("c", Some("Music"), 2)).await.unwrap();
        table.insert(&piece("d", None, 3)).await.unwrap();

        let mut portfolio = PortfolioBinding::new(&client);
        portfolio.refresh().await.unwrap();

        assert_eq!(portfolio.categories(), ["all", "Music", "Art"]);
        assert_eq!(portfolio.visible().len(), 4);

        portfolio.select_category("Music");
        let titles: Vec<&str> = portfolio.visible().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["a", "c"]);
        assert_eq!(portfolio.items().len(), 4);
    }

    #[tokio::test]
    async fn test_selection_cleared_when_item_unpublished() {
        let (client, _services, _notices) = fixture();
        let table = client.table::<PortfolioItem>();
        let item = table.insert(&piece("solo", None, 0)).await.unwrap();

        let mut portfolio = PortfolioBinding::new(&client);
        portfolio.refresh().await.unwrap();
        portfolio.select_item(item.id);
        assert_eq!(portfolio.selected().map(|i| i.id), Some(item.id));

        table.update(item.id, &json!({"is_published": false})).await.unwrap();
        portfolio.refresh().await.unwrap();
        assert!(portfolio.selected().is_none());
        assert!(portfolio.items().is_empty());
    }

    #[test]
    fn test_unknown_item_is_not_selected() {
        let (client, _services, _notices) = fixture();
        let mut portfolio = PortfolioBinding::new(&client);
        portfolio.select_item(PortfolioItemId::random());
        assert!(portfolio.selected().is_none());
    }
}
