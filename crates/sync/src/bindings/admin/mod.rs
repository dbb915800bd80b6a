//! Admin dashboard pages.
//!
//! Admin pages are mounted through [`mount_admin`], which asks the
//! [`SessionGuard`] first and fetches nothing unless the page may render.

pub mod hero;
pub mod messages;
pub mod news;
pub mod overview;
pub mod portfolio;
pub mod settings;
pub mod users;

use async_trait::async_trait;
use folio_core::Collection;

use super::Binding;
use crate::client::SiteClient;
use crate::error::StoreError;
use crate::live::LiveView;
use crate::session::{AdminPage, GateDecision, Route, SessionGuard};

pub use hero::{DELETE_IMAGE_PROMPT, HeroAdmin, HeroDraft};
pub use messages::{DELETE_MESSAGE_PROMPT, MessagesAdmin, ReadFilter};
pub use news::{DELETE_POST_PROMPT, NewsAdmin, NewsDraft};
pub use overview::{DashboardStats, OverviewAdmin};
pub use portfolio::{DELETE_ITEM_PROMPT, PortfolioAdmin, PortfolioDraft};
pub use settings::SettingsAdmin;
pub use users::{AdminDraft, UsersAdmin};

/// The binding behind one admin page.
pub enum AdminView {
    Overview(OverviewAdmin),
    Hero(HeroAdmin),
    Portfolio(PortfolioAdmin),
    News(NewsAdmin),
    Messages(MessagesAdmin),
    Users(UsersAdmin),
    Settings(SettingsAdmin),
}

impl AdminView {
    #[must_use]
    pub fn new(client: &SiteClient, page: AdminPage) -> Self {
        match page {
            AdminPage::Overview => Self::Overview(OverviewAdmin::new(client)),
            AdminPage::Hero => Self::Hero(HeroAdmin::new(client)),
            AdminPage::Portfolio => Self::Portfolio(PortfolioAdmin::new(client)),
            AdminPage::News => Self::News(NewsAdmin::new(client)),
            AdminPage::Messages => Self::Messages(MessagesAdmin::new(client)),
            AdminPage::Users => Self::Users(UsersAdmin::new(client)),
            AdminPage::Settings => Self::Settings(SettingsAdmin::new(client)),
        }
    }

    #[must_use]
    pub const fn page(&self) -> AdminPage {
        match self {
            Self::Overview(_) => AdminPage::Overview,
            Self::Hero(_) => AdminPage::Hero,
            Self::Portfolio(_) => AdminPage::Portfolio,
            Self::News(_) => AdminPage::News,
            Self::Messages(_) => AdminPage::Messages,
            Self::Users(_) => AdminPage::Users,
            Self::Settings(_) => AdminPage::Settings,
        }
    }

    fn binding(&self) -> &dyn Binding {
        match self {
            Self::Overview(b) => b,
            Self::Hero(b) => b,
            Self::Portfolio(b) => b,
            Self::News(b) => b,
            Self::Messages(b) => b,
            Self::Users(b) => b,
            Self::Settings(b) => b,
        }
    }

    fn binding_mut(&mut self) -> &mut dyn Binding {
        match self {
            Self::Overview(b) => b,
            Self::Hero(b) => b,
            Self::Portfolio(b) => b,
            Self::News(b) => b,
            Self::Messages(b) => b,
            Self::Users(b) => b,
            Self::Settings(b) => b,
        }
    }
}

#[async_trait]
impl Binding for AdminView {
    fn name(&self) -> &'static str {
        self.binding().name()
    }

    fn watches(&self) -> &'static [Collection] {
        self.binding().watches()
    }

    async fn refresh(&mut self) -> Result<(), StoreError> {
        self.binding_mut().refresh().await
    }
}

/// Result of opening an admin page.
pub enum Mounted {
    /// The session is still being resolved.
    Loading,
    Redirect(Route),
    Page(LiveView<AdminView>),
}

impl std::fmt::Debug for Mounted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => f.write_str("Loading"),
            Self::Redirect(route) => f.debug_tuple("Redirect").field(route).finish(),
            Self::Page(_) => f.write_str("Page"),
        }
    }
}

/// Open `page` if the session allows it.
///
/// # Errors
///
/// Returns `StoreError` if the page's change subscriptions cannot be opened.
pub async fn mount_admin(
    client: &SiteClient,
    guard: &SessionGuard,
    page: AdminPage,
) -> Result<Mounted, StoreError> {
    match guard.gate(Route::Admin(page)) {
        GateDecision::Loading => Ok(Mounted::Loading),
        GateDecision::Redirect(route) => Ok(Mounted::Redirect(route)),
        GateDecision::Render => {
            let view = LiveView::bind(client, AdminView::new(client, page)).await?;
            Ok(Mounted::Page(view))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::testing::fixture;

    #[test]
    fn test_view_matches_page() {
        let (client, _services, _notices) = fixture();
        for page in AdminPage::ALL {
            assert_eq!(AdminView::new(&client, page).page(), page);
        }
    }

    #[test]
    fn test_watched_pages_register_only_watched_collections() {
        let (client, _services, _notices) = fixture();
        for page in AdminPage::ALL {
            let view = AdminView::new(&client, page);
            assert!(view.watches().iter().all(|c| c.is_watched()));
            assert_eq!(
                view.watches().is_empty(),
                matches!(page, AdminPage::Users | AdminPage::Settings)
            );
        }
    }
}
