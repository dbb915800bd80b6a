//! Admin page commands.
//!
//! Each command mounts the matching dashboard page as the stored session,
//! runs one action or prints the page snapshot, and exits.

use std::path::Path;

use folio_core::{HeroImageId, NewsPostId, SettingKey, SubmissionId};
use folio_sync::bindings::Upload;
use folio_sync::bindings::admin::{AdminView, ReadFilter};
use folio_sync::config::SyncConfig;
use folio_sync::session::AdminPage;

use super::{CliError, confirm, finish, open_page};

/// Print the dashboard counts.
pub async fn overview(config: &SyncConfig) -> Result<(), CliError> {
    let view = open_page(config, AdminPage::Overview).await?;
    let page = view.lock().await;
    let AdminView::Overview(overview) = &*page else {
        return Err(CliError::UnexpectedView(AdminPage::Overview));
    };

    let stats = overview.stats();
    #[allow(clippy::print_stdout)]
    {
        println!("Hero images:     {}", stats.hero_images);
        println!("Portfolio items: {}", stats.portfolio_items);
        println!("News posts:      {}", stats.news_posts);
        println!("Messages:        {}", stats.messages_label());
    }
    Ok(())
}

pub async fn list_messages(config: &SyncConfig, filter: ReadFilter) -> Result<(), CliError> {
    let view = open_page(config, AdminPage::Messages).await?;
    let mut page = view.lock().await;
    let AdminView::Messages(inbox) = &mut *page else {
        return Err(CliError::UnexpectedView(AdminPage::Messages));
    };

    inbox.set_filter(filter);
    #[allow(clippy::print_stdout)]
    {
        println!("{} unread", inbox.unread_count());
        for message in inbox.visible() {
            let marker = if message.is_read { ' ' } else { '*' };
            println!(
                "{marker} {}  {}  {} <{}>  {}",
                message.id,
                message.created_at.format("%Y-%m-%d %H:%M"),
                message.name,
                message.email,
                message.subject.as_deref().unwrap_or("(no subject)"),
            );
        }
    }
    Ok(())
}

pub async fn toggle_message(config: &SyncConfig, id: SubmissionId) -> Result<(), CliError> {
    let view = open_page(config, AdminPage::Messages).await?;
    let mut page = view.lock().await;
    let AdminView::Messages(inbox) = &mut *page else {
        return Err(CliError::UnexpectedView(AdminPage::Messages));
    };
    finish(inbox.toggle_read(id).await, "Status update")
}

pub async fn delete_message(config: &SyncConfig, id: SubmissionId, yes: bool) -> Result<(), CliError> {
    let view = open_page(config, AdminPage::Messages).await?;
    let mut page = view.lock().await;
    let AdminView::Messages(inbox) = &mut *page else {
        return Err(CliError::UnexpectedView(AdminPage::Messages));
    };
    finish(inbox.delete(id, |prompt| yes || confirm(prompt)).await, "Delete")
}

pub async fn show_settings(config: &SyncConfig) -> Result<(), CliError> {
    let view = open_page(config, AdminPage::Settings).await?;
    let page = view.lock().await;
    let AdminView::Settings(settings) = &*page else {
        return Err(CliError::UnexpectedView(AdminPage::Settings));
    };

    #[allow(clippy::print_stdout)]
    {
        for (key, value) in settings.saved().entries() {
            println!("{:<18} {value}", key.as_str());
        }
    }
    Ok(())
}

/// Change one key in the form and save every key.
pub async fn set_setting(config: &SyncConfig, key: SettingKey, value: String) -> Result<(), CliError> {
    let view = open_page(config, AdminPage::Settings).await?;
    let mut page = view.lock().await;
    let AdminView::Settings(settings) = &mut *page else {
        return Err(CliError::UnexpectedView(AdminPage::Settings));
    };
    settings.form.set(key, value);
    finish(settings.save().await, "Saving settings")
}

pub async fn list_hero(config: &SyncConfig) -> Result<(), CliError> {
    let view = open_page(config, AdminPage::Hero).await?;
    let page = view.lock().await;
    let AdminView::Hero(hero) = &*page else {
        return Err(CliError::UnexpectedView(AdminPage::Hero));
    };

    #[allow(clippy::print_stdout)]
    {
        for image in hero.images() {
            let status = if image.is_active { "active" } else { "hidden" };
            println!(
                "{}  #{:<3} {status:<6}  {}  {}",
                image.id,
                image.display_order,
                image.title.as_deref().unwrap_or("-"),
                image.image_url,
            );
        }
    }
    Ok(())
}

pub async fn upload_hero(
    config: &SyncConfig,
    path: &Path,
    title: Option<String>,
    subtitle: Option<String>,
) -> Result<(), CliError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let view = open_page(config, AdminPage::Hero).await?;
    let mut page = view.lock().await;
    let AdminView::Hero(hero) = &mut *page else {
        return Err(CliError::UnexpectedView(AdminPage::Hero));
    };
    hero.draft.title = title.unwrap_or_default();
    hero.draft.subtitle = subtitle.unwrap_or_default();
    finish(hero.upload(Upload::new(file_name, bytes)).await, "Upload")
}

pub async fn toggle_hero(config: &SyncConfig, id: HeroImageId) -> Result<(), CliError> {
    let view = open_page(config, AdminPage::Hero).await?;
    let mut page = view.lock().await;
    let AdminView::Hero(hero) = &mut *page else {
        return Err(CliError::UnexpectedView(AdminPage::Hero));
    };
    finish(hero.toggle_active(id).await, "Status update")
}

pub async fn delete_hero(config: &SyncConfig, id: HeroImageId, yes: bool) -> Result<(), CliError> {
    let view = open_page(config, AdminPage::Hero).await?;
    let mut page = view.lock().await;
    let AdminView::Hero(hero) = &mut *page else {
        return Err(CliError::UnexpectedView(AdminPage::Hero));
    };
    finish(hero.delete(id, |prompt| yes || confirm(prompt)).await, "Delete")
}

pub async fn list_news(config: &SyncConfig) -> Result<(), CliError> {
    let view = open_page(config, AdminPage::News).await?;
    let page = view.lock().await;
    let AdminView::News(news) = &*page else {
        return Err(CliError::UnexpectedView(AdminPage::News));
    };

    #[allow(clippy::print_stdout)]
    {
        for post in news.posts() {
            let status = if post.is_published { "published" } else { "draft" };
            println!(
                "{}  {}  {status:<9}  {}",
                post.id,
                post.published_at.format("%Y-%m-%d"),
                post.title,
            );
        }
    }
    Ok(())
}

pub async fn toggle_news(config: &SyncConfig, id: NewsPostId) -> Result<(), CliError> {
    let view = open_page(config, AdminPage::News).await?;
    let mut page = view.lock().await;
    let AdminView::News(news) = &mut *page else {
        return Err(CliError::UnexpectedView(AdminPage::News));
    };
    finish(news.toggle_published(id).await, "Status update")
}
