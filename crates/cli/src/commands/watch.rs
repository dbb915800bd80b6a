//! Follow the public site.
//!
//! Binds the hero, portfolio, news and about views, logs each snapshot as
//! change notifications refresh it, and rotates the hero carousel on its
//! interval. Runs until interrupted.

use folio_sync::bindings::{
    AboutBinding, HERO_ROTATION_INTERVAL, HeroBinding, NewsBinding, PortfolioBinding,
};
use folio_sync::config::SyncConfig;
use folio_sync::live::LiveView;
use tracing::info;

use super::{CliError, connect};

fn log_hero(hero: &HeroBinding) {
    info!(
        artist = hero.artist_name(),
        images = hero.images().len(),
        current = hero.current().map(|image| image.image_url.as_str()),
        "Hero"
    );
}

fn log_portfolio(portfolio: &PortfolioBinding) {
    info!(
        items = portfolio.items().len(),
        categories = ?portfolio.categories(),
        "Portfolio"
    );
}

fn log_news(news: &NewsBinding) {
    let titles: Vec<&str> = news.posts().iter().map(|post| post.title.as_str()).collect();
    info!(posts = ?titles, "News");
}

fn log_about(about: &AboutBinding) {
    let links: Vec<&str> = about
        .social_links()
        .iter()
        .map(|link| link.platform.label())
        .collect();
    info!(artist = about.artist_name(), about = about.about_text(), links = ?links, "About");
}

pub async fn run(config: &SyncConfig) -> Result<(), CliError> {
    let client = connect(config).await?;

    let hero = LiveView::bind(&client, HeroBinding::new(&client)).await?;
    let portfolio = LiveView::bind(&client, PortfolioBinding::new(&client)).await?;
    let news = LiveView::bind(&client, NewsBinding::new(&client)).await?;
    let about = LiveView::bind(&client, AboutBinding::new(&client)).await?;

    log_hero(&*hero.lock().await);
    log_portfolio(&*portfolio.lock().await);
    log_news(&*news.lock().await);
    log_about(&*about.lock().await);
    info!(channels = ?client.subscriptions().open_channels(), "Watching for changes (Ctrl+C to stop)");

    let mut seen = (
        hero.refresh_count(),
        portfolio.refresh_count(),
        news.refresh_count(),
        about.refresh_count(),
    );
    let mut rotation = tokio::time::interval(HERO_ROTATION_INTERVAL);
    rotation.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping");
                return Ok(());
            }
            _ = rotation.tick() => {
                let mut hero = hero.lock().await;
                if hero.tick() {
                    info!(
                        index = hero.carousel().index(),
                        current = hero.current().map(|image| image.image_url.as_str()),
                        "Hero rotated"
                    );
                }
            }
            refreshed = hero.refreshed_since(seen.0) => {
                if !refreshed {
                    return Err(CliError::ViewStopped("hero"));
                }
                seen.0 = hero.refresh_count();
                log_hero(&*hero.lock().await);
            }
            refreshed = portfolio.refreshed_since(seen.1) => {
                if !refreshed {
                    return Err(CliError::ViewStopped("portfolio"));
                }
                seen.1 = portfolio.refresh_count();
                log_portfolio(&*portfolio.lock().await);
            }
            refreshed = news.refreshed_since(seen.2) => {
                if !refreshed {
                    return Err(CliError::ViewStopped("news"));
                }
                seen.2 = news.refresh_count();
                log_news(&*news.lock().await);
            }
            refreshed = about.refreshed_since(seen.3) => {
                if !refreshed {
                    return Err(CliError::ViewStopped("about"));
                }
                seen.3 = about.refresh_count();
                log_about(&*about.lock().await);
            }
        }
    }
}
