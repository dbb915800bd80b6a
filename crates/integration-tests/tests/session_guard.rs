//! Admin gating and session transitions.

#![allow(clippy::unwrap_used)]

use folio_integration_tests::{ADMIN_EMAIL, ADMIN_PASSWORD, SETTLE_TIMEOUT, TestSite, sign_in};
use folio_sync::bindings::admin::{Mounted, mount_admin};
use folio_sync::notify::NoticeLevel;
use folio_sync::session::{AdminPage, GateDecision, Route, SessionGuard, SessionState};

async fn wait_for_state(guard: &SessionGuard, wanted: fn(&SessionState) -> bool) {
    let mut states = guard.watch();
    tokio::time::timeout(SETTLE_TIMEOUT, states.wait_for(wanted))
        .await
        .unwrap()
        .unwrap();
}

// =============================================================================
// Gating
// =============================================================================

#[tokio::test]
async fn test_unresolved_session_shows_loading() {
    let site = TestSite::new();
    let guard = SessionGuard::new(&site.client);

    assert_eq!(guard.state(), SessionState::Unknown);
    assert_eq!(guard.gate(Route::Admin(AdminPage::Hero)), GateDecision::Loading);
    assert_eq!(guard.gate(Route::Home), GateDecision::Render);

    let mounted = mount_admin(&site.client, &guard, AdminPage::Hero).await.unwrap();
    assert!(matches!(mounted, Mounted::Loading));
    assert_eq!(site.store.total_queries(), 0);
}

#[tokio::test]
async fn test_signed_out_admin_redirects_without_fetching() {
    let site = TestSite::new();
    let mut guard = SessionGuard::new(&site.client);
    guard.mount().await;
    assert_eq!(guard.state(), SessionState::Unauthenticated);

    for page in AdminPage::ALL {
        let mounted = mount_admin(&site.client, &guard, page).await.unwrap();
        assert!(matches!(mounted, Mounted::Redirect(Route::Login)), "{page:?}");
    }
    assert_eq!(site.store.total_queries(), 0);
    assert!(site.client.subscriptions().open_channels().is_empty());
}

// =============================================================================
// Login / Logout
// =============================================================================

#[tokio::test]
async fn test_login_requires_both_fields() {
    let (site, _admin) = TestSite::with_admin();
    let mut guard = SessionGuard::new(&site.client);
    guard.mount().await;

    assert_eq!(guard.login("", ADMIN_PASSWORD).await, None);
    assert_eq!(guard.login(ADMIN_EMAIL, "").await, None);
    assert_eq!(
        site.notices.messages(NoticeLevel::Error),
        ["Email and password are required", "Email and password are required"]
    );
}

#[tokio::test]
async fn test_wrong_password_stays_signed_out() {
    let (site, _admin) = TestSite::with_admin();
    let mut guard = SessionGuard::new(&site.client);
    guard.mount().await;

    assert_eq!(guard.login(ADMIN_EMAIL, "wrong-password").await, None);
    assert_eq!(site.notices.last().unwrap().message, "Invalid login credentials");
    assert_eq!(guard.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_login_then_logout() {
    let (site, admin) = TestSite::with_admin();
    let guard = sign_in(&site.client).await;

    assert_eq!(guard.user(), Some(admin));
    assert_eq!(site.notices.last().unwrap().message, "Welcome back!");
    assert_eq!(
        guard.gate(Route::Login),
        GateDecision::Redirect(Route::Admin(AdminPage::Overview))
    );
    assert_eq!(guard.gate(Route::Admin(AdminPage::Users)), GateDecision::Render);

    assert_eq!(guard.logout().await, Some(Route::Home));
    assert_eq!(site.notices.last().unwrap().message, "Logged out successfully");
    assert_eq!(guard.gate(Route::Admin(AdminPage::Users)), GateDecision::Redirect(Route::Login));
    assert_eq!(guard.gate(Route::Login), GateDecision::Render);
}

// =============================================================================
// Session Changes
// =============================================================================

#[tokio::test]
async fn test_remote_expiry_signs_the_guard_out() {
    let (site, _admin) = TestSite::with_admin();
    let guard = sign_in(&site.client).await;
    assert!(matches!(guard.state(), SessionState::Authenticated(_)));

    site.services.auth.revoke_all();
    wait_for_state(&guard, |s| *s == SessionState::Unauthenticated).await;

    assert_eq!(guard.gate(Route::Admin(AdminPage::News)), GateDecision::Redirect(Route::Login));
}

#[tokio::test]
async fn test_mounted_guard_follows_sign_in_elsewhere() {
    let (site, admin) = TestSite::with_admin();
    let mut watcher = SessionGuard::new(&site.client);
    watcher.mount().await;
    assert_eq!(watcher.state(), SessionState::Unauthenticated);

    let _active = sign_in(&site.client).await;
    wait_for_state(&watcher, |s| matches!(s, SessionState::Authenticated(_))).await;
    assert_eq!(watcher.user(), Some(admin));
}

#[tokio::test]
async fn test_restored_token_resumes_session() {
    let (site, admin) = TestSite::with_admin();
    let session = site
        .client
        .auth()
        .sign_in(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();
    site.client.auth().sign_out().await.unwrap();

    // Signing out ends the session for good.
    assert!(site.client.auth().restore(&session.token).await.unwrap().is_none());

    let session = site
        .client
        .auth()
        .sign_in(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();
    let restored = site.client.auth().restore(&session.token).await.unwrap().unwrap();
    assert_eq!(restored.user, admin);

    let mut guard = SessionGuard::new(&site.client);
    guard.mount().await;
    assert_eq!(guard.resolved().await, SessionState::Authenticated(admin));
}
