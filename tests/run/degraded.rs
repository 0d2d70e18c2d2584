use ambler::notify::BrowseStatus;

use crate::forum_harness::{
    BASE, FakeBrowser, FakeListing, FakeSession, app, config, credentials,
};

#[tokio::test(start_paused = true)]
async fn rejected_login_still_browses_and_notifies() {
    let browser = FakeBrowser::logged_in();
    let listing = FakeListing::new(3);
    let (app, inbox) = app(config(2), &browser, FakeSession::rejecting(), &listing);

    let outcome = app.run(&credentials()).await;

    assert!(!outcome.report.login_verified);
    assert!(matches!(outcome.report.browse, BrowseStatus::Finished(s) if s.attempted == 2));
    // no session, so nothing was handed to the browser and no home check ran
    assert!(browser.log().cookies.is_empty());
    assert_eq!(browser.log().topic_visits().len(), 2);

    let messages = inbox.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("⚠️ Login could not be verified"), "{messages:?}");
}

#[tokio::test(start_paused = true)]
async fn session_cookies_reach_the_browser() {
    let browser = FakeBrowser::logged_in();
    let listing = FakeListing::new(1);
    let (app, _inbox) = app(config(1), &browser, FakeSession::accepting(), &listing);

    let outcome = app.run(&credentials()).await;

    assert!(outcome.report.login_verified);
    let log = browser.log();
    assert_eq!(log.cookies.len(), 1);
    assert_eq!(log.cookies[0].0, BASE);
    assert_eq!(log.cookies[0].1.name, "_t");
    assert_eq!(log.navigations.first().map(String::as_str), Some(BASE));
}

#[tokio::test(start_paused = true)]
async fn avatar_markup_verifies_without_user_menu() {
    let browser = FakeBrowser::new(
        Vec::new(),
        r#"<html><body><img class="avatar" src="/u/alice.png"></body></html>"#,
    );
    let listing = FakeListing::new(1);
    let (app, _inbox) = app(config(1), &browser, FakeSession::accepting(), &listing);

    let outcome = app.run(&credentials()).await;
    assert!(outcome.report.login_verified);
}

#[tokio::test(start_paused = true)]
async fn logged_out_home_page_degrades_the_run() {
    let browser = FakeBrowser::new(Vec::new(), "<html><body>Sign up</body></html>");
    let listing = FakeListing::new(2);
    let (app, inbox) = app(config(2), &browser, FakeSession::accepting(), &listing);

    let outcome = app.run(&credentials()).await;

    assert!(!outcome.report.login_verified);
    assert_eq!(
        inbox.messages(),
        vec!["⚠️ Login could not be verified + browsing finished (2/2 topics)".to_string()]
    );
}
