use std::collections::HashSet;

use ambler::error::ScheduleError;
use ambler::notify::BrowseStatus;
use ambler::scheduler::RunSummary;

use crate::forum_harness::{
    FakeBrowser, FakeListing, FakeSession, app, config, credentials, topic_url,
};

#[tokio::test(start_paused = true)]
async fn three_of_five_topics_are_visited_once_each() {
    let browser = FakeBrowser::logged_in();
    let listing = FakeListing::new(5);
    let (app, inbox) = app(config(3), &browser, FakeSession::accepting(), &listing);

    let outcome = app.run(&credentials()).await;

    assert_eq!(
        outcome.report.browse,
        BrowseStatus::Finished(RunSummary {
            planned: 3,
            attempted: 3,
            succeeded: 3,
        })
    );

    let visits = browser.log().topic_visits();
    assert_eq!(visits.len(), 3);
    let distinct: HashSet<&String> = visits.iter().collect();
    assert_eq!(distinct.len(), 3);
    let known: HashSet<String> = (1..=5).map(topic_url).collect();
    assert!(visits.iter().all(|url| known.contains(url)), "{visits:?}");

    assert_eq!(
        inbox.messages(),
        vec!["✅ Daily login succeeded + browsing finished (3/3 topics)".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn every_context_is_released() {
    let browser = FakeBrowser::logged_in();
    let listing = FakeListing::new(4);
    let (app, _inbox) = app(config(10), &browser, FakeSession::accepting(), &listing);

    app.run(&credentials()).await;

    let log = browser.log();
    assert!(log.opened > 0);
    assert_eq!(log.opened, log.closed);
}

#[tokio::test(start_paused = true)]
async fn zero_topics_skips_visiting() {
    let browser = FakeBrowser::logged_in();
    let listing = FakeListing::new(5);
    let (app, inbox) = app(config(0), &browser, FakeSession::accepting(), &listing);

    let outcome = app.run(&credentials()).await;

    assert_eq!(outcome.report.browse, BrowseStatus::Skipped);
    assert_eq!(listing.calls(), 0);
    assert!(browser.log().topic_visits().is_empty());
    assert_eq!(
        inbox.messages(),
        vec!["✅ Daily login succeeded + browsing skipped".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn dry_run_never_reacts() {
    let browser = FakeBrowser::logged_in();
    let listing = FakeListing::new(8);
    let mut config = config(8);
    config.browse.dry_run = true;
    config.browse.engage_probability = 1.0;
    let (app, _inbox) = app(config, &browser, FakeSession::accepting(), &listing);

    app.run(&credentials()).await;

    let log = browser.log();
    assert_eq!(log.topic_visits().len(), 8);
    assert!(log.clicks.is_empty(), "{:?}", log.clicks);
}

#[tokio::test(start_paused = true)]
async fn certain_engagement_reacts_on_every_topic() {
    let browser = FakeBrowser::logged_in();
    let listing = FakeListing::new(4);
    let mut config = config(4);
    config.browse.engage_probability = 1.0;
    let (app, _inbox) = app(config, &browser, FakeSession::accepting(), &listing);

    app.run(&credentials()).await;

    assert_eq!(browser.log().clicks.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn disabled_browsing_only_logs_in_and_notifies() {
    let browser = FakeBrowser::logged_in();
    let listing = FakeListing::new(5);
    let mut config = config(5);
    config.browse.enabled = false;
    let (app, inbox) = app(config, &browser, FakeSession::accepting(), &listing);

    let outcome = app.run(&credentials()).await;

    assert_eq!(outcome.report.browse, BrowseStatus::Disabled);
    assert_eq!(listing.calls(), 0);
    assert_eq!(inbox.messages(), vec!["✅ Daily login succeeded".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn no_candidates_completes_with_a_failed_browse_status() {
    // empty listing and a rendered page with an empty topic list
    let browser = FakeBrowser::new(
        vec!["#current-user"],
        r#"<html><body><div id="list-area"></div></body></html>"#,
    );
    let listing = FakeListing::new(0);
    let (app, inbox) = app(config(5), &browser, FakeSession::accepting(), &listing);

    let outcome = app.run(&credentials()).await;

    assert_eq!(
        outcome.report.browse,
        BrowseStatus::Failed(ScheduleError::NoCandidates.to_string())
    );
    assert!(outcome.report.login_verified);
    assert_eq!(outcome.dispatch.delivered(), 1);
    assert!(browser.log().topic_visits().is_empty());
    assert_eq!(
        inbox.messages(),
        vec!["✅ Daily login succeeded + browsing failed: no candidate topics found".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn run_time_stays_within_the_soft_budget() {
    let browser = FakeBrowser::logged_in();
    let listing = FakeListing::new(6);
    let config = config(6);
    let per_item = config.pacing.per_item_ceiling();
    let (app, _inbox) = app(config, &browser, FakeSession::accepting(), &listing);

    let started = tokio::time::Instant::now();
    app.run(&credentials()).await;
    let elapsed = started.elapsed();

    // login settle plus six visits, with a little slack for timer rounding
    let budget = std::time::Duration::from_secs(5) + per_item * 6;
    assert!(elapsed <= budget + std::time::Duration::from_millis(100), "{elapsed:?}");
}
