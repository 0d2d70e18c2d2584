#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use ambler::app::{App, Collaborators};
use ambler::browser::{
    AT_BOTTOM_SCRIPT, Browser, BrowserFuture, BrowsingContext, Element, SessionCookie,
};
use ambler::candidates::{ListingEntry, ListingFuture, ListingSource};
use ambler::config::Credentials;
use ambler::error::{ForumError, NotifyError};
use ambler::forum::{SessionFuture, SessionLogin};
use ambler::notify::{Notifier, NotifyFuture};
use ambler::pacing::Pacer;
use ambler::Config;
use serde_json::Value;
use zeroize::Zeroizing;

pub const BASE: &str = "https://forum.example.com/";

pub const PREFERRED_REACTION: &str = ".discourse-reactions-reaction-button:not(.reacted)";
pub const ANY_REACTION: &str = ".discourse-reactions-reaction-button";

pub fn topic_url(id: u64) -> String {
    format!("{BASE}t/topic-{id}/{id}")
}

#[derive(Debug, Default)]
pub struct BrowserLog {
    pub opened: u32,
    pub closed: u32,
    pub navigations: Vec<String>,
    pub clicks: Vec<String>,
    pub cookies: Vec<(String, SessionCookie)>,
}

impl BrowserLog {
    /// Navigations to topic pages, excluding the home page check.
    pub fn topic_visits(&self) -> Vec<String> {
        self.navigations
            .iter()
            .filter(|url| url.as_str() != BASE)
            .cloned()
            .collect()
    }
}

/// In-memory browser; every page shows the given selectors and markup.
pub struct FakeBrowser {
    present: Vec<&'static str>,
    html: String,
    log: Arc<Mutex<BrowserLog>>,
}

impl FakeBrowser {
    pub fn new(present: Vec<&'static str>, html: &str) -> Arc<Self> {
        Arc::new(Self {
            present,
            html: html.to_string(),
            log: Arc::default(),
        })
    }

    /// Logged-in pages with both reaction buttons.
    pub fn logged_in() -> Arc<Self> {
        Self::new(
            vec!["#current-user", PREFERRED_REACTION, ANY_REACTION],
            "<html><body></body></html>",
        )
    }

    pub fn log(&self) -> MutexGuard<'_, BrowserLog> {
        self.log.lock().unwrap()
    }
}

impl Browser for FakeBrowser {
    fn open_context(&self) -> BrowserFuture<'_, Box<dyn BrowsingContext>> {
        Box::pin(async move {
            self.log.lock().unwrap().opened += 1;
            Ok(Box::new(FakeTab {
                present: self.present.clone(),
                html: self.html.clone(),
                url: String::new(),
                log: Arc::clone(&self.log),
            }) as Box<dyn BrowsingContext>)
        })
    }

    fn set_cookies<'a>(
        &'a self,
        origin: &'a str,
        cookies: &'a [SessionCookie],
    ) -> BrowserFuture<'a, ()> {
        Box::pin(async move {
            let mut log = self.log.lock().unwrap();
            for cookie in cookies {
                log.cookies.push((origin.to_string(), cookie.clone()));
            }
            Ok(())
        })
    }
}

struct FakeTab {
    present: Vec<&'static str>,
    html: String,
    url: String,
    log: Arc<Mutex<BrowserLog>>,
}

impl BrowsingContext for FakeTab {
    fn navigate<'a>(&'a mut self, url: &'a str) -> BrowserFuture<'a, ()> {
        Box::pin(async move {
            self.log.lock().unwrap().navigations.push(url.to_string());
            self.url = url.to_string();
            Ok(())
        })
    }

    fn run_script<'a>(&'a mut self, script: &'a str) -> BrowserFuture<'a, Value> {
        Box::pin(async move {
            if script == AT_BOTTOM_SCRIPT {
                Ok(Value::Bool(false))
            } else {
                Ok(Value::Null)
            }
        })
    }

    fn current_url(&mut self) -> BrowserFuture<'_, String> {
        Box::pin(async move { Ok(self.url.clone()) })
    }

    fn find_element<'a>(&'a mut self, selector: &'a str) -> BrowserFuture<'a, Option<Element>> {
        Box::pin(async move {
            Ok(self
                .present
                .iter()
                .any(|present| *present == selector)
                .then(|| Element {
                    selector: selector.to_string(),
                }))
        })
    }

    fn click<'a>(&'a mut self, element: &'a Element) -> BrowserFuture<'a, ()> {
        Box::pin(async move {
            self.log.lock().unwrap().clicks.push(element.selector.clone());
            Ok(())
        })
    }

    fn page_html(&mut self) -> BrowserFuture<'_, String> {
        Box::pin(async move { Ok(self.html.clone()) })
    }

    fn close(&mut self) -> BrowserFuture<'_, ()> {
        Box::pin(async move {
            self.log.lock().unwrap().closed += 1;
            Ok(())
        })
    }
}

/// Single listing page holding topics `1..=count`.
pub struct FakeListing {
    count: u64,
    calls: AtomicU32,
}

impl FakeListing {
    pub fn new(count: u64) -> Arc<Self> {
        Arc::new(Self {
            count,
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ListingSource for FakeListing {
    fn page(&self, index: u32) -> ListingFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let entries = if index == 0 {
            (1..=self.count)
                .map(|id| ListingEntry {
                    id: Some(id),
                    slug: Some(format!("topic-{id}")),
                })
                .collect()
        } else {
            Vec::new()
        };
        Box::pin(async move { Ok(entries) })
    }
}

pub struct FakeSession {
    reject: bool,
}

impl FakeSession {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self { reject: false })
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self { reject: true })
    }
}

impl SessionLogin for FakeSession {
    fn establish<'a>(&'a self, _credentials: &'a Credentials) -> SessionFuture<'a> {
        Box::pin(async move {
            if self.reject {
                return Err(ForumError::LoginRejected("Incorrect password".into()));
            }
            Ok(vec![SessionCookie {
                name: "_t".into(),
                value: "session".into(),
            }])
        })
    }
}

#[derive(Clone, Default)]
pub struct Inbox {
    messages: Arc<Mutex<Vec<String>>>,
}

impl Inbox {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

struct RecordingNotifier {
    inbox: Inbox,
}

impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn send<'a>(&'a self, _title: &'a str, message: &'a str) -> NotifyFuture<'a> {
        Box::pin(async move {
            self.inbox.messages.lock().unwrap().push(message.to_string());
            Ok::<(), NotifyError>(())
        })
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        username: "alice".into(),
        password: Zeroizing::new("hunter2".into()),
    }
}

pub fn config(max_topics: usize) -> Config {
    let mut config = Config::default();
    config.forum.base_url = BASE.to_string();
    config.browse.max_topics = max_topics;
    config
}

/// Wires fakes into an [`App`] with a seeded pacer.
pub fn app(
    config: Config,
    browser: &Arc<FakeBrowser>,
    session: Arc<FakeSession>,
    listing: &Arc<FakeListing>,
) -> (App, Inbox) {
    let inbox = Inbox::default();
    let notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(RecordingNotifier {
        inbox: inbox.clone(),
    })];
    let parts = Collaborators {
        browser: browser.clone(),
        session,
        listing: listing.clone(),
        notifiers,
    };
    let pacer = Arc::new(Pacer::seeded(config.pacing, 0x5EED));
    let app = App::new(config, parts, pacer).unwrap();
    (app, inbox)
}
