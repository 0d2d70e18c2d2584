//! Browsing-engine capabilities the visit loop relies on.
//!
//! The engine itself is external. [`AgentBrowser`] drives the agent-browser
//! CLI; tests plug in in-memory implementations of the same traits.

mod agent;
mod types;

pub use agent::AgentBrowser;
pub use types::{BrowserCommand, SessionCookie};

use crate::error::BrowserError;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

pub type BrowserFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, BrowserError>> + Send + 'a>>;

/// Scrolls the viewport down by `px` pixels.
pub fn scroll_script(px: u32) -> String {
    format!("window.scrollBy(0, {px})")
}

/// Checks whether the viewport has reached the bottom of the document.
pub const AT_BOTTOM_SCRIPT: &str =
    "window.scrollY + window.innerHeight >= document.body.scrollHeight";

pub const OUTER_HTML_SCRIPT: &str = "document.documentElement.outerHTML";

/// A located element, addressed by the selector that matched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub selector: String,
}

/// One isolated tab. Must be closed by whoever opened it.
pub trait BrowsingContext: Send {
    fn navigate<'a>(&'a mut self, url: &'a str) -> BrowserFuture<'a, ()>;

    fn run_script<'a>(&'a mut self, script: &'a str) -> BrowserFuture<'a, Value>;

    fn current_url(&mut self) -> BrowserFuture<'_, String>;

    fn find_element<'a>(&'a mut self, selector: &'a str) -> BrowserFuture<'a, Option<Element>>;

    fn click<'a>(&'a mut self, element: &'a Element) -> BrowserFuture<'a, ()>;

    fn page_html(&mut self) -> BrowserFuture<'_, String>;

    fn close(&mut self) -> BrowserFuture<'_, ()>;
}

/// Hands out fresh isolated contexts sharing one cookie jar.
pub trait Browser: Send + Sync {
    fn open_context(&self) -> BrowserFuture<'_, Box<dyn BrowsingContext>>;

    /// Installs session cookies for `origin` so later contexts are logged in.
    fn set_cookies<'a>(
        &'a self,
        origin: &'a str,
        cookies: &'a [SessionCookie],
    ) -> BrowserFuture<'a, ()>;
}

/// Truthiness of a script result the way a page would see it.
pub fn script_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(_) | Value::Object(_) => true,
    }
}
