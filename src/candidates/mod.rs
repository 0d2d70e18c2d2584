//! Candidate topics for one run.
//!
//! The paginated listing is tried first. When it yields nothing at all, the
//! links are scraped from the rendered topic list instead.

mod fallback;

pub use fallback::{RenderedListing, extract_topic_links};

use crate::error::{BrowserError, FetchError, ForumError};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use url::Url;

/// Hard ceiling on listing pages per fetch.
pub const MAX_LISTING_PAGES: u32 = 60;

/// One topic to visit, identified by its URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem(String);

impl WorkItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw listing row; both fields are needed to build a topic URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingEntry {
    pub id: Option<u64>,
    pub slug: Option<String>,
}

impl ListingEntry {
    /// `{base}t/{slug}/{id}`, or `None` when either part is missing.
    pub fn topic_url(&self, base: &Url) -> Option<WorkItem> {
        let id = self.id.filter(|id| *id != 0)?;
        let slug = self.slug.as_deref().filter(|slug| !slug.is_empty())?;
        base.join(&format!("t/{slug}/{id}"))
            .ok()
            .map(|url| WorkItem::new(url.to_string()))
    }
}

pub type ListingFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<ListingEntry>, ForumError>> + Send + 'a>>;

/// Paginated listing endpoint, page indices starting at 0.
pub trait ListingSource: Send + Sync {
    fn page(&self, index: u32) -> ListingFuture<'_>;
}

pub type MarkupFuture<'a> = Pin<Box<dyn Future<Output = Result<String, BrowserError>> + Send + 'a>>;

/// Pre-rendered topic list page, used when the listing endpoint is dry.
pub trait ListingMarkup: Send + Sync {
    fn markup(&self) -> MarkupFuture<'_>;
}

/// Insertion-ordered, duplicate-free collection of work items.
#[derive(Debug, Default)]
pub struct CandidatePool {
    items: Vec<WorkItem>,
    seen: HashSet<String>,
}

impl CandidatePool {
    /// Adds `item` unless its URL is already present.
    pub fn insert(&mut self, item: WorkItem) -> bool {
        if !self.seen.insert(item.url().to_string()) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<WorkItem> {
        self.items
    }
}

impl FromIterator<WorkItem> for CandidatePool {
    fn from_iter<I: IntoIterator<Item = WorkItem>>(iter: I) -> Self {
        let mut pool = Self::default();
        for item in iter {
            pool.insert(item);
        }
        pool
    }
}

pub struct CandidateSource {
    base: Url,
    listing: Arc<dyn ListingSource>,
    fallback: Arc<dyn ListingMarkup>,
    max_pages: u32,
}

impl CandidateSource {
    pub fn new(base: Url, listing: Arc<dyn ListingSource>, fallback: Arc<dyn ListingMarkup>) -> Self {
        Self {
            base,
            listing,
            fallback,
            max_pages: MAX_LISTING_PAGES,
        }
    }

    /// Up to `limit` distinct topic URLs in fetch order.
    ///
    /// `limit == 0` returns immediately without touching the network. Only a
    /// missing fallback container is an error; an empty result is not.
    pub async fn fetch(&self, limit: usize) -> Result<Vec<WorkItem>, FetchError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let pool = self.fetch_listing(limit).await;
        if !pool.is_empty() {
            tracing::info!(count = pool.len(), "Collected topics from listing");
            return Ok(pool.into_items());
        }

        tracing::warn!("Listing yielded no topics, falling back to the rendered page");
        let html = self.fallback.markup().await?;
        let items = extract_topic_links(&html, &self.base, limit)?;
        tracing::info!(count = items.len(), "Collected topics from rendered page");
        Ok(items)
    }

    async fn fetch_listing(&self, limit: usize) -> CandidatePool {
        let mut pool = CandidatePool::default();
        let mut page = 0;

        while pool.len() < limit && page < self.max_pages {
            let entries = match self.listing.page(page).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(page, "Listing fetch stopped: {e}");
                    break;
                }
            };
            if entries.is_empty() {
                tracing::debug!(page, "Listing page empty");
                break;
            }

            for entry in &entries {
                let Some(item) = entry.topic_url(&self.base) else {
                    continue;
                };
                pool.insert(item);
                if pool.len() >= limit {
                    break;
                }
            }

            page += 1;
        }

        pool
    }
}
