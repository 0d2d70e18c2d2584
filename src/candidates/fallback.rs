use super::{CandidatePool, ListingMarkup, MarkupFuture, WorkItem};
use crate::browser::Browser;
use crate::error::FetchError;
use scraper::{Html, Selector};
use std::sync::{Arc, LazyLock};
use url::Url;

const LIST_CONTAINER: &str = "#list-area";

static CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(LIST_CONTAINER).expect("container selector is valid"));
static TOPIC_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class*=\"title\"][href]").expect("title selector is valid"));

/// Topic links under the listing container, resolved against `base`.
///
/// A page without the container is an error; a container without links is
/// just an empty result.
pub fn extract_topic_links(html: &str, base: &Url, limit: usize) -> Result<Vec<WorkItem>, FetchError> {
    let document = Html::parse_document(html);
    let container = document
        .select(&CONTAINER)
        .next()
        .ok_or_else(missing_container)?;

    let pool: CandidatePool = container
        .select(&TOPIC_TITLE)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .filter_map(|href| base.join(href).ok())
        .map(|url| WorkItem::new(url.to_string()))
        .collect();

    let mut items = pool.into_items();
    items.truncate(limit);
    Ok(items)
}

fn missing_container() -> FetchError {
    FetchError::FallbackContainerMissing {
        selector: LIST_CONTAINER.to_string(),
    }
}

/// Renders the forum's latest-topics page in a throwaway context.
pub struct RenderedListing {
    browser: Arc<dyn Browser>,
    url: Url,
}

impl RenderedListing {
    pub fn new(browser: Arc<dyn Browser>, url: Url) -> Self {
        Self { browser, url }
    }
}

impl ListingMarkup for RenderedListing {
    fn markup(&self) -> MarkupFuture<'_> {
        Box::pin(async move {
            let mut ctx = self.browser.open_context().await?;
            let html = async {
                ctx.navigate(self.url.as_str()).await?;
                ctx.page_html().await
            }
            .await;

            if let Err(e) = ctx.close().await {
                tracing::warn!("Failed to close listing context: {e}");
            }
            html
        })
    }
}
