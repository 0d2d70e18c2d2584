use crate::browser::BrowsingContext;
use crate::error::BrowserError;
use crate::pacing::{JitterBounds, Pacer};
use std::sync::Arc;

/// Reaction button the current user has not used yet.
pub const PREFERRED_SELECTOR: &str = ".discourse-reactions-reaction-button:not(.reacted)";
pub const FALLBACK_SELECTOR: &str = ".discourse-reactions-reaction-button";

const SETTLE_DELAY: JitterBounds = JitterBounds { min: 0.8, max: 1.6 };

/// The one write action a visit may take: a reaction click.
pub struct EngagementSignal {
    pacer: Arc<Pacer>,
    dry_run: bool,
}

impl EngagementSignal {
    pub fn new(pacer: Arc<Pacer>, dry_run: bool) -> Self {
        Self { pacer, dry_run }
    }

    /// Returns whether a reaction was clicked. Failures are logged and count
    /// as `false`; dry runs never touch the page.
    pub async fn apply(&self, ctx: &mut dyn BrowsingContext) -> bool {
        if self.dry_run {
            tracing::info!("Dry run, skipping reaction");
            return false;
        }

        match self.react(ctx).await {
            Ok(clicked) => clicked,
            Err(e) => {
                tracing::warn!("Reaction failed: {e}");
                false
            }
        }
    }

    async fn react(&self, ctx: &mut dyn BrowsingContext) -> Result<bool, BrowserError> {
        let element = match ctx.find_element(PREFERRED_SELECTOR).await? {
            Some(element) => Some(element),
            None => ctx.find_element(FALLBACK_SELECTOR).await?,
        };

        let Some(element) = element else {
            tracing::info!("No reaction button, topic probably already reacted to");
            return Ok(false);
        };

        ctx.click(&element).await?;
        tracing::info!(selector = element.selector.as_str(), "Reaction clicked");
        self.pacer.jitter(SETTLE_DELAY).await;
        Ok(true)
    }
}
