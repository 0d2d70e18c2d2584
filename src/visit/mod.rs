//! One topic visit: navigate, maybe engage, scroll, then backfill the dwell
//! time. Every attempt runs in its own browsing context which is closed on
//! every exit path.

mod engage;

pub use engage::{EngagementSignal, FALLBACK_SELECTOR, PREFERRED_SELECTOR};

use crate::browser::{AT_BOTTOM_SCRIPT, Browser, BrowsingContext, script_truthy, scroll_script};
use crate::candidates::WorkItem;
use crate::config::BrowseConfig;
use crate::error::{BrowserError, VisitError};
use crate::pacing::{Pacer, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const DEFAULT_ENGAGE_PROBABILITY: f64 = 0.3;
const DEFAULT_EARLY_EXIT_PROBABILITY: f64 = 0.01;
const DEFAULT_VISIT_ATTEMPTS: u32 = 3;
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Result of one visit once retries are spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    Success,
    Failed,
}

impl VisitOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Why the scroll loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollEnd {
    /// Ran all configured steps.
    Exhausted { steps: u32 },
    /// Random early exit after `step`.
    Random { step: u32 },
    /// Bottom reached with the URL unchanged since the previous step.
    Bottom { step: u32 },
}

/// What a successful attempt did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisitReport {
    pub engaged: bool,
    pub scroll: ScrollEnd,
    pub dwell_target: Duration,
    pub backfilled: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisitOptions {
    pub scroll_steps: u32,
    pub dry_run: bool,
    pub engage_probability: f64,
    pub early_exit_probability: f64,
    pub retry: RetryPolicy,
}

impl Default for VisitOptions {
    fn default() -> Self {
        Self {
            scroll_steps: 2,
            dry_run: false,
            engage_probability: DEFAULT_ENGAGE_PROBABILITY,
            early_exit_probability: DEFAULT_EARLY_EXIT_PROBABILITY,
            retry: RetryPolicy::fixed(DEFAULT_VISIT_ATTEMPTS, RETRY_PAUSE),
        }
    }
}

impl VisitOptions {
    pub fn from_config(browse: &BrowseConfig) -> Self {
        Self {
            scroll_steps: browse.scroll_steps,
            dry_run: browse.dry_run,
            engage_probability: browse.engage_probability,
            retry: RetryPolicy::fixed(browse.visit_attempts, RETRY_PAUSE),
            ..Self::default()
        }
    }
}

pub struct VisitExecutor {
    browser: Arc<dyn Browser>,
    pacer: Arc<Pacer>,
    signal: EngagementSignal,
    options: VisitOptions,
}

impl VisitExecutor {
    pub fn new(browser: Arc<dyn Browser>, pacer: Arc<Pacer>, options: VisitOptions) -> Self {
        let signal = EngagementSignal::new(Arc::clone(&pacer), options.dry_run);
        Self {
            browser,
            pacer,
            signal,
            options,
        }
    }

    pub fn options(&self) -> &VisitOptions {
        &self.options
    }

    /// Visits `item` under the retry policy. Never returns an error: a visit
    /// that fails on every attempt is logged and reported as
    /// [`VisitOutcome::Failed`].
    pub async fn visit(&self, item: &WorkItem) -> VisitOutcome {
        let result = self
            .options
            .retry
            .run(&self.pacer, item.url(), |attempt| {
                tracing::debug!(url = item.url(), attempt, "Visiting topic");
                self.attempt(item)
            })
            .await;

        match result {
            Ok(report) => {
                tracing::info!(
                    url = item.url(),
                    engaged = report.engaged,
                    scroll = ?report.scroll,
                    dwell_secs = report.dwell_target.as_secs_f64(),
                    "Visited topic"
                );
                VisitOutcome::Success
            }
            Err(e) if e.last.is_expected() => {
                tracing::warn!(url = item.url(), attempts = e.attempts, "Visit failed: {}", e.last);
                VisitOutcome::Failed
            }
            Err(e) => {
                tracing::error!(
                    url = item.url(),
                    attempts = e.attempts,
                    "Visit failed unexpectedly: {}",
                    e.last
                );
                VisitOutcome::Failed
            }
        }
    }

    /// A single attempt in a fresh context.
    pub async fn attempt(&self, item: &WorkItem) -> Result<VisitReport, VisitError> {
        let started = Instant::now();
        let dwell_target = self.pacer.dwell_target();

        let mut ctx = self
            .browser
            .open_context()
            .await
            .map_err(VisitError::Context)?;

        let result = self
            .browse(ctx.as_mut(), item, started, dwell_target)
            .await
            .map_err(|source| VisitError::Page {
                url: item.url().to_string(),
                source,
            });

        if let Err(e) = ctx.close().await {
            tracing::warn!(url = item.url(), "Failed to close browsing context: {e}");
        }
        result
    }

    async fn browse(
        &self,
        ctx: &mut dyn BrowsingContext,
        item: &WorkItem,
        started: Instant,
        dwell_target: Duration,
    ) -> Result<VisitReport, BrowserError> {
        ctx.navigate(item.url()).await?;

        let engaged = if !self.options.dry_run && self.pacer.chance(self.options.engage_probability)
        {
            self.signal.apply(ctx).await
        } else {
            false
        };

        let scroll = self.scroll(ctx).await?;
        let backfilled = self.pacer.backfill(started, dwell_target).await;

        Ok(VisitReport {
            engaged,
            scroll,
            dwell_target,
            backfilled,
        })
    }

    /// Scrolls at most `scroll_steps` times.
    ///
    /// The bottom check only counts once the URL matches the previous step's,
    /// so the first step never exits on it.
    async fn scroll(&self, ctx: &mut dyn BrowsingContext) -> Result<ScrollEnd, BrowserError> {
        let steps = self.options.scroll_steps;
        let mut prev_url: Option<String> = None;

        for step in 1..=steps {
            let px = self.pacer.scroll_distance();
            ctx.run_script(&scroll_script(px)).await?;
            tracing::debug!(step, px, "Scrolled");

            if self.pacer.chance(self.options.early_exit_probability) {
                tracing::debug!(step, "Random early exit");
                return Ok(ScrollEnd::Random { step });
            }

            let at_bottom = script_truthy(&ctx.run_script(AT_BOTTOM_SCRIPT).await?);
            let current_url = ctx.current_url().await?;
            if prev_url.as_deref() != Some(current_url.as_str()) {
                prev_url = Some(current_url);
            } else if at_bottom {
                tracing::debug!(step, "Reached the bottom");
                return Ok(ScrollEnd::Bottom { step });
            }

            self.pacer.scroll_delay().await;
        }

        Ok(ScrollEnd::Exhausted { steps })
    }
}
