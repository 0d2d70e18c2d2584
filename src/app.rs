//! One complete run: log in, visit topics, report.

use crate::browser::{AgentBrowser, Browser};
use crate::candidates::{CandidateSource, ListingSource, RenderedListing};
use crate::config::{Config, Credentials};
use crate::error::{AmblerError, BrowserError};
use crate::forum::{ForumClient, SessionLogin};
use crate::notify::{
    BrowseStatus, DispatchReport, NotificationDispatcher, Notifier, RunReport, build_notifiers,
};
use crate::pacing::Pacer;
use crate::scheduler::EngagementScheduler;
use crate::visit::{VisitExecutor, VisitOptions};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const LOGIN_SETTLE: Duration = Duration::from_secs(5);
const CURRENT_USER_SELECTOR: &str = "#current-user";
const AVATAR_MARKER: &str = "avatar";

/// External collaborators of a run.
pub struct Collaborators {
    pub browser: Arc<dyn Browser>,
    pub session: Arc<dyn SessionLogin>,
    pub listing: Arc<dyn ListingSource>,
    pub notifiers: Vec<Box<dyn Notifier>>,
}

impl Collaborators {
    /// The production wiring: forum HTTP client, agent-browser, configured
    /// notification channels.
    pub fn from_config(config: &Config) -> Result<Self, AmblerError> {
        let forum = Arc::new(ForumClient::new(config.base_url()?)?);
        Ok(Self {
            browser: Arc::new(AgentBrowser::new(&config.browser)),
            session: forum.clone(),
            listing: forum,
            notifiers: build_notifiers(&config.notify),
        })
    }
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub report: RunReport,
    pub dispatch: DispatchReport,
}

pub struct App {
    config: Config,
    base: Url,
    browser: Arc<dyn Browser>,
    session: Arc<dyn SessionLogin>,
    scheduler: EngagementScheduler,
    dispatcher: NotificationDispatcher,
}

impl App {
    pub fn new(config: Config, parts: Collaborators, pacer: Arc<Pacer>) -> Result<Self, AmblerError> {
        let base = config.base_url()?;
        let fallback = Arc::new(RenderedListing::new(Arc::clone(&parts.browser), base.clone()));
        let source = CandidateSource::new(base.clone(), parts.listing, fallback);
        let executor = VisitExecutor::new(
            Arc::clone(&parts.browser),
            Arc::clone(&pacer),
            VisitOptions::from_config(&config.browse),
        );
        let scheduler = EngagementScheduler::new(source, Arc::new(executor), Arc::clone(&pacer));
        let dispatcher = NotificationDispatcher::new(parts.notifiers, pacer);

        Ok(Self {
            config,
            base,
            browser: parts.browser,
            session: parts.session,
            scheduler,
            dispatcher,
        })
    }

    /// Runs every phase and always notifies.
    ///
    /// Authentication problems and a failed browse phase only degrade the
    /// run; both end up in the reported status.
    pub async fn run(&self, credentials: &Credentials) -> RunOutcome {
        let login_verified = self.establish_session(credentials).await;
        if !login_verified {
            tracing::warn!("Continuing without a verified login");
        }

        let browse = self.browse().await;
        let report = RunReport {
            login_verified,
            browse,
        };

        tracing::info!(status = report.status_message().as_str(), "Run finished");
        let dispatch = self.dispatcher.dispatch(&report).await;

        RunOutcome { report, dispatch }
    }

    async fn browse(&self) -> BrowseStatus {
        let browse = &self.config.browse;
        if !browse.enabled {
            tracing::info!("Browsing disabled");
            return BrowseStatus::Disabled;
        }

        match self.scheduler.run(browse.max_topics).await {
            Ok(_) if browse.max_topics == 0 => BrowseStatus::Skipped,
            Ok(summary) => BrowseStatus::Finished(summary),
            Err(e) => {
                tracing::error!("Browsing failed: {e}");
                BrowseStatus::Failed(e.to_string())
            }
        }
    }

    /// Logs in over HTTP, hands the cookies to the browser and checks that
    /// the browser actually sees a logged-in page.
    async fn establish_session(&self, credentials: &Credentials) -> bool {
        let cookies = match self.session.establish(credentials).await {
            Ok(cookies) => cookies,
            Err(e) => {
                tracing::error!("Login failed: {e}");
                return false;
            }
        };
        tracing::info!(count = cookies.len(), "Session cookies obtained");

        if let Err(e) = self.browser.set_cookies(self.base.as_str(), &cookies).await {
            tracing::warn!("Could not hand cookies to the browser: {e}");
        }

        match self.verify_login().await {
            Ok(true) => {
                tracing::info!("Login verified");
                true
            }
            Ok(false) => {
                tracing::error!("Login could not be verified, no user menu on the home page");
                false
            }
            Err(e) => {
                tracing::error!("Login verification failed: {e}");
                false
            }
        }
    }

    async fn verify_login(&self) -> Result<bool, BrowserError> {
        let mut ctx = self.browser.open_context().await?;
        let verified = async {
            ctx.navigate(self.base.as_str()).await?;
            tokio::time::sleep(LOGIN_SETTLE).await;

            let verified = match ctx.find_element(CURRENT_USER_SELECTOR).await? {
                Some(_) => true,
                None => ctx.page_html().await?.contains(AVATAR_MARKER),
            };
            Ok::<bool, BrowserError>(verified)
        }
        .await;

        if let Err(e) = ctx.close().await {
            tracing::warn!("Failed to close verification context: {e}");
        }
        verified
    }
}
