//! End-of-run status notifications.
//!
//! Each configured channel is tried on its own retry policy. A failing
//! channel is logged and never stops the others.

mod gotify;
mod serverchan;

pub use gotify::GotifyNotifier;
pub use serverchan::{ServerChanNotifier, push_uid};

use crate::config::NotifyConfig;
use crate::error::NotifyError;
use crate::pacing::{Pacer, RetryPolicy};
use crate::scheduler::RunSummary;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

pub const NOTIFY_TITLE: &str = "LINUX DO";

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;

/// One outbound status channel.
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Defaults to a single attempt.
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::once()
    }

    fn send<'a>(&'a self, title: &'a str, message: &'a str) -> NotifyFuture<'a>;
}

/// How the visitation phase ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseStatus {
    /// Browsing turned off entirely.
    Disabled,
    /// Topic limit of zero.
    Skipped,
    Finished(RunSummary),
    Failed(String),
}

/// Everything the status message is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub login_verified: bool,
    pub browse: BrowseStatus,
}

impl RunReport {
    pub fn status_message(&self) -> String {
        let mut message = if self.login_verified {
            String::from("✅ Daily login succeeded")
        } else {
            String::from("⚠️ Login could not be verified")
        };

        match &self.browse {
            BrowseStatus::Disabled => {}
            BrowseStatus::Skipped => message.push_str(" + browsing skipped"),
            BrowseStatus::Finished(summary) => message.push_str(&format!(
                " + browsing finished ({}/{} topics)",
                summary.succeeded, summary.attempted
            )),
            BrowseStatus::Failed(reason) => {
                message.push_str(&format!(" + browsing failed: {reason}"));
            }
        }
        message
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDelivery {
    pub channel: String,
    pub delivered: bool,
    pub attempts: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub deliveries: Vec<ChannelDelivery>,
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.delivered).count()
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelDelivery> {
        self.deliveries.iter().find(|d| d.channel == name)
    }
}

/// Channels enabled by `config`. A malformed ServerChan key disables that
/// channel only.
pub fn build_notifiers(config: &NotifyConfig) -> Vec<Box<dyn Notifier>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();

    match &config.gotify {
        Some(gotify) => notifiers.push(Box::new(GotifyNotifier::new(&gotify.url, &gotify.token))),
        None => tracing::info!("Gotify not configured, skipping"),
    }

    if let Some(serverchan) = &config.serverchan {
        match ServerChanNotifier::from_key(&serverchan.push_key) {
            Some(notifier) => notifiers.push(Box::new(notifier)),
            None => tracing::error!("Malformed ServerChan push key, no uid found; channel disabled"),
        }
    }

    notifiers
}

pub struct NotificationDispatcher {
    notifiers: Vec<Box<dyn Notifier>>,
    pacer: Arc<Pacer>,
    title: String,
}

impl NotificationDispatcher {
    pub fn new(notifiers: Vec<Box<dyn Notifier>>, pacer: Arc<Pacer>) -> Self {
        Self {
            notifiers,
            pacer,
            title: NOTIFY_TITLE.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Sends the status for `report` to every channel, in order.
    pub async fn dispatch(&self, report: &RunReport) -> DispatchReport {
        let message = report.status_message();
        let mut dispatch = DispatchReport::default();

        if self.notifiers.is_empty() {
            tracing::info!("No notification channels configured");
            return dispatch;
        }

        for notifier in &self.notifiers {
            let name = notifier.name();
            let mut attempts = 0;
            let result = notifier
                .retry_policy()
                .run(&self.pacer, name, |attempt| {
                    attempts = attempt;
                    notifier.send(&self.title, &message)
                })
                .await;

            let delivered = match result {
                Ok(()) => {
                    tracing::info!(channel = name, attempts, "Notification delivered");
                    true
                }
                Err(e) => {
                    tracing::error!(channel = name, "Notification failed: {e}");
                    false
                }
            };
            dispatch.deliveries.push(ChannelDelivery {
                channel: name.to_string(),
                delivered,
                attempts,
            });
        }

        dispatch
    }
}

fn transport_error(channel: &str, err: &reqwest::Error) -> NotifyError {
    NotifyError::Transport {
        channel: channel.to_string(),
        message: err.to_string(),
    }
}

fn check_status(channel: &str, resp: &reqwest::Response) -> Result<(), NotifyError> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(NotifyError::Status {
            channel: channel.to_string(),
            status: status.as_u16(),
        })
    }
}
