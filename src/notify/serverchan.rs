use super::{NotifyFuture, Notifier, SEND_TIMEOUT, check_status, transport_error};
use crate::pacing::{JitterBounds, RetryPolicy};
use regex::Regex;
use std::sync::LazyLock;

const CHANNEL: &str = "serverchan";
const MAX_ATTEMPTS: u32 = 5;
const RETRY_PAUSE: JitterBounds = JitterBounds {
    min: 180.0,
    max: 360.0,
};

static PUSH_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^sct(\d+)t").expect("push key pattern is valid"));

/// Numeric uid embedded in a ServerChan³ push key (`sct<uid>t...`).
pub fn push_uid(push_key: &str) -> Option<String> {
    PUSH_KEY
        .captures(push_key)
        .and_then(|caps| caps.get(1))
        .map(|uid| uid.as_str().to_string())
}

/// ServerChan³ push, retried with long jittered pauses.
pub struct ServerChanNotifier {
    client: reqwest::Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl ServerChanNotifier {
    /// `None` when the key carries no uid.
    pub fn from_key(push_key: &str) -> Option<Self> {
        let uid = push_uid(push_key)?;
        Some(Self::with_endpoint(
            format!("https://{uid}.push.ft07.com/send/{push_key}"),
            RetryPolicy::jittered(MAX_ATTEMPTS, RETRY_PAUSE),
        ))
    }

    pub fn with_endpoint(endpoint: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            retry,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Notifier for ServerChanNotifier {
    fn name(&self) -> &str {
        CHANNEL
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn send<'a>(&'a self, title: &'a str, message: &'a str) -> NotifyFuture<'a> {
        Box::pin(async move {
            let resp = self
                .client
                .get(&self.endpoint)
                .query(&[("title", title), ("desp", message)])
                .timeout(SEND_TIMEOUT)
                .send()
                .await
                .map_err(|e| transport_error(CHANNEL, &e))?;

            check_status(CHANNEL, &resp)?;
            tracing::debug!(channel = CHANNEL, "Push accepted");
            Ok(())
        })
    }
}
