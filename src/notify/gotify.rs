use super::{NotifyFuture, Notifier, SEND_TIMEOUT, check_status, transport_error};
use serde_json::json;

const CHANNEL: &str = "gotify";

/// Gotify application message, delivered once.
pub struct GotifyNotifier {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl GotifyNotifier {
    pub fn new(url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/message", url.trim_end_matches('/')),
            token: token.to_string(),
        }
    }
}

impl Notifier for GotifyNotifier {
    fn name(&self) -> &str {
        CHANNEL
    }

    fn send<'a>(&'a self, title: &'a str, message: &'a str) -> NotifyFuture<'a> {
        Box::pin(async move {
            let body = json!({
                "title": title,
                "message": message,
                "priority": 1,
            });

            let resp = self
                .client
                .post(&self.endpoint)
                .query(&[("token", self.token.as_str())])
                .json(&body)
                .timeout(SEND_TIMEOUT)
                .send()
                .await
                .map_err(|e| transport_error(CHANNEL, &e))?;

            check_status(CHANNEL, &resp)
        })
    }
}
