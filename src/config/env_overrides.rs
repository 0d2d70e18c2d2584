use super::{Config, GotifyConfig, ServerChanConfig};
use crate::pacing::JitterBounds;

/// Truthy spellings accepted for opt-in flags such as `DRY_RUN`.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes" | "y"
    )
}

/// `BROWSE_ENABLED` is on unless explicitly switched off.
fn parse_enabled(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "off"
    )
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn var_f64(key: &str) -> Option<f64> {
    non_empty_var(key).and_then(|value| value.parse::<f64>().ok())
}

/// Negative counts clamp to zero; unparseable values keep the current setting.
fn var_count(key: &str) -> Option<u64> {
    non_empty_var(key)
        .and_then(|value| value.parse::<i64>().ok())
        .map(|value| u64::try_from(value).unwrap_or(0))
}

fn override_bounds(bounds: &mut JitterBounds, min_key: &str, max_key: &str) {
    let min = var_f64(min_key).unwrap_or(bounds.min);
    let max = var_f64(max_key).unwrap_or(bounds.max);
    *bounds = JitterBounds::new(min, max);
}

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Some(username) =
            non_empty_var("LINUXDO_USERNAME").or_else(|| non_empty_var("USERNAME"))
        {
            self.forum.username = Some(username);
        }

        if let Some(password) =
            non_empty_var("LINUXDO_PASSWORD").or_else(|| non_empty_var("PASSWORD"))
        {
            self.forum.password = Some(password);
        }

        if let Some(base_url) = non_empty_var("FORUM_BASE_URL") {
            self.forum.base_url = base_url;
        }

        if let Ok(enabled) = std::env::var("BROWSE_ENABLED") {
            self.browse.enabled = parse_enabled(&enabled);
        }

        if let Ok(dry_run) = std::env::var("DRY_RUN") {
            self.browse.dry_run = parse_flag(&dry_run);
        }

        if let Some(max_topics) = var_count("MAX_TOPICS") {
            self.browse.max_topics = usize::try_from(max_topics).unwrap_or(usize::MAX);
        }

        if let Some(steps) = var_count("SCROLL_STEPS") {
            self.browse.scroll_steps = u32::try_from(steps).unwrap_or(u32::MAX);
        }

        override_bounds(
            &mut self.pacing.topic_delay,
            "TOPIC_DELAY_MIN",
            "TOPIC_DELAY_MAX",
        );
        override_bounds(
            &mut self.pacing.scroll_delay,
            "SCROLL_DELAY_MIN",
            "SCROLL_DELAY_MAX",
        );
        override_bounds(&mut self.pacing.backoff, "BACKOFF_MIN", "BACKOFF_MAX");
        override_bounds(
            &mut self.pacing.post_target,
            "POST_TARGET_MIN",
            "POST_TARGET_MAX",
        );

        if let Some(session) = non_empty_var("AGENT_BROWSER_SESSION") {
            self.browser.session = session;
        }

        if let (Some(url), Some(token)) = (non_empty_var("GOTIFY_URL"), non_empty_var("GOTIFY_TOKEN"))
        {
            self.notify.gotify = Some(GotifyConfig { url, token });
        }

        if let Some(push_key) = non_empty_var("SC3_PUSH_KEY") {
            self.notify.serverchan = Some(ServerChanConfig { push_key });
        }
    }
}
