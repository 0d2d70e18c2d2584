use crate::pacing::PacingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path the config was read from - not serialized
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub forum: ForumConfig,

    #[serde(default)]
    pub browse: BrowseConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub notify: NotifyConfig,
}

// ── Forum account ────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct ForumConfig {
    /// Forum root, with trailing slash (default: `https://linux.do/`)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub username: Option<String>,
    /// Never written back out
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

fn default_base_url() -> String {
    "https://linux.do/".into()
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: None,
            password: None,
        }
    }
}

impl std::fmt::Debug for ForumConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForumConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

// ── Visitation phase ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseConfig {
    /// Run the visitation phase at all (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Upper bound on topics visited per run (default: 50)
    #[serde(default = "default_max_topics")]
    pub max_topics: usize,
    /// Scroll steps per topic (default: 2)
    #[serde(default = "default_scroll_steps")]
    pub scroll_steps: u32,
    /// Skip the engagement signal entirely (default: false)
    #[serde(default)]
    pub dry_run: bool,
    /// Per-topic probability of sending the engagement signal
    #[serde(default = "default_engage_probability")]
    pub engage_probability: f64,
    /// Attempts per topic before it counts as failed (default: 3)
    #[serde(default = "default_visit_attempts")]
    pub visit_attempts: u32,
}

fn default_true() -> bool {
    true
}

fn default_max_topics() -> usize {
    50
}

fn default_scroll_steps() -> u32 {
    2
}

fn default_engage_probability() -> f64 {
    0.3
}

fn default_visit_attempts() -> u32 {
    3
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_topics: default_max_topics(),
            scroll_steps: default_scroll_steps(),
            dry_run: false,
            engage_probability: default_engage_probability(),
            visit_attempts: default_visit_attempts(),
        }
    }
}

// ── Browsing engine ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// agent-browser executable (default: `agent-browser`)
    #[serde(default = "default_browser_binary")]
    pub binary: String,
    /// agent-browser session holding the forum cookies
    #[serde(default = "default_browser_session")]
    pub session: String,
}

fn default_browser_binary() -> String {
    "agent-browser".into()
}

fn default_browser_session() -> String {
    "ambler".into()
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            binary: default_browser_binary(),
            session: default_browser_session(),
        }
    }
}

// ── Notification channels ────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub gotify: Option<GotifyConfig>,
    #[serde(default)]
    pub serverchan: Option<ServerChanConfig>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GotifyConfig {
    pub url: String,
    pub token: String,
}

impl std::fmt::Debug for GotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GotifyConfig")
            .field("url", &self.url)
            .field("token", &"***")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ServerChanConfig {
    pub push_key: String,
}

impl std::fmt::Debug for ServerChanConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerChanConfig")
            .field("push_key", &"***")
            .finish()
    }
}
