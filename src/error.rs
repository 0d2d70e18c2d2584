use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `Ambler`.
///
/// Each component defines its own error kind and recovers from it as close to
/// the origin as it can. Only the variants that make the remaining run
/// meaningless reach this level.
#[derive(Debug, Error)]
pub enum AmblerError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Forum session / listing ─────────────────────────────────────────
    #[error("forum: {0}")]
    Forum(#[from] ForumError),

    // ── Browsing engine ─────────────────────────────────────────────────
    #[error("browser: {0}")]
    Browser(#[from] BrowserError),

    // ── Visitation phase ────────────────────────────────────────────────
    #[error("schedule: {0}")]
    Schedule(#[from] ScheduleError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credentials: set LINUXDO_USERNAME and LINUXDO_PASSWORD")]
    MissingCredentials,

    #[error("failed to load config: {0}")]
    Load(String),

    #[error("invalid forum base url {url}: {message}")]
    BaseUrl { url: String, message: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Forum errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ForumError {
    #[error("request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("{endpoint} returned an unparseable payload: {message}")]
    Payload { endpoint: String, message: String },

    #[error("login rejected: {0}")]
    LoginRejected(String),
}

// ─── Browser errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("script failed: {0}")]
    Script(String),

    #[error("element {selector}: {message}")]
    Element { selector: String, message: String },

    #[error("browser process failed: {0}")]
    Process(String),

    #[error("unreadable browser output: {0}")]
    Output(String),
}

impl BrowserError {
    /// Page-level failures a visit is expected to hit from time to time.
    ///
    /// Process and output errors point at a broken browsing engine and are
    /// logged separately from these.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::Navigation { .. } | Self::Script(_) | Self::Element { .. }
        )
    }
}

// ─── Candidate fetch errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fallback listing container {selector} not found")]
    FallbackContainerMissing { selector: String },

    #[error("fallback listing unavailable: {0}")]
    FallbackUnavailable(#[from] BrowserError),
}

// ─── Visit errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum VisitError {
    #[error("could not open browsing context: {0}")]
    Context(#[source] BrowserError),

    #[error("visit to {url} failed: {source}")]
    Page {
        url: String,
        #[source]
        source: BrowserError,
    },
}

impl VisitError {
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Context(source) | Self::Page { source, .. } => source.is_expected(),
        }
    }
}

// ─── Scheduler errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("no candidate topics found")]
    NoCandidates,

    #[error("candidate fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

// ─── Notification errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{channel} rejected the message with status {status}")]
    Status { channel: String, status: u16 },

    #[error("{channel} request failed: {message}")]
    Transport { channel: String, message: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, AmblerError>;
