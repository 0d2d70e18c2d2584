mod env_overrides;
mod loader;
pub mod schema;
#[cfg(test)]
mod test_env;

pub use crate::pacing::PacingConfig;
pub use schema::{
    BrowseConfig, BrowserConfig, Config, ForumConfig, GotifyConfig, NotifyConfig,
    ServerChanConfig,
};

use zeroize::Zeroizing;

/// Forum account used for the session login.
pub struct Credentials {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
