use super::{Config, Credentials};
use crate::error::ConfigError;
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;
use zeroize::Zeroizing;

impl Config {
    /// `~/.ambler/config.toml`, when a home directory can be resolved.
    pub fn default_config_path() -> Option<PathBuf> {
        UserDirs::new().map(|u| u.home_dir().join(".ambler").join("config.toml"))
    }

    /// Loads the effective configuration for one run.
    ///
    /// An explicit path must exist; the default path is optional. Environment
    /// overrides are applied on top of the file, then bounds are normalized.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.normalize();
        config.base_url()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Clamps every bound into a usable range.
    pub fn normalize(&mut self) {
        self.pacing = self.pacing.normalized();
        self.browse.visit_attempts = self.browse.visit_attempts.max(1);
        self.browse.engage_probability = if self.browse.engage_probability.is_finite() {
            self.browse.engage_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if !self.forum.base_url.ends_with('/') {
            self.forum.base_url.push('/');
        }
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.forum.base_url).map_err(|e| ConfigError::BaseUrl {
            url: self.forum.base_url.clone(),
            message: e.to_string(),
        })
    }

    /// Account credentials; required before any work begins.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        match (&self.forum.username, &self.forum.password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Ok(Credentials {
                    username: username.clone(),
                    password: Zeroizing::new(password.clone()),
                })
            }
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    /// TOML rendering with notifier secrets masked.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if let Some(gotify) = shown.notify.gotify.as_mut() {
            gotify.token = "***".into();
        }
        if let Some(serverchan) = shown.notify.serverchan.as_mut() {
            serverchan.push_key = "***".into();
        }
        toml::to_string_pretty(&shown).map_err(|e| ConfigError::Load(e.to_string()))
    }
}
