//! Process-environment helpers for override tests.
//!
//! Every test that touches the environment holds [`ENV_LOCK`] for its whole
//! body; guards restore the previous value when dropped.

use std::sync::{LazyLock, Mutex};

pub(super) static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Writes or removes one variable.
fn write_var(key: &str, value: Option<&str>) {
    // SAFETY: only called from tests holding ENV_LOCK, so no other thread
    // reads or writes the environment concurrently.
    unsafe {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

/// Scoped change to one environment variable.
pub(super) struct EnvVarGuard {
    key: &'static str,
    saved: Option<String>,
}

impl EnvVarGuard {
    fn replace(key: &'static str, value: Option<&str>) -> Self {
        let saved = std::env::var(key).ok();
        write_var(key, value);
        Self { key, saved }
    }

    pub(super) fn set(key: &'static str, value: &str) -> Self {
        Self::replace(key, Some(value))
    }

    pub(super) fn unset(key: &'static str) -> Self {
        Self::replace(key, None)
    }

    /// Clears every key until the returned guards drop.
    pub(super) fn unset_all(keys: &[&'static str]) -> Vec<Self> {
        keys.iter().map(|key| Self::unset(key)).collect()
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        write_var(self.key, self.saved.as_deref());
    }
}
