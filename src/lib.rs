#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

pub mod app;
pub mod browser;
pub mod candidates;
pub mod config;
pub mod error;
pub mod forum;
pub mod notify;
pub mod pacing;
pub mod scheduler;
pub mod visit;

pub use app::{App, Collaborators, RunOutcome};
pub use config::Config;
pub use error::{AmblerError, Result};
