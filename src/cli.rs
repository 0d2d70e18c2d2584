use ambler::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// `Ambler` - paced forum topic visits with a status push at the end.
#[derive(Parser, Debug)]
#[command(name = "ambler")]
#[command(version = "0.1.0")]
#[command(about = "Log in, wander through recent topics, report.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.ambler/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in, visit topics and send the status notification (default)
    Run(RunArgs),

    /// Print the effective configuration with secrets masked
    Config,
}

impl Default for Commands {
    fn default() -> Self {
        Self::Run(RunArgs::default())
    }
}

#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// Never click reactions
    #[arg(long)]
    pub dry_run: bool,

    /// Upper bound on visited topics for this run
    #[arg(long)]
    pub max_topics: Option<usize>,

    /// Skip the browsing phase, only log in and notify
    #[arg(long)]
    pub no_browse: bool,
}

impl RunArgs {
    /// Command-line flags win over file and environment.
    pub fn apply(&self, config: &mut Config) {
        if self.dry_run {
            config.browse.dry_run = true;
        }
        if let Some(max_topics) = self.max_topics {
            config.browse.max_topics = max_topics;
        }
        if self.no_browse {
            config.browse.enabled = false;
        }
    }
}
