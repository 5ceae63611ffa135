//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use crate::app::Settings;

#[derive(Debug, Clone, Parser)]
#[command(name = "chirp")]
#[command(about = "Browse and post to a short-post social feed from the terminal")]
pub struct Config {
    /// Base URL of a tRPC backend; without it an in-memory feed is used
    #[arg(long, env = "CHIRP_REMOTE")]
    pub remote: Option<String>,

    /// Session token sent to the remote backend
    #[arg(long, env = "CHIRP_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Id of the signed-in user
    #[arg(long, env = "CHIRP_USER_ID", default_value = "user_local")]
    pub user_id: String,

    /// Username of the signed-in user; you will be asked for one before posting if unset
    #[arg(long, env = "CHIRP_USERNAME")]
    pub username: Option<String>,

    /// Posts per page
    #[arg(long, default_value_t = 10)]
    pub page_size: usize,

    /// Seconds between new-post checks (0 disables them)
    #[arg(long, default_value_t = 10)]
    pub poll_interval: u64,

    /// Where to write logs
    #[arg(long, env = "CHIRP_LOG", default_value = "chirp.log")]
    pub log_file: PathBuf,

    /// Start the in-memory feed without demo posts
    #[arg(long)]
    pub no_demo: bool,

    /// In-memory feed only: a demo author posts every N seconds (0 = off)
    #[arg(long, default_value_t = 0)]
    pub chatter: u64,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.page_size) {
            bail!("--page-size must be between 1 and 100, got {}", self.page_size);
        }
        if self.poll_interval > 300 {
            bail!(
                "--poll-interval must be at most 300 seconds, got {}",
                self.poll_interval
            );
        }
        if self.user_id.trim().is_empty() {
            bail!("--user-id must not be empty");
        }
        if self.remote.is_some() && self.chatter > 0 {
            bail!("--chatter only applies to the in-memory feed");
        }
        Ok(())
    }

    pub fn settings(&self) -> Settings {
        Settings {
            page_size: self.page_size,
            poll_interval: (self.poll_interval > 0).then(|| Duration::from_secs(self.poll_interval)),
        }
    }
}
