//! Runtime configuration
//!
//! Every setting can be given as a command line flag or through the
//! environment. Nothing is read from files.

use crate::error::{Error, Result};
use crate::git::{CommitIdentity, Credentials};
use crate::platform::DEFAULT_API_URL;
use crate::worker::DEFAULT_QUEUE_CAPACITY;
use clap::Parser;
use std::path::PathBuf;
use url::Url;

/// Cascading merges across release branches for Bitbucket repositories
#[derive(Parser, Clone)]
#[command(name = "cascade-merge")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Shared secret expected in the `token` query parameter of webhooks
    #[arg(long, env = "TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// Bitbucket username, used for the API and for HTTPS git remotes
    #[arg(long, env = "BITBUCKET_USERNAME", default_value = "")]
    pub bitbucket_username: String,

    /// Bitbucket app password
    #[arg(
        long,
        env = "BITBUCKET_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    pub bitbucket_password: String,

    /// Bitbucket REST API base URL
    #[arg(long, env = "BITBUCKET_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Clone link protocol to use (https or ssh)
    #[arg(long, env = "CLONE_PROTOCOL", default_value = "https")]
    pub clone_protocol: String,

    /// Number of merge events buffered before webhooks get 429
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Directory holding the per-repository working copies
    /// (defaults to the system temp directory)
    #[arg(long, env = "CASCADE_WORKDIR")]
    pub workdir: Option<PathBuf>,

    /// Name recorded on merge commits
    #[arg(long, env = "GIT_AUTHOR_NAME", default_value = "cascade-merge")]
    pub git_author_name: String,

    /// Email recorded on merge commits
    #[arg(
        long,
        env = "GIT_AUTHOR_EMAIL",
        default_value = "cascade-merge@localhost"
    )]
    pub git_author_email: String,
}

// Hand-written so secrets never reach logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("token", &"***")
            .field("bitbucket_username", &self.bitbucket_username)
            .field("bitbucket_password", &"***")
            .field("api_url", &self.api_url)
            .field("clone_protocol", &self.clone_protocol)
            .field("queue_capacity", &self.queue_capacity)
            .field("workdir", &self.workdir)
            .field("git_author_name", &self.git_author_name)
            .field("git_author_email", &self.git_author_email)
            .finish()
    }
}

impl Config {
    /// Check values clap cannot validate on its own
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "BITBUCKET_API_URL must be http(s), got {}",
                self.api_url
            )));
        }
        if self.queue_capacity == 0 {
            return Err(Error::Config("QUEUE_CAPACITY must be at least 1".into()));
        }
        if self.clone_protocol.trim().is_empty() {
            return Err(Error::Config("CLONE_PROTOCOL must not be empty".into()));
        }
        Ok(())
    }

    /// Credentials for HTTPS remotes, if a username is configured
    pub fn credentials(&self) -> Option<Credentials> {
        if self.bitbucket_username.is_empty() {
            return None;
        }
        Some(Credentials {
            username: self.bitbucket_username.clone(),
            password: self.bitbucket_password.clone(),
        })
    }

    /// Identity for merge commits
    pub fn identity(&self) -> CommitIdentity {
        CommitIdentity {
            name: self.git_author_name.clone(),
            email: self.git_author_email.clone(),
        }
    }

    /// Base directory for working copies
    pub fn workdir(&self) -> PathBuf {
        self.workdir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
