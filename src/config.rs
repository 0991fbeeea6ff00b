use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, error, info};
use url::Url;

use crate::error::{BotError, Result};

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_RELEASE_BRANCH: &str = "master";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub github: GitHubConfig,
    /// JSON file holding the access tokens. `None` keeps them in the in-process store.
    pub token_file: Option<PathBuf>,
}

/// Settings shared by every GitHub call.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub account: String,
    pub api_url: Url,
    pub release_branch: String,
    pub timeout: Duration,
}

impl Config {
    /// Load the configuration from the process environment and `.env`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a required variable is missing or a value is invalid.
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Empty or whitespace-only values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `DISCORD_TOKEN` or `GITHUB_ACCOUNT` is missing, or if
    /// `GITHUB_API_URL` or `GITHUB_TIMEOUT_SECS` cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let discord_token = var("DISCORD_TOKEN").ok_or_else(|| {
            error!("Failed to load DISCORD_TOKEN from environment");
            BotError::Config("DISCORD_TOKEN is not set".to_string())
        })?;

        let account = var("GITHUB_ACCOUNT")
            .map(|account| account.trim().to_string())
            .ok_or_else(|| {
                error!("Failed to load GITHUB_ACCOUNT from environment");
                BotError::Config("GITHUB_ACCOUNT is not set".to_string())
            })?;

        let api_url = var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(api_url.trim())
            .map_err(|e| BotError::Config(format!("GITHUB_API_URL is invalid: {e}")))?;

        let release_branch = var("GITHUB_RELEASE_BRANCH")
            .map_or_else(|| DEFAULT_RELEASE_BRANCH.to_string(), |b| b.trim().to_string());

        let timeout = match var("GITHUB_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    BotError::Config(format!(
                        "GITHUB_TIMEOUT_SECS must be a positive integer, got '{raw}'"
                    ))
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let token_file = var("GITHUB_TOKEN_FILE").map(|path| PathBuf::from(path.trim()));

        info!("Configuration loaded successfully");
        debug!("Discord token length: {} characters", discord_token.len());
        debug!("GitHub account: {account}");
        debug!("GitHub API URL: {api_url}");
        debug!("Release branch: {release_branch}");
        debug!("Request timeout: {timeout}s");
        match &token_file {
            Some(path) => debug!("Token storage: file {}", path.display()),
            None => debug!("Token storage: in-process key-value store"),
        }

        Ok(Self {
            discord_token,
            github: GitHubConfig {
                account,
                api_url,
                release_branch,
                timeout: Duration::from_secs(timeout),
            },
            token_file,
        })
    }
}
