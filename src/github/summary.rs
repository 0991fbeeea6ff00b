//! Merged pull request summaries used for release notes.

use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;

use crate::error::{BotError, Result};

use super::GitHubApi;
use super::models::{PullQuery, PullRequest, PullSort, PullState, SortDirection};

const PULLS_PER_PAGE: u32 = 100;

/// Produces the list of pull requests merged since the latest release.
#[async_trait]
pub trait ReleaseSummarizer: Send + Sync {
    async fn summarize(&self, token: &str, repo: &str) -> Result<String>;
}

/// Summary generator built on the GitHub API.
pub struct MergedPullSummary {
    api: Arc<dyn GitHubApi>,
    branch: String,
}

impl MergedPullSummary {
    pub fn new(api: Arc<dyn GitHubApi>, branch: impl Into<String>) -> Self {
        Self {
            api,
            branch: branch.into(),
        }
    }

    /// Closed pull requests against the branch, most recently updated first.
    ///
    /// Paging stops at a short page or at a page last touched before `since`.
    /// A pull request merged after `since` was also updated after it, so no
    /// later page can hold one.
    async fn closed_pulls_since(
        &self,
        token: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PullRequest>> {
        let mut pulls = Vec::new();
        for page in 1.. {
            let query = PullQuery {
                state: PullState::Closed,
                base: Some(self.branch.clone()),
                sort: Some(PullSort::Updated),
                direction: Some(SortDirection::Desc),
                per_page: Some(PULLS_PER_PAGE),
                page: Some(page),
            };
            let batch = self.api.list_pulls(token, repo, &query).await?;
            let full = batch.len() >= PULLS_PER_PAGE as usize;
            let stale = batch
                .iter()
                .all(|pull| !is_after(pull.updated_at, since));
            pulls.extend(batch);
            if !full || stale {
                break;
            }
            debug!("Fetching page {} of closed pull requests for {repo}", page + 1);
        }
        Ok(pulls)
    }
}

#[async_trait]
impl ReleaseSummarizer for MergedPullSummary {
    async fn summarize(&self, token: &str, repo: &str) -> Result<String> {
        let latest = match self.api.latest_release(token, repo).await {
            Ok(release) => Some(release),
            Err(BotError::GitHubApi { message }) if message == "Not Found" => None,
            Err(e) => return Err(e),
        };
        let since = latest
            .as_ref()
            .map(|release| release.published_at.unwrap_or(release.created_at));

        let pulls = self.closed_pulls_since(token, repo, since).await?;
        debug!(
            "Summarizing {} closed pull requests for {}/{repo}",
            pulls.len(),
            self.api.account()
        );

        let mut merged: Vec<_> = pulls
            .iter()
            .filter_map(|pull| pull.merged_at.map(|merged_at| (merged_at, pull)))
            .filter(|(merged_at, _)| is_after(*merged_at, since))
            .collect();
        merged.sort_by_key(|(merged_at, _)| *merged_at);

        let since_label = latest.as_ref().map_or_else(
            || "the beginning".to_string(),
            |release| release.tag_name.clone(),
        );

        if merged.is_empty() {
            return Ok(format!(
                "No pull requests merged into {} since {since_label}.",
                self.branch
            ));
        }

        let mut output = format!(
            "Pull requests merged into {} since {since_label}:",
            self.branch
        );
        for (_, pull) in merged {
            let _ = write!(
                output,
                "\n- #{} {} (@{})",
                pull.number, pull.title, pull.user.login
            );
        }
        Ok(output)
    }
}

fn is_after(merged_at: DateTime<Utc>, since: Option<DateTime<Utc>>) -> bool {
    since.is_none_or(|since| merged_at > since)
}
