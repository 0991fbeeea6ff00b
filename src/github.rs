//! GitHub REST access: client, payload models and release summaries.

mod client;
pub mod models;
mod response;
mod summary;

use async_trait::async_trait;

use crate::error::Result;

use models::{
    Comment, Issue, IssueQuery, NewIssue, NewRelease, PullQuery, PullRequest, Release, User,
};

pub use client::GitHubClient;
pub use response::decode;
pub use summary::{MergedPullSummary, ReleaseSummarizer};

/// Operations the bot performs against GitHub on behalf of a user.
///
/// Repository names are bare names; the implementation scopes them to its
/// configured account. API error payloads surface as `BotError::GitHubApi`.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Account or organization every repository call is scoped to.
    fn account(&self) -> &str;

    async fn current_user(&self, token: &str) -> Result<User>;

    async fn list_issues(&self, token: &str, repo: &str, query: &IssueQuery) -> Result<Vec<Issue>>;

    async fn create_issue(&self, token: &str, repo: &str, issue: &NewIssue) -> Result<Issue>;

    /// Close an issue or pull request.
    async fn close_issue(&self, token: &str, repo: &str, number: u64) -> Result<Issue>;

    async fn list_pulls(&self, token: &str, repo: &str, query: &PullQuery)
    -> Result<Vec<PullRequest>>;

    async fn create_release(&self, token: &str, repo: &str, release: &NewRelease)
    -> Result<Release>;

    async fn latest_release(&self, token: &str, repo: &str) -> Result<Release>;

    /// Comment on an issue or pull request.
    async fn comment_issue(&self, token: &str, repo: &str, number: u64, body: &str)
    -> Result<Comment>;

    /// Issues across the organization assigned to the token's owner.
    async fn list_assigned_org_issues(&self, token: &str) -> Result<Vec<Issue>>;
}
