use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::config::GitHubConfig;
use crate::error::Result;

use super::GitHubApi;
use super::models::{
    Comment, Issue, IssueQuery, IssueStatePatch, NewComment, NewIssue, NewRelease, PullQuery,
    PullRequest, Release, User,
};
use super::response::decode;

const USER_AGENT_VALUE: &str = concat!("ghbot/", env!("CARGO_PKG_VERSION"));
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Stateless GitHub REST client scoped to one account.
///
/// The caller's token is passed on every call, so one client serves all users.
pub struct GitHubClient {
    client: reqwest::Client,
    api_base: String,
    account: String,
}

impl GitHubClient {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_url.as_str().trim_end_matches('/').to_string(),
            account: config.account.clone(),
        })
    }

    fn repo_url(&self, repo: &str, path: &str) -> String {
        format!("{}/repos/{}/{repo}{path}", self.api_base, self.account)
    }

    fn request(&self, method: Method, url: &str, token: &str) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;
        debug!(
            "GitHub responded {status} for {} ({} bytes)",
            url.path(),
            body.len()
        );
        decode(&body)
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    fn account(&self) -> &str {
        &self.account
    }

    async fn current_user(&self, token: &str) -> Result<User> {
        let url = format!("{}/user", self.api_base);
        self.send(self.request(Method::GET, &url, token)).await
    }

    async fn list_issues(&self, token: &str, repo: &str, query: &IssueQuery) -> Result<Vec<Issue>> {
        let url = self.repo_url(repo, "/issues");
        self.send(self.request(Method::GET, &url, token).query(query))
            .await
    }

    async fn create_issue(&self, token: &str, repo: &str, issue: &NewIssue) -> Result<Issue> {
        let url = self.repo_url(repo, "/issues");
        self.send(self.request(Method::POST, &url, token).json(issue))
            .await
    }

    async fn close_issue(&self, token: &str, repo: &str, number: u64) -> Result<Issue> {
        let url = self.repo_url(repo, &format!("/issues/{number}"));
        let patch = IssueStatePatch { state: "closed" };
        self.send(self.request(Method::PATCH, &url, token).json(&patch))
            .await
    }

    async fn list_pulls(
        &self,
        token: &str,
        repo: &str,
        query: &PullQuery,
    ) -> Result<Vec<PullRequest>> {
        let url = self.repo_url(repo, "/pulls");
        self.send(self.request(Method::GET, &url, token).query(query))
            .await
    }

    async fn create_release(
        &self,
        token: &str,
        repo: &str,
        release: &NewRelease,
    ) -> Result<Release> {
        let url = self.repo_url(repo, "/releases");
        self.send(self.request(Method::POST, &url, token).json(release))
            .await
    }

    async fn latest_release(&self, token: &str, repo: &str) -> Result<Release> {
        let url = self.repo_url(repo, "/releases/latest");
        self.send(self.request(Method::GET, &url, token)).await
    }

    async fn comment_issue(
        &self,
        token: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<Comment> {
        let url = self.repo_url(repo, &format!("/issues/{number}/comments"));
        self.send(
            self.request(Method::POST, &url, token)
                .json(&NewComment { body }),
        )
        .await
    }

    async fn list_assigned_org_issues(&self, token: &str) -> Result<Vec<Issue>> {
        let url = format!("{}/orgs/{}/issues", self.api_base, self.account);
        self.send(
            self.request(Method::GET, &url, token)
                .query(&[("filter", "assigned")]),
        )
        .await
    }
}
