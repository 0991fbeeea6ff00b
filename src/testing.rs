//! Fakes shared by the unit tests.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use crate::error::{BotError, Result};
use crate::github::models::{
    Comment, Issue, IssueQuery, NewIssue, NewRelease, PullQuery, PullRequest, Release, User,
};
use crate::github::{GitHubApi, ReleaseSummarizer};
use crate::token_store::{MemoryStore, TokenBackend, TokenStore};
use crate::types::{Reply, Responder};

const CREATED_AT: &str = "2024-03-01T15:04:05Z";

fn at(timestamp: &str) -> DateTime<Utc> {
    timestamp.parse().expect("valid timestamp")
}

pub fn user() -> User {
    User {
        login: "octo".to_string(),
        html_url: "https://github.com/octo".to_string(),
    }
}

pub fn issue(number: u64, title: &str) -> Issue {
    Issue {
        number,
        title: title.to_string(),
        body: None,
        html_url: format!("https://github.com/acme/app/issues/{number}"),
        user: user(),
        created_at: at(CREATED_AT),
        pull_request: None,
        repository: None,
    }
}

pub fn pull(number: u64, title: &str, merged_at: Option<&str>) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        html_url: format!("https://github.com/acme/app/pull/{number}"),
        user: user(),
        created_at: at(CREATED_AT),
        updated_at: at(merged_at.unwrap_or(CREATED_AT)),
        merged_at: merged_at.map(at),
    }
}

pub fn release(tag_name: &str, published_at: &str) -> Release {
    Release {
        tag_name: tag_name.to_string(),
        name: None,
        body: None,
        html_url: format!("https://github.com/acme/app/releases/tag/{tag_name}"),
        prerelease: false,
        created_at: at(published_at),
        published_at: Some(at(published_at)),
    }
}

pub async fn memory_tokens() -> Arc<TokenStore> {
    let backend = TokenBackend::KeyValue(Arc::new(MemoryStore::new()));
    Arc::new(TokenStore::open(backend).await.expect("memory store opens"))
}

/// A GitHub call recorded by [`FakeGitHub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CurrentUser,
    ListIssues { repo: String, query: IssueQuery },
    CreateIssue { repo: String, issue: NewIssue },
    CloseIssue { repo: String, number: u64 },
    ListPulls { repo: String, query: PullQuery },
    CreateRelease { repo: String, release: NewRelease },
    LatestRelease { repo: String },
    Comment { repo: String, number: u64, body: String },
    ListOrgIssues,
}

struct FakeState {
    calls: Vec<ApiCall>,
    failure: Option<String>,
    issues: Vec<Issue>,
    pulls: Vec<PullRequest>,
    latest_release: Option<Release>,
}

/// In-memory GitHub for the account `acme`, authenticated as `octo`.
pub struct FakeGitHub {
    state: Mutex<FakeState>,
}

impl Default for FakeGitHub {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                calls: Vec::new(),
                failure: None,
                issues: vec![issue(1, "First issue")],
                pulls: vec![pull(2, "Open pull", None)],
                latest_release: Some(release("v0.1.0", CREATED_AT)),
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer every later call with an API error payload carrying `message`.
    pub fn fail_with(&self, message: &str) {
        self.state().failure = Some(message.to_string());
    }

    pub fn set_pulls(&self, pulls: Vec<PullRequest>) {
        self.state().pulls = pulls;
    }

    pub fn set_latest_release(&self, release: Option<Release>) {
        self.state().latest_release = release;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn pull_queries(&self) -> Vec<PullQuery> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::ListPulls { query, .. } => Some(query),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ApiCall) -> Result<()> {
        let mut state = self.state();
        state.calls.push(call);
        match &state.failure {
            Some(message) => Err(BotError::GitHubApi {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    fn account(&self) -> &str {
        "acme"
    }

    async fn current_user(&self, _token: &str) -> Result<User> {
        self.record(ApiCall::CurrentUser)?;
        Ok(user())
    }

    async fn list_issues(&self, _token: &str, repo: &str, query: &IssueQuery) -> Result<Vec<Issue>> {
        self.record(ApiCall::ListIssues {
            repo: repo.to_string(),
            query: query.clone(),
        })?;
        Ok(self.state().issues.clone())
    }

    async fn create_issue(&self, _token: &str, repo: &str, new: &NewIssue) -> Result<Issue> {
        self.record(ApiCall::CreateIssue {
            repo: repo.to_string(),
            issue: new.clone(),
        })?;
        let mut created = issue(10, &new.title);
        created.body = Some(new.body.clone());
        Ok(created)
    }

    async fn close_issue(&self, _token: &str, repo: &str, number: u64) -> Result<Issue> {
        self.record(ApiCall::CloseIssue {
            repo: repo.to_string(),
            number,
        })?;
        Ok(issue(number, "Closed issue"))
    }

    async fn list_pulls(
        &self,
        _token: &str,
        repo: &str,
        query: &PullQuery,
    ) -> Result<Vec<PullRequest>> {
        self.record(ApiCall::ListPulls {
            repo: repo.to_string(),
            query: query.clone(),
        })?;
        let pulls = self.state().pulls.clone();
        let Some(per_page) = query.per_page else {
            return Ok(pulls);
        };
        let per_page = per_page as usize;
        let page = query.page.unwrap_or(1).saturating_sub(1) as usize;
        Ok(pulls
            .into_iter()
            .skip(page * per_page)
            .take(per_page)
            .collect())
    }

    async fn create_release(
        &self,
        _token: &str,
        repo: &str,
        new: &NewRelease,
    ) -> Result<Release> {
        self.record(ApiCall::CreateRelease {
            repo: repo.to_string(),
            release: new.clone(),
        })?;
        let mut created = release(&new.tag_name, CREATED_AT);
        created.name = Some(new.title.clone());
        created.body = Some(new.body.clone());
        created.prerelease = new.prerelease;
        Ok(created)
    }

    async fn latest_release(&self, _token: &str, repo: &str) -> Result<Release> {
        self.record(ApiCall::LatestRelease {
            repo: repo.to_string(),
        })?;
        self.state()
            .latest_release
            .clone()
            .ok_or_else(|| BotError::GitHubApi {
                message: "Not Found".to_string(),
            })
    }

    async fn comment_issue(
        &self,
        _token: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<Comment> {
        self.record(ApiCall::Comment {
            repo: repo.to_string(),
            number,
            body: body.to_string(),
        })?;
        Ok(Comment {
            body: body.to_string(),
            html_url: format!("https://github.com/acme/app/issues/{number}#issuecomment-1"),
            user: user(),
            created_at: at(CREATED_AT),
        })
    }

    async fn list_assigned_org_issues(&self, _token: &str) -> Result<Vec<Issue>> {
        self.record(ApiCall::ListOrgIssues)?;
        Ok(self.state().issues.clone())
    }
}

/// Summary generator returning a fixed text.
pub struct StaticSummarizer {
    output: String,
    failure: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl StaticSummarizer {
    pub fn new(output: &str) -> Self {
        Self {
            output: output.to_string(),
            failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }

    /// Repositories summarized so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ReleaseSummarizer for StaticSummarizer {
    async fn summarize(&self, _token: &str, repo: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(repo.to_string());
        let failure = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match failure {
            Some(message) => Err(BotError::GitHubApi { message }),
            None => Ok(self.output.clone()),
        }
    }
}

/// Summary generator that parks until the test lets it finish.
pub struct GatedSummarizer {
    output: String,
    entered: Notify,
    gate: Notify,
}

impl GatedSummarizer {
    pub fn new(output: &str) -> Self {
        Self {
            output: output.to_string(),
            entered: Notify::new(),
            gate: Notify::new(),
        }
    }

    /// Wait until a summary has been requested.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the parked summary complete.
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl ReleaseSummarizer for GatedSummarizer {
    async fn summarize(&self, _token: &str, _repo: &str) -> Result<String> {
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(self.output.clone())
    }
}

/// Responder that keeps everything it was asked to send.
#[derive(Clone, Default)]
pub struct RecordingResponder {
    replies: Arc<Mutex<Vec<Reply>>>,
}

impl RecordingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn send(&self, reply: Reply) -> Result<()> {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reply);
        Ok(())
    }
}
