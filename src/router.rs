//! Routing of chat commands to GitHub calls and new sessions.

mod command;

use std::sync::Arc;

use log::{info, warn};
use poise::serenity_prelude::UserId;

use crate::error::Result;
use crate::github::models::{IssueQuery, PullQuery};
use crate::github::{GitHubApi, ReleaseSummarizer};
use crate::render;
use crate::session::{self, Session, SessionStore};
use crate::token_store::TokenStore;
use crate::types::{Reply, Responder};

pub use command::{Action, Command};

pub const MISSING_TOKEN: &str = "setup your access token with `github token` cmd first";

pub const TOKEN_INSTRUCTIONS: &str = "please setup a access token via \
    [settings page](https://github.com/settings/tokens). then use `github token (your token)` \
    to store your token. \
    [docs](https://help.github.com/articles/creating-a-personal-access-token-for-the-command-line/)";

pub const TOKEN_STORED: &str = "your access token was stored successfully.";

const LGTM: &str = "LGTM";

pub const HELP: &str = "\
`github token [token]` - store your GitHub personal access token (best sent in a direct message)
`github issue new <repo>` - open a new issue
`github issue list <repo>` - list open issues
`github issue mine <repo>` - list issues assigned to you
`github issue all` - list issues assigned to you across the organization
`github issue close <repo> <number>` - close an issue or pull request
`github issue lgtm <repo> <number>` - comment LGTM on an issue or pull request
`github issue comment <repo> <number>` - comment on an issue or pull request
`github issue pr <repo>` - list pull requests
`github release new <repo>` - create a release
`github release latest <repo>` - show the latest release
`github release check <repo>` - list pull requests merged since the latest release
Reply `exit` or `quit` to abandon a question.";

pub struct CommandRouter {
    api: Arc<dyn GitHubApi>,
    summarizer: Arc<dyn ReleaseSummarizer>,
    sessions: Arc<dyn SessionStore>,
    tokens: Arc<TokenStore>,
}

impl CommandRouter {
    pub fn new(
        api: Arc<dyn GitHubApi>,
        summarizer: Arc<dyn ReleaseSummarizer>,
        sessions: Arc<dyn SessionStore>,
        tokens: Arc<TokenStore>,
    ) -> Self {
        Self {
            api,
            summarizer,
            sessions,
            tokens,
        }
    }

    /// Run a parsed command for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store, a GitHub call, or a reply fails.
    pub async fn dispatch(
        &self,
        user: UserId,
        command: Command,
        responder: &dyn Responder,
    ) -> Result<()> {
        match command {
            Command::Help => responder.send(Reply::say(HELP)).await,
            Command::Token(None) => responder.send(Reply::say(TOKEN_INSTRUCTIONS)).await,
            Command::Token(Some(token)) => {
                self.tokens.set(user, &token).await?;
                responder.send(Reply::direct(TOKEN_STORED)).await
            }
            Command::Action(action) => {
                let Some(token) = self.tokens.get(user).await? else {
                    info!("User {user} has no token for {}", action.name());
                    return responder.send(Reply::direct(MISSING_TOKEN)).await;
                };
                info!("User {user} invoked {}", action.name());
                self.run(user, &token, action, responder).await
            }
        }
    }

    async fn run(
        &self,
        user: UserId,
        token: &str,
        action: Action,
        responder: &dyn Responder,
    ) -> Result<()> {
        match action {
            Action::IssueNew { repo } => {
                self.start_session(user, Session::issue_new(repo), responder)
                    .await
            }
            Action::IssueComment { repo, number } => {
                self.start_session(user, Session::issue_comment(repo, number), responder)
                    .await
            }
            Action::ReleaseNew { repo } => {
                self.start_session(user, Session::release_new(repo), responder)
                    .await
            }
            Action::IssueList { repo } => {
                let issues = self
                    .api
                    .list_issues(token, &repo, &IssueQuery::default())
                    .await?;
                responder.send(render::issue_list(&repo, &issues)).await
            }
            Action::IssueMine { repo } => {
                let me = self.api.current_user(token).await?;
                let query = IssueQuery {
                    assignee: Some(me.login),
                };
                let issues = self.api.list_issues(token, &repo, &query).await?;
                responder.send(render::issue_list(&repo, &issues)).await
            }
            Action::IssueAll => {
                let issues = self.api.list_assigned_org_issues(token).await?;
                responder
                    .send(render::org_issue_list(self.api.account(), &issues))
                    .await
            }
            Action::IssueClose { repo, number } => {
                let issue = self.api.close_issue(token, &repo, number).await?;
                responder.send(render::issue_closed(&repo, &issue)).await
            }
            Action::IssueLgtm { repo, number } => {
                let comment = self.api.comment_issue(token, &repo, number, LGTM).await?;
                responder
                    .send(render::comment_created(&repo, number, &comment))
                    .await
            }
            Action::IssuePulls { repo } => {
                let pulls = self
                    .api
                    .list_pulls(token, &repo, &PullQuery::default())
                    .await?;
                responder.send(render::pull_list(&repo, &pulls)).await
            }
            Action::ReleaseLatest { repo } => {
                let release = self.api.latest_release(token, &repo).await?;
                responder.send(render::latest_release(&repo, &release)).await
            }
            Action::ReleaseCheck { repo } => {
                responder
                    .send(Reply::say(format!(
                        "Checking new merged pull requests after latest release of {repo}, \
                         wait a moment......"
                    )))
                    .await?;
                let summary = self.summarizer.summarize(token, &repo).await?;
                responder.send(Reply::Say(summary)).await
            }
        }
    }

    /// Open a session, replacing any unfinished one with a notice.
    async fn start_session(
        &self,
        user: UserId,
        session: Session,
        responder: &dyn Responder,
    ) -> Result<()> {
        let prompt = session::prompt(&session);
        let step = session.step();
        if let Some(previous) = self.sessions.set(user, session) {
            warn!(
                "User {user} abandoned session at {} by starting {step}",
                previous.step()
            );
            responder
                .send(Reply::say(format!(
                    "Discarded your unfinished `{}` dialogue.",
                    previous.command()
                )))
                .await?;
        }
        responder.send(Reply::Say(prompt)).await
    }
}
