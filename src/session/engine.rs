//! Drives active sessions with the user's replies.

use std::sync::Arc;

use log::{debug, info};
use poise::serenity_prelude::UserId;

use crate::error::Result;
use crate::github::{GitHubApi, ReleaseSummarizer};
use crate::render;
use crate::router::MISSING_TOKEN;
use crate::token_store::TokenStore;
use crate::types::{Reply, Responder};

use super::state::Session;
use super::store::SessionStore;
use super::transition::{Effect, Transition, resume_with_summary, transition};

pub struct SessionEngine {
    api: Arc<dyn GitHubApi>,
    summarizer: Arc<dyn ReleaseSummarizer>,
    sessions: Arc<dyn SessionStore>,
    tokens: Arc<TokenStore>,
}

impl SessionEngine {
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

    /// Feed a reply to the user's active session.
    ///
    /// Returns `false` when the user has no session. Sessions ended by the
    /// reply are cleared before any GitHub call, so a failed call never
    /// leaves them behind.
    ///
    /// # Errors
    ///
    /// Returns an error if a GitHub call, the token lookup, or a reply fails.
    pub async fn handle_reply(
        &self,
        user: UserId,
        reply: &str,
        responder: &dyn Responder,
    ) -> Result<bool> {
        let Some(session) = self.sessions.get(user) else {
            return Ok(false);
        };

        let from = session.step();
        let result = transition(session, reply);
        match &result.next {
            Some(next) => debug!("Session for {user}: {from} -> {}", next.step()),
            None => info!("Session for {user} ended at {from}"),
        }
        self.apply(user, result, responder).await?;
        Ok(true)
    }

    async fn apply(
        &self,
        user: UserId,
        result: Transition,
        responder: &dyn Responder,
    ) -> Result<()> {
        let Transition {
            next,
            effect,
            prompt,
        } = result;

        self.store(user, next);
        if let Some(prompt) = prompt {
            responder.send(Reply::Say(prompt)).await?;
        }

        match effect {
            Some(effect) => self.run_effect(user, effect, responder).await,
            None => Ok(()),
        }
    }

    fn store(&self, user: UserId, next: Option<Session>) {
        match next {
            Some(next) => {
                self.sessions.set(user, next);
            }
            None => {
                self.sessions.remove(user);
            }
        }
    }

    async fn run_effect(
        &self,
        user: UserId,
        effect: Effect,
        responder: &dyn Responder,
    ) -> Result<()> {
        let Some(token) = self.tokens.get(user).await? else {
            return responder.send(Reply::direct(MISSING_TOKEN)).await;
        };

        match effect {
            Effect::CreateIssue { repo, issue } => {
                let created = self.api.create_issue(&token, &repo, &issue).await?;
                info!("Opened issue #{} in {repo} for {user}", created.number);
                responder.send(render::issue_opened(&repo, &created)).await
            }
            Effect::Comment { repo, number, body } => {
                let comment = self.api.comment_issue(&token, &repo, number, &body).await?;
                info!("Commented on {repo}#{number} for {user}");
                responder
                    .send(render::comment_created(&repo, number, &comment))
                    .await
            }
            Effect::SummarizeRelease { draft } => {
                let summary = self.summarizer.summarize(&token, &draft.repo).await?;
                debug!("Release summary for {} ready for {user}", draft.repo);
                let resumed = resume_with_summary(draft, summary);
                self.store(user, resumed.next);
                match resumed.prompt {
                    Some(prompt) => responder.send(Reply::Say(prompt)).await,
                    None => Ok(()),
                }
            }
            Effect::CreateRelease { repo, release } => {
                let created = self.api.create_release(&token, &repo, &release).await?;
                info!("Created release {} in {repo} for {user}", created.tag_name);
                responder.send(render::release_created(&repo, &created)).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::session::{InMemorySessionStore, Session, Step};
    use crate::testing::{ApiCall, FakeGitHub, RecordingResponder, StaticSummarizer, memory_tokens};
    use crate::github::models::{NewIssue, NewRelease};
    use crate::session::transition::{EXIT_ACK, SUMMARY_PENDING, SUMMARY_READY};
    use crate::error::BotError;

    use super::*;

    struct Harness {
        api: Arc<FakeGitHub>,
        summarizer: Arc<StaticSummarizer>,
        sessions: Arc<InMemorySessionStore>,
        engine: SessionEngine,
        responder: RecordingResponder,
    }

    const USER: UserId = UserId::new(1);

    async fn harness() -> Harness {
        let api = Arc::new(FakeGitHub::new());
        let summarizer = Arc::new(StaticSummarizer::new("- #5 Add search (@octo)"));
        let sessions = Arc::new(InMemorySessionStore::new());
        let tokens = memory_tokens().await;
        tokens.set(USER, "abc123").await.unwrap();
        let engine = SessionEngine::new(
            api.clone(),
            summarizer.clone(),
            sessions.clone(),
            tokens,
        );
        Harness {
            api,
            summarizer,
            sessions,
            engine,
            responder: RecordingResponder::new(),
        }
    }

    impl Harness {
        async fn reply(&self, text: &str) -> Result<bool> {
            self.engine.handle_reply(USER, text, &self.responder).await
        }
    }

    #[tokio::test]
    async fn reply_without_session_is_not_consumed() {
        let h = harness().await;
        assert!(!h.reply("hello").await.unwrap());
        assert!(h.responder.replies().is_empty());
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn issue_flow_creates_one_issue() {
        let h = harness().await;
        h.sessions.set(USER, Session::issue_new("myrepo"));

        assert!(h.reply("Bug: crash on startup").await.unwrap());
        assert_eq!(h.sessions.get(USER).map(|s| s.step()), Some(Step::IssueNewBody));
        assert!(h.reply("Steps to reproduce: ...").await.unwrap());

        assert_eq!(
            h.api.calls(),
            vec![ApiCall::CreateIssue {
                repo: "myrepo".to_string(),
                issue: NewIssue {
                    title: "Bug: crash on startup".to_string(),
                    body: "Steps to reproduce: ...".to_string(),
                },
            }]
        );
        assert_eq!(h.sessions.get(USER), None);
        let replies = h.responder.replies();
        assert_eq!(replies[0], Reply::say("What is the body of your issue?"));
        assert!(matches!(
            &replies[1],
            Reply::Attachments { headline, .. } if headline == "myrepo issue opened:"
        ));
    }

    #[tokio::test]
    async fn failed_call_still_clears_session() {
        let h = harness().await;
        h.sessions.set(USER, Session::issue_comment("myrepo", 3));
        h.api.fail_with("Not Found");

        let err = h.reply("+1").await.unwrap_err();

        assert!(matches!(err, BotError::GitHubApi { message } if message == "Not Found"));
        assert_eq!(h.sessions.get(USER), None);
        assert_eq!(h.api.calls().len(), 1);
    }

    #[tokio::test]
    async fn exit_clears_session_without_api_calls() {
        let h = harness().await;
        h.sessions.set(USER, Session::release_new("myrepo"));
        h.reply("v1.0.0").await.unwrap();

        h.reply("quit").await.unwrap();

        assert_eq!(h.sessions.get(USER), None);
        assert!(h.api.calls().is_empty());
        assert_eq!(h.responder.replies().last(), Some(&Reply::say(EXIT_ACK)));
    }

    #[tokio::test]
    async fn summary_is_fetched_before_prerelease_step() {
        let h = harness().await;
        h.sessions.set(USER, Session::release_new("myrepo"));
        for reply in ["v1.2.0", "Y", "Y"] {
            h.reply(reply).await.unwrap();
        }

        assert_eq!(h.summarizer.calls(), vec!["myrepo".to_string()]);
        assert_eq!(
            h.sessions.get(USER).map(|s| s.step()),
            Some(Step::ReleaseNewPrerelease)
        );
        let replies = h.responder.replies();
        let pending = replies
            .iter()
            .position(|r| *r == Reply::say(SUMMARY_PENDING))
            .expect("pending notice");
        assert_eq!(replies[pending + 1], Reply::say(SUMMARY_READY));

        h.reply("N").await.unwrap();
        assert_eq!(
            h.api.calls(),
            vec![ApiCall::CreateRelease {
                repo: "myrepo".to_string(),
                release: NewRelease {
                    tag_name: "v1.2.0".to_string(),
                    title: "v1.2.0".to_string(),
                    body: "- #5 Add search (@octo)".to_string(),
                    prerelease: false,
                },
            }]
        );
        assert_eq!(h.sessions.get(USER), None);
    }

    #[tokio::test]
    async fn literal_body_skips_summary() {
        let h = harness().await;
        h.sessions.set(USER, Session::release_new("myrepo"));
        for reply in ["v1.2.0", "Spring", "Handwritten notes", "Y"] {
            h.reply(reply).await.unwrap();
        }

        assert!(h.summarizer.calls().is_empty());
        assert_eq!(
            h.api.calls(),
            vec![ApiCall::CreateRelease {
                repo: "myrepo".to_string(),
                release: NewRelease {
                    tag_name: "v1.2.0".to_string(),
                    title: "Spring".to_string(),
                    body: "Handwritten notes".to_string(),
                    prerelease: true,
                },
            }]
        );
    }

    #[tokio::test]
    async fn failed_summary_ends_dialogue() {
        let h = harness().await;
        h.summarizer.fail_with("Bad credentials");
        h.sessions.set(USER, Session::release_new("myrepo"));
        h.reply("v1.2.0").await.unwrap();
        h.reply("Y").await.unwrap();

        let err = h.reply("Y").await.unwrap_err();

        assert_eq!(err.user_message(), "Bad credentials");
        assert_eq!(h.sessions.get(USER), None);
    }
}
