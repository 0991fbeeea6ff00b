//! Pure state transitions for guided dialogues.

use crate::github::models::{NewIssue, NewRelease};

use super::state::{IssueNew, ReleaseDraft, ReleaseNew, Session};

/// Reply that accepts the suggested default at a release step.
pub const ACCEPT: &str = "Y";

pub const EXIT_ACK: &str = "OK, I will ignore you.";
pub const SUMMARY_PENDING: &str = "Fetching pull requests list. wait a moment....";
pub const SUMMARY_READY: &str = "OK. last question, is this a prerelease? answer Y or N.";

/// Outcome of feeding one reply to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Session to keep, or `None` to end it
    pub next: Option<Session>,
    /// Side effect to run after the session has been updated
    pub effect: Option<Effect>,
    /// Text to send before running the effect
    pub prompt: Option<String>,
}

/// Work a transition asks the engine to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CreateIssue {
        repo: String,
        issue: NewIssue,
    },
    Comment {
        repo: String,
        number: u64,
        body: String,
    },
    /// Generate the release body; the session resumes at the prerelease step.
    SummarizeRelease {
        draft: ReleaseDraft,
    },
    CreateRelease {
        repo: String,
        release: NewRelease,
    },
}

fn is_exit(reply: &str) -> bool {
    matches!(reply.trim(), "exit" | "quit")
}

fn is_accept(reply: &str) -> bool {
    reply.trim() == ACCEPT
}

fn advance(next: Session) -> Transition {
    let prompt = prompt(&next);
    Transition {
        next: Some(next),
        effect: None,
        prompt: Some(prompt),
    }
}

fn finish(effect: Effect) -> Transition {
    Transition {
        next: None,
        effect: Some(effect),
        prompt: None,
    }
}

/// The question a session asks while waiting in its current step.
#[must_use]
pub fn prompt(session: &Session) -> String {
    match session {
        Session::IssueNew(IssueNew::Title { .. }) => "What is the title of your issue?".to_string(),
        Session::IssueNew(IssueNew::Body { .. }) => "What is the body of your issue?".to_string(),
        Session::IssueComment { repo, number } => {
            format!("Leave your comment with {repo} #{number}")
        }
        Session::ReleaseNew(ReleaseNew::Tag { .. }) => {
            "What is the tag version for this release? no idea ? you can follow \
             [semantic versioning](http://semver.org/)"
                .to_string()
        }
        Session::ReleaseNew(ReleaseNew::Title { .. }) => {
            "What is the title for this release? answer Y if it is same as tag version.".to_string()
        }
        Session::ReleaseNew(ReleaseNew::Body { .. }) => {
            "What is the body for this release? answer Y will use a merged pull requests list \
             after latest release."
                .to_string()
        }
        Session::ReleaseNew(ReleaseNew::Prerelease { .. }) => {
            "Is this a prerelease? answer Y or N.".to_string()
        }
    }
}

/// Consume a reply in the session's current step.
///
/// `exit` and `quit` end any session before the step is looked at.
#[must_use]
pub fn transition(session: Session, reply: &str) -> Transition {
    if is_exit(reply) {
        return Transition {
            next: None,
            effect: None,
            prompt: Some(EXIT_ACK.to_string()),
        };
    }

    let answer = reply.to_string();
    match session {
        Session::IssueNew(IssueNew::Title { repo }) => {
            advance(Session::IssueNew(IssueNew::Body {
                repo,
                title: answer,
            }))
        }
        Session::IssueNew(IssueNew::Body { repo, title }) => finish(Effect::CreateIssue {
            repo,
            issue: NewIssue {
                title,
                body: answer,
            },
        }),
        Session::IssueComment { repo, number } => finish(Effect::Comment {
            repo,
            number,
            body: answer,
        }),
        Session::ReleaseNew(ReleaseNew::Tag { repo }) => {
            advance(Session::ReleaseNew(ReleaseNew::Title {
                repo,
                tag_name: answer,
            }))
        }
        Session::ReleaseNew(ReleaseNew::Title { repo, tag_name }) => {
            let title = if is_accept(reply) {
                tag_name.clone()
            } else {
                answer
            };
            advance(Session::ReleaseNew(ReleaseNew::Body {
                draft: ReleaseDraft {
                    repo,
                    tag_name,
                    title,
                },
            }))
        }
        Session::ReleaseNew(ReleaseNew::Body { draft }) => {
            if is_accept(reply) {
                Transition {
                    next: None,
                    effect: Some(Effect::SummarizeRelease { draft }),
                    prompt: Some(SUMMARY_PENDING.to_string()),
                }
            } else {
                advance(Session::ReleaseNew(ReleaseNew::Prerelease {
                    draft,
                    body: answer,
                }))
            }
        }
        Session::ReleaseNew(ReleaseNew::Prerelease { draft, body }) => {
            finish(Effect::CreateRelease {
                repo: draft.repo,
                release: NewRelease {
                    tag_name: draft.tag_name,
                    title: draft.title,
                    body,
                    prerelease: is_accept(reply),
                },
            })
        }
    }
}

/// Resume a release dialogue once its generated body is available.
#[must_use]
pub fn resume_with_summary(draft: ReleaseDraft, summary: String) -> Transition {
    Transition {
        next: Some(Session::ReleaseNew(ReleaseNew::Prerelease {
            draft,
            body: summary,
        })),
        effect: None,
        prompt: Some(SUMMARY_READY.to_string()),
    }
}
