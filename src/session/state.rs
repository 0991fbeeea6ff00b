//! Session states for each guided dialogue.

use strum::{Display, EnumString, IntoStaticStr};

/// One in-progress guided dialogue. Each variant carries exactly the answers
/// collected so far for its command family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    IssueNew(IssueNew),
    IssueComment { repo: String, number: u64 },
    ReleaseNew(ReleaseNew),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueNew {
    Title { repo: String },
    Body { repo: String, title: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseNew {
    Tag { repo: String },
    Title { repo: String, tag_name: String },
    Body { draft: ReleaseDraft },
    Prerelease { draft: ReleaseDraft, body: String },
}

/// Release answers collected before the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDraft {
    pub repo: String,
    pub tag_name: String,
    pub title: String,
}

/// Name of the step a session is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Step {
    IssueNewTitle,
    IssueNewBody,
    IssueCommentBody,
    ReleaseNewTag,
    ReleaseNewTitle,
    ReleaseNewBody,
    ReleaseNewPrerelease,
}

impl Session {
    #[must_use]
    pub fn issue_new(repo: impl Into<String>) -> Self {
        Session::IssueNew(IssueNew::Title { repo: repo.into() })
    }

    #[must_use]
    pub fn issue_comment(repo: impl Into<String>, number: u64) -> Self {
        Session::IssueComment {
            repo: repo.into(),
            number,
        }
    }

    #[must_use]
    pub fn release_new(repo: impl Into<String>) -> Self {
        Session::ReleaseNew(ReleaseNew::Tag { repo: repo.into() })
    }

    #[must_use]
    pub fn step(&self) -> Step {
        match self {
            Session::IssueNew(IssueNew::Title { .. }) => Step::IssueNewTitle,
            Session::IssueNew(IssueNew::Body { .. }) => Step::IssueNewBody,
            Session::IssueComment { .. } => Step::IssueCommentBody,
            Session::ReleaseNew(ReleaseNew::Tag { .. }) => Step::ReleaseNewTag,
            Session::ReleaseNew(ReleaseNew::Title { .. }) => Step::ReleaseNewTitle,
            Session::ReleaseNew(ReleaseNew::Body { .. }) => Step::ReleaseNewBody,
            Session::ReleaseNew(ReleaseNew::Prerelease { .. }) => Step::ReleaseNewPrerelease,
        }
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        match self {
            Session::IssueNew(IssueNew::Title { repo } | IssueNew::Body { repo, .. })
            | Session::IssueComment { repo, .. }
            | Session::ReleaseNew(ReleaseNew::Tag { repo } | ReleaseNew::Title { repo, .. }) => {
                repo
            }
            Session::ReleaseNew(
                ReleaseNew::Body { draft } | ReleaseNew::Prerelease { draft, .. },
            ) => &draft.repo,
        }
    }

    /// The chat command that opened this session, e.g. `github issue new app`.
    #[must_use]
    pub fn command(&self) -> String {
        match self {
            Session::IssueNew(_) => format!("github issue new {}", self.repo()),
            Session::IssueComment { repo, number } => {
                format!("github issue comment {repo} {number}")
            }
            Session::ReleaseNew(_) => format!("github release new {}", self.repo()),
        }
    }
}
