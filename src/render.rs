//! Rendering of GitHub results as chat attachments.

use chrono::{DateTime, Utc};

use crate::github::models::{Comment, Issue, PullRequest, Release, User};
use crate::types::{Attachment, Reply};

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %-I:%M:%S %P").to_string()
}

fn user_link(user: &User) -> String {
    format!("[{}]({})", user.login, user.html_url)
}

fn issue_title(issue: &Issue) -> String {
    if issue.pull_request.is_some() {
        format!("{} (Pull Request)", issue.title)
    } else {
        issue.title.clone()
    }
}

fn issue_line(issue: &Issue) -> String {
    format!(
        "[#{}]({}) created by {} {}",
        issue.number,
        issue.html_url,
        user_link(&issue.user),
        timestamp(&issue.created_at)
    )
}

fn issue_detail(issue: &Issue) -> Attachment {
    Attachment::new(
        issue.title.clone(),
        format!(
            "{} \n {}",
            issue_line(issue),
            issue.body.as_deref().unwrap_or_default()
        ),
    )
}

fn list(headline: String, attachments: Vec<Attachment>, empty: &str) -> Reply {
    let attachments = if attachments.is_empty() {
        vec![Attachment::untitled(empty)]
    } else {
        attachments
    };
    Reply::Attachments {
        headline,
        attachments,
    }
}

#[must_use]
pub fn issue_list(repo: &str, issues: &[Issue]) -> Reply {
    list(
        format!("{repo} issues:"),
        issues
            .iter()
            .map(|issue| Attachment::new(issue_title(issue), issue_line(issue)))
            .collect(),
        "No issues found.",
    )
}

#[must_use]
pub fn org_issue_list(account: &str, issues: &[Issue]) -> Reply {
    list(
        format!("all {account} issues assigned to me:"),
        issues
            .iter()
            .map(|issue| {
                let location = issue
                    .repository
                    .as_ref()
                    .map(|repo| format!("[{}]({}) ", repo.name, repo.html_url))
                    .unwrap_or_default();
                Attachment::new(
                    issue_title(issue),
                    format!("{location}{}", issue_line(issue)),
                )
            })
            .collect(),
        "No issues assigned to you.",
    )
}

#[must_use]
pub fn issue_opened(repo: &str, issue: &Issue) -> Reply {
    Reply::Attachments {
        headline: format!("{repo} issue opened:"),
        attachments: vec![issue_detail(issue)],
    }
}

#[must_use]
pub fn issue_closed(repo: &str, issue: &Issue) -> Reply {
    Reply::Attachments {
        headline: format!("{repo} issue closed"),
        attachments: vec![issue_detail(issue)],
    }
}

#[must_use]
pub fn pull_list(repo: &str, pulls: &[PullRequest]) -> Reply {
    list(
        format!("{repo} Pull Requests list"),
        pulls
            .iter()
            .map(|pull| {
                Attachment::new(
                    pull.title.clone(),
                    format!(
                        "[#{}]({}) created by {} {}",
                        pull.number,
                        pull.html_url,
                        user_link(&pull.user),
                        timestamp(&pull.created_at)
                    ),
                )
            })
            .collect(),
        "No open pull requests.",
    )
}

#[must_use]
pub fn comment_created(repo: &str, number: u64, comment: &Comment) -> Reply {
    Reply::Attachments {
        headline: format!("New Comment for {repo} {number}:"),
        attachments: vec![Attachment::untitled(format!(
            "{} \n {} {}",
            comment.body,
            user_link(&comment.user),
            timestamp(&comment.created_at)
        ))],
    }
}

fn release_attachment(release: &Release) -> Attachment {
    Attachment {
        title: Some(
            release
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| release.tag_name.clone()),
        ),
        text: release.body.clone().unwrap_or_default(),
    }
}

#[must_use]
pub fn release_created(repo: &str, release: &Release) -> Reply {
    Reply::Attachments {
        headline: format!(
            "New Release for {repo} created: [{}]({})",
            release.tag_name, release.html_url
        ),
        attachments: vec![release_attachment(release)],
    }
}

#[must_use]
pub fn latest_release(repo: &str, release: &Release) -> Reply {
    Reply::Attachments {
        headline: format!(
            "Latest Release for {repo}: [{}]({})",
            release.tag_name, release.html_url
        ),
        attachments: vec![release_attachment(release)],
    }
}
