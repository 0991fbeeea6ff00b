//! Parsing of `github ...` chat commands.

use strum::IntoStaticStr;

/// A recognized chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// `github token [value]`; `None` asks for setup instructions
    Token(Option<String>),
    /// Anything that acts on GitHub and therefore needs a stored token
    Action(Action),
}

#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Action {
    IssueNew { repo: String },
    IssueList { repo: String },
    IssueMine { repo: String },
    IssueAll,
    IssueClose { repo: String, number: u64 },
    IssueLgtm { repo: String, number: u64 },
    IssueComment { repo: String, number: u64 },
    IssuePulls { repo: String },
    ReleaseNew { repo: String },
    ReleaseLatest { repo: String },
    ReleaseCheck { repo: String },
}

impl Action {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

impl Command {
    /// Match chat text against the command grammar. Keywords are
    /// case-insensitive; the first word must be `github`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (prefix, rest) = split_word(text)?;
        if !prefix.eq_ignore_ascii_case("github") {
            return None;
        }

        let (group, rest) = split_word(rest)?;
        match group.to_ascii_lowercase().as_str() {
            "help" => rest.is_empty().then_some(Command::Help),
            "token" => {
                let token = rest.trim();
                Some(Command::Token(
                    (!token.is_empty()).then(|| token.to_string()),
                ))
            }
            "issue" => parse_issue(rest).map(Command::Action),
            "release" => parse_release(rest).map(Command::Action),
            _ => None,
        }
    }
}

fn parse_issue(rest: &str) -> Option<Action> {
    let (action, rest) = split_word(rest)?;
    let args: Vec<&str> = rest.split_whitespace().collect();

    match (action.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("new", [repo]) => Some(Action::IssueNew {
            repo: repo_name(repo)?,
        }),
        ("list", [repo]) => Some(Action::IssueList {
            repo: repo_name(repo)?,
        }),
        ("mine", [repo]) => Some(Action::IssueMine {
            repo: repo_name(repo)?,
        }),
        ("all", []) => Some(Action::IssueAll),
        ("close", [repo, number]) => Some(Action::IssueClose {
            repo: repo_name(repo)?,
            number: issue_number(number)?,
        }),
        ("lgtm", [repo, number]) => Some(Action::IssueLgtm {
            repo: repo_name(repo)?,
            number: issue_number(number)?,
        }),
        ("comment", [repo, number]) => Some(Action::IssueComment {
            repo: repo_name(repo)?,
            number: issue_number(number)?,
        }),
        ("pr", [repo]) => Some(Action::IssuePulls {
            repo: repo_name(repo)?,
        }),
        _ => None,
    }
}

fn parse_release(rest: &str) -> Option<Action> {
    let (action, rest) = split_word(rest)?;
    let args: Vec<&str> = rest.split_whitespace().collect();
    let [repo] = args.as_slice() else {
        return None;
    };
    let repo = repo_name(repo)?;

    match action.to_ascii_lowercase().as_str() {
        "new" => Some(Action::ReleaseNew { repo }),
        "latest" => Some(Action::ReleaseLatest { repo }),
        "check" => Some(Action::ReleaseCheck { repo }),
        _ => None,
    }
}

/// Split off the first whitespace-delimited word.
fn split_word(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    match text.find(char::is_whitespace) {
        Some(end) => Some((&text[..end], text[end..].trim_start())),
        None => Some((text, "")),
    }
}

fn repo_name(word: &str) -> Option<String> {
    let valid = word
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    (valid && word != "." && word != "..").then(|| word.to_string())
}

fn issue_number(word: &str) -> Option<u64> {
    let digits = word.strip_prefix('#').unwrap_or(word);
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok().filter(|n| *n > 0)
}
