//! Common types used throughout the ghbot crate.

use async_trait::async_trait;

use crate::error::Result;

/// A structured rendering unit presented under a headline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub title: Option<String>,
    pub text: String,
}

impl Attachment {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            text: text.into(),
        }
    }

    pub fn untitled(text: impl Into<String>) -> Self {
        Self {
            title: None,
            text: text.into(),
        }
    }
}

/// Something the bot says back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain message to the channel
    Say(String),
    /// Message addressed to the user who sent the command
    Direct(String),
    /// Headline followed by a list of attachments
    Attachments {
        headline: String,
        attachments: Vec<Attachment>,
    },
}

impl Reply {
    pub fn say(text: impl Into<String>) -> Self {
        Reply::Say(text.into())
    }

    pub fn direct(text: impl Into<String>) -> Self {
        Reply::Direct(text.into())
    }
}

/// Emission channel back to the chat the message came from.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send(&self, reply: Reply) -> Result<()>;
}
