use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Serenity error: {0}")]
    Serenity(Box<poise::serenity_prelude::Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("GitHub API error: {message}")]
    GitHubApi { message: String },

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token store is corrupted: {0}")]
    TokenStore(String),
}

impl From<poise::serenity_prelude::Error> for BotError {
    fn from(err: poise::serenity_prelude::Error) -> Self {
        BotError::Serenity(Box::new(err))
    }
}

impl BotError {
    /// Returns a user-friendly error message suitable for displaying in chat.
    ///
    /// GitHub API errors are relayed verbatim.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            BotError::GitHubApi { message } => message.clone(),
            BotError::Serenity(_) => {
                "Sorry, I'm having trouble communicating with Discord right now. Please try again later.".to_string()
            }
            BotError::Config(_) | BotError::EnvVar(_) => {
                "Sorry, there's a configuration issue on my end. Please contact the bot administrator.".to_string()
            }
            BotError::Reqwest(e) if e.is_timeout() => {
                "Sorry, GitHub took too long to answer. Please try again in a moment.".to_string()
            }
            BotError::Reqwest(_) => {
                "Sorry, I'm having network issues reaching GitHub. Please try again in a moment.".to_string()
            }
            BotError::Json(_) => {
                "Sorry, I received an unexpected response from GitHub. Please try again.".to_string()
            }
            BotError::Io(_) | BotError::TokenStore(_) => {
                "Sorry, I couldn't access the stored access tokens. Please contact the bot administrator.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
