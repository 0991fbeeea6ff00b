//! Discord bot core logic and event handling.

use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use poise::{
    Framework, FrameworkOptions,
    serenity_prelude::{
        ClientBuilder, Context, CreateEmbed, CreateMessage, FullEvent, GatewayIntents,
        Message as SerenityMessage, UserId,
    },
};

use crate::config::Config;
use crate::dispatcher::{Dispatcher, Handled};
use crate::error::Result;
use crate::github::{GitHubApi, GitHubClient, MergedPullSummary};
use crate::session::InMemorySessionStore;
use crate::token_store::{MemoryStore, TokenBackend, TokenStore};
use crate::types::{Attachment, Reply, Responder};

type EventResult = std::result::Result<(), Box<dyn StdError + Send + Sync>>;

// Discord limits
const MAX_CONTENT_CHARS: usize = 2000;
const MAX_EMBEDS_PER_MESSAGE: usize = 10;
const MAX_EMBED_TITLE_CHARS: usize = 256;
const MAX_EMBED_DESCRIPTION_CHARS: usize = 4096;

pub struct Data {
    dispatcher: Dispatcher,
}

/// Run the Discord bot.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Config::from_env()?;

    let backend = match &config.token_file {
        Some(path) => TokenBackend::File(path.clone()),
        None => TokenBackend::KeyValue(Arc::new(MemoryStore::new())),
    };
    let tokens = Arc::new(TokenStore::open(backend).await?);

    debug!("Initializing GitHub client for account {}", config.github.account);
    let api: Arc<dyn GitHubApi> = Arc::new(GitHubClient::new(&config.github)?);
    let summarizer = Arc::new(MergedPullSummary::new(
        api.clone(),
        config.github.release_branch.clone(),
    ));
    let dispatcher = Dispatcher::new(
        api,
        summarizer,
        Arc::new(InMemorySessionStore::new()),
        tokens,
    );

    debug!("Setting up gateway intents");
    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;

    debug!("Building framework");
    let framework = Framework::builder()
        .options(FrameworkOptions {
            event_handler: |ctx, event, _framework, data| Box::pin(event_handler(ctx, event, data)),
            ..Default::default()
        })
        .setup(move |_ctx, _ready, _framework| {
            Box::pin(async move {
                info!("Bot is ready and connected to Discord");
                Ok(Data { dispatcher })
            })
        })
        .build();

    debug!("Creating Discord client");
    let mut client = ClientBuilder::new(config.discord_token, intents)
        .framework(framework)
        .await?;

    info!("Starting Discord client");

    tokio::select! {
        result = client.start() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    Ok(())
}

async fn event_handler(ctx: &Context, event: &FullEvent, data: &Data) -> EventResult {
    if let FullEvent::Message { new_message } = event
        && !new_message.author.bot
    {
        handle_message(ctx, new_message, data).await?;
    }
    Ok(())
}

async fn handle_message(ctx: &Context, message: &SerenityMessage, data: &Data) -> Result<()> {
    let bot_user_id = ctx.cache.current_user().id;
    let in_dm = message.guild_id.is_none();
    let addressed = in_dm || message.mentions_user_id(bot_user_id);
    let text = strip_bot_mention(&message.content, bot_user_id);

    debug!(
        "Message from {} in channel {} (addressed: {addressed}, {} characters)",
        message.author.tag(),
        message.channel_id,
        text.len()
    );

    let responder = DiscordResponder { ctx, message };
    let handled = data
        .dispatcher
        .handle(message.author.id, text, addressed, &responder)
        .await?;

    if handled == Handled::TokenCommand && !in_dm {
        match message.delete(&ctx.http).await {
            Ok(()) => info!(
                "Deleted token message from {} in channel {}",
                message.author.tag(),
                message.channel_id
            ),
            Err(e) => warn!("Failed to delete token message: {e}"),
        }
    }

    Ok(())
}

/// Strip a leading mention of the bot, if present. Other text is left as is.
fn strip_bot_mention(content: &str, bot_user_id: UserId) -> &str {
    let trimmed = content.trim_start();
    for mention in [format!("<@{bot_user_id}>"), format!("<@!{bot_user_id}>")] {
        if let Some(rest) = trimmed.strip_prefix(mention.as_str()) {
            return rest.trim_start();
        }
    }
    content
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Split text into messages of at most `max_chars`, breaking after a line
/// where possible. Lines longer than a message are cut.
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for line in text.split_inclusive('\n') {
        let line_chars = line.chars().count();
        if current_chars + line_chars > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        let mut rest = line;
        let mut rest_chars = line_chars;
        while rest_chars > max_chars {
            let cut = rest
                .char_indices()
                .nth(max_chars)
                .map_or(rest.len(), |(index, _)| index);
            chunks.push(rest[..cut].to_string());
            rest = &rest[cut..];
            rest_chars -= max_chars;
        }
        current.push_str(rest);
        current_chars += rest_chars;
    }
    chunks.push(current);

    chunks.retain(|chunk| !chunk.trim().is_empty());
    chunks
}

fn to_embed(attachment: &Attachment) -> CreateEmbed {
    let mut embed =
        CreateEmbed::new().description(truncate(&attachment.text, MAX_EMBED_DESCRIPTION_CHARS));
    if let Some(title) = &attachment.title {
        embed = embed.title(truncate(title, MAX_EMBED_TITLE_CHARS));
    }
    embed
}

/// Sends replies to the channel of the message being handled.
struct DiscordResponder<'a> {
    ctx: &'a Context,
    message: &'a SerenityMessage,
}

#[async_trait]
impl Responder for DiscordResponder<'_> {
    async fn send(&self, reply: Reply) -> Result<()> {
        let http = &self.ctx.http;
        match reply {
            Reply::Say(text) => {
                for chunk in split_message(&text, MAX_CONTENT_CHARS) {
                    self.message.channel_id.say(http, chunk).await?;
                }
            }
            Reply::Direct(text) => {
                for (index, chunk) in split_message(&text, MAX_CONTENT_CHARS)
                    .into_iter()
                    .enumerate()
                {
                    if index == 0 {
                        self.message.reply(http, chunk).await?;
                    } else {
                        self.message.channel_id.say(http, chunk).await?;
                    }
                }
            }
            Reply::Attachments {
                headline,
                attachments,
            } => {
                let embeds: Vec<CreateEmbed> = attachments.iter().map(to_embed).collect();
                let headline = truncate(&headline, MAX_CONTENT_CHARS);
                if embeds.is_empty() {
                    self.message.channel_id.say(http, headline).await?;
                    return Ok(());
                }
                for (index, chunk) in embeds.chunks(MAX_EMBEDS_PER_MESSAGE).enumerate() {
                    let mut message = CreateMessage::new().embeds(chunk.to_vec());
                    if index == 0 {
                        message = message.content(headline.clone());
                    }
                    self.message.channel_id.send_message(http, message).await?;
                }
                debug!(
                    "Sent {} attachments to channel {}",
                    attachments.len(),
                    self.message.channel_id
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_both_mention_forms() {
        let bot = UserId::new(1234);
        assert_eq!(
            strip_bot_mention("<@1234> github issue list app", bot),
            "github issue list app"
        );
        assert_eq!(strip_bot_mention("  <@!1234>   exit", bot), "exit");
    }

    #[test]
    fn leaves_other_mentions_alone() {
        let bot = UserId::new(1234);
        assert_eq!(strip_bot_mention("<@99> hello", bot), "<@99> hello");
        assert_eq!(strip_bot_mention("Y", bot), "Y");
        assert_eq!(strip_bot_mention("  indented\n", bot), "  indented\n");
    }

    #[test]
    fn truncate_respects_char_limit() {
        assert_eq!(truncate("short", 10), "short");
        let long = "é".repeat(20);
        let cut = truncate(&long, 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn short_text_is_one_message() {
        assert_eq!(split_message("hello\nworld", 2000), vec!["hello\nworld"]);
    }

    #[test]
    fn long_text_splits_on_line_boundaries() {
        let lines: Vec<String> = (1..=120)
            .map(|n| format!("- #{n} Merged change number {n} (@octo)"))
            .collect();
        let text = lines.join("\n");

        let chunks = split_message(&text, MAX_CONTENT_CHARS);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_CONTENT_CHARS));
        assert_eq!(chunks.concat(), text);
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.ends_with('\n'));
        }
    }

    #[test]
    fn oversized_line_is_cut() {
        let text = "x".repeat(25);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }
}
