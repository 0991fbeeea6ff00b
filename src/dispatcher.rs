//! Entry point for every chat message: commands first, then session replies.

use std::collections::HashMap;
use std::sync::{Arc, MutexGuard, PoisonError};

use log::{debug, error};
use poise::serenity_prelude::UserId;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::Result;
use crate::github::{GitHubApi, ReleaseSummarizer};
use crate::router::{Command, CommandRouter};
use crate::session::{SessionEngine, SessionStore};
use crate::token_store::TokenStore;
use crate::types::{Reply, Responder};

/// What a message turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Command,
    /// A `github token <value>` command; the message carries a secret
    TokenCommand,
    SessionReply,
    Ignored,
}

/// One async lock per user so a user's messages are handled one at a time.
///
/// Entries only live while someone holds or waits for them.
#[derive(Default)]
struct UserLocks {
    locks: std::sync::Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    fn map(&self) -> MutexGuard<'_, HashMap<UserId, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn acquire(&self, user: UserId) -> UserGuard<'_> {
        let lock = self.map().entry(user).or_default().clone();
        UserGuard {
            locks: self,
            user,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn tracked_users(&self) -> usize {
        self.map().len()
    }
}

/// Held while one of a user's messages is handled.
struct UserGuard<'a> {
    locks: &'a UserLocks,
    user: UserId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.map();
        // Only the map's own handle left: nobody holds or waits on it.
        if locks
            .get(&self.user)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.user);
        }
    }
}

pub struct Dispatcher {
    router: CommandRouter,
    engine: SessionEngine,
    locks: UserLocks,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn GitHubApi>,
        summarizer: Arc<dyn ReleaseSummarizer>,
        sessions: Arc<dyn SessionStore>,
        tokens: Arc<TokenStore>,
    ) -> Self {
        Self {
            router: CommandRouter::new(
                api.clone(),
                summarizer.clone(),
                sessions.clone(),
                tokens.clone(),
            ),
            engine: SessionEngine::new(api, summarizer, sessions, tokens),
            locks: UserLocks::default(),
        }
    }

    /// Handle one chat message.
    ///
    /// Commands are only recognized when the message is `addressed` to the
    /// bot. Anything else is offered to the user's active session as is. Operation
    /// failures are reported back to the user and not returned.
    ///
    /// # Errors
    ///
    /// Returns an error only when a reply cannot be delivered.
    pub async fn handle(
        &self,
        user: UserId,
        text: &str,
        addressed: bool,
        responder: &dyn Responder,
    ) -> Result<Handled> {
        let _guard = self.locks.acquire(user).await;

        if addressed && let Some(command) = Command::parse(text.trim()) {
            let handled = if matches!(command, Command::Token(Some(_))) {
                Handled::TokenCommand
            } else {
                Handled::Command
            };
            let result = self.router.dispatch(user, command, responder).await;
            self.report(user, result, responder).await?;
            return Ok(handled);
        }

        match self.engine.handle_reply(user, text, responder).await {
            Ok(true) => Ok(Handled::SessionReply),
            Ok(false) => {
                debug!("Ignoring message from {user}");
                Ok(Handled::Ignored)
            }
            Err(e) => {
                self.report(user, Err(e), responder).await?;
                Ok(Handled::SessionReply)
            }
        }
    }

    async fn report(
        &self,
        user: UserId,
        result: Result<()>,
        responder: &dyn Responder,
    ) -> Result<()> {
        if let Err(e) = result {
            error!("Error handling message from {user}: {e}");
            responder.send(Reply::direct(e.user_message())).await?;
        }
        Ok(())
    }
}
