//! Storage of active sessions keyed by chat user.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use poise::serenity_prelude::UserId;

use super::state::Session;

/// Holds at most one active session per user.
pub trait SessionStore: Send + Sync {
    fn get(&self, user: UserId) -> Option<Session>;

    /// Store a session, returning the one it replaced.
    fn set(&self, user: UserId, session: Session) -> Option<Session>;

    fn remove(&self, user: UserId) -> Option<Session>;
}

/// Thread-safe in-memory session storage.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<UserId, Session>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, user: UserId) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user)
            .cloned()
    }

    fn set(&self, user: UserId, session: Session) -> Option<Session> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user, session)
    }

    fn remove(&self, user: UserId) -> Option<Session> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user)
    }
}
