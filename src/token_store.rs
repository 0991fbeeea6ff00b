//! Per-user GitHub access token persistence.

mod backend;

use std::collections::BTreeMap;

use log::{debug, info, warn};
use poise::serenity_prelude::UserId;
use tokio::sync::Mutex;

use crate::error::{BotError, Result};

pub use backend::{KeyValueStore, MemoryStore, STORE_KEY, TokenBackend};

type TokenMap = BTreeMap<String, String>;

/// Maps chat users to their personal access tokens.
///
/// Every read and write goes through the backing blob; updates rewrite the
/// whole map. Access within the process is serialized.
pub struct TokenStore {
    backend: TokenBackend,
    lock: Mutex<()>,
}

impl TokenStore {
    /// Open the store, resetting the backing blob to an empty map when it is
    /// missing or unreadable.
    ///
    /// # Errors
    ///
    /// Returns an error if the empty map cannot be written.
    pub async fn open(backend: TokenBackend) -> Result<Self> {
        let store = Self {
            backend,
            lock: Mutex::new(()),
        };
        store.ensure_initialized().await?;
        Ok(store)
    }

    async fn ensure_initialized(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        let healthy = match self.backend.read().await {
            Ok(Some(blob)) => parse(&blob).is_ok(),
            Ok(None) => false,
            Err(e) => {
                warn!("Could not read {}: {e}", self.backend.describe());
                false
            }
        };

        if healthy {
            debug!("Token store ready ({})", self.backend.describe());
            return Ok(());
        }

        info!(
            "Initializing empty token store ({})",
            self.backend.describe()
        );
        self.save(&TokenMap::new()).await
    }

    /// Look up the token stored for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenStore` if the backing blob has been corrupted since startup.
    pub async fn get(&self, user: UserId) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        let tokens = self.load().await?;
        Ok(tokens.get(&user.to_string()).cloned())
    }

    /// Store a token for a user, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the map cannot be read back or written.
    pub async fn set(&self, user: UserId, token: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut tokens = self.load().await?;
        tokens.insert(user.to_string(), token.to_string());
        self.save(&tokens).await?;
        info!(
            "Stored access token for user {user} ({} characters)",
            token.len()
        );
        Ok(())
    }

    async fn load(&self) -> Result<TokenMap> {
        match self.backend.read().await? {
            Some(blob) => parse(&blob),
            None => Ok(TokenMap::new()),
        }
    }

    async fn save(&self, tokens: &TokenMap) -> Result<()> {
        let blob = serde_json::to_string(tokens)?;
        self.backend.write(blob).await
    }
}

fn parse(blob: &str) -> Result<TokenMap> {
    serde_json::from_str::<Option<TokenMap>>(blob)
        .map(Option::unwrap_or_default)
        .map_err(|e| BotError::TokenStore(e.to_string()))
}
