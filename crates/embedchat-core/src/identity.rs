//! Durable visitor identity.
//!
//! A visitor is identified by an opaque [`SessionToken`] that is created on
//! first activation and then reused across reloads. The token lives in a
//! [`DurableStore`], which behaves as a write-if-absent register: once a
//! value is stored for a key it is never overwritten.

use crate::error::{EmbedchatError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use uuid::Uuid;

/// Storage key prefix for the session identity.
pub const SESSION_KEY: &str = "session_id";

/// Opaque visitor identity token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generates a fresh random token (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-origin durable key/value register.
pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key` unless a value is already present.
    ///
    /// Returns the value that is stored after the call, which is the
    /// pre-existing one if there was one.
    fn put_if_absent(&self, key: &str, value: &str) -> Result<String>;
}

/// In-memory store. Clones share the same map, so two clones behave like two
/// widget instances on the same origin.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| EmbedchatError::storage("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn put_if_absent(&self, key: &str, value: &str) -> Result<String> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| EmbedchatError::storage("memory store lock poisoned"))?;
        Ok(entries
            .entry(key.to_string())
            .or_insert_with(|| value.to_string())
            .clone())
    }
}

/// Object-safe seam for anything that can produce the visitor identity.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self) -> Result<SessionToken>;
}

/// Resolves the visitor identity for one origin from a durable store.
pub struct IdentityStore<S> {
    store: S,
    key: String,
    resolved: OnceLock<SessionToken>,
}

impl<S: DurableStore> IdentityStore<S> {
    /// Creates an identity store scoped to `origin`.
    pub fn new(store: S, origin: &str) -> Self {
        Self {
            store,
            key: storage_key(origin),
            resolved: OnceLock::new(),
        }
    }

    /// Returns the visitor token, creating and persisting one if none exists.
    ///
    /// When another instance stores a token between our read and our write,
    /// that token wins and is returned.
    pub fn resolve(&self) -> Result<SessionToken> {
        if let Some(token) = self.resolved.get() {
            return Ok(token.clone());
        }

        let token = match self.store.get(&self.key)? {
            Some(existing) => SessionToken::from(existing),
            None => {
                let candidate = SessionToken::generate();
                let stored = self.store.put_if_absent(&self.key, candidate.as_str())?;
                if stored == candidate.as_str() {
                    tracing::info!(key = %self.key, "created new visitor identity");
                } else {
                    tracing::debug!(key = %self.key, "identity written concurrently, adopting stored value");
                }
                SessionToken::from(stored)
            }
        };

        Ok(self.resolved.get_or_init(|| token).clone())
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<S: DurableStore> IdentityResolver for IdentityStore<S> {
    fn resolve(&self) -> Result<SessionToken> {
        IdentityStore::resolve(self)
    }
}

/// Storage key for the identity of `origin`.
pub fn storage_key(origin: &str) -> String {
    format!("{SESSION_KEY}@{origin}")
}
