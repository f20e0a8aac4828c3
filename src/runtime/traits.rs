//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use super::InboundEvent;
use crate::db::{Database, DbError, Recipe, Session, User, UserStats};
use crate::i18n::Language;
use crate::state_machine::Notification;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Failure of a compare-and-swap session write
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Session {0} was modified concurrently")]
    Conflict(i64),
    #[error("{0}")]
    Store(String),
}

/// Chat users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by chat id, creating the record on first contact
    async fn find_or_create_user(
        &self,
        chat_id: i64,
        first_name: Option<&str>,
        username: Option<&str>,
    ) -> Result<User, String>;

    async fn set_language(&self, chat_id: i64, language: Language) -> Result<(), String>;
}

/// Brewing sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_active_session(
        &self,
        chat_id: i64,
        recipe_id: i64,
    ) -> Result<Option<Session>, String>;

    /// Atomically return the active session or create one
    async fn find_or_create_session(
        &self,
        chat_id: i64,
        recipe_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Session, String>;

    /// Write `session` if its version still matches the stored one
    async fn save_session(&self, session: &Session) -> Result<Session, SaveError>;

    async fn user_stats(&self, chat_id: i64) -> Result<UserStats, String>;
}

/// Read-only recipe lookup
#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    async fn find_recipe(&self, id: i64, language: Language) -> Result<Option<Recipe>, String>;

    /// Active recipes, easiest first, then by name
    async fn list_active_recipes(&self, language: Language) -> Result<Vec<Recipe>, String>;
}

/// Key-value entries that vanish after an expiry time
#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Store `value` until `expires_at`. Entries already expired at `now`
    /// are swept as a side effect.
    async fn set(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), String>;

    /// Value for `key` unless it has expired by `now`
    async fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<String>, String>;

    async fn delete(&self, key: &str) -> Result<(), String>;
}

/// Outbound message delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Hand a message over for best-effort asynchronous delivery
    async fn notify(&self, notification: Notification) -> Result<(), String>;

    /// Acknowledge a pressed button so the client stops its spinner
    async fn acknowledge(&self, callback_id: &str) -> Result<(), String>;
}

/// Entry point for normalized inbound events
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, event: InboundEvent) -> Result<(), String>;
}

/// Combined storage trait for convenience
pub trait Storage: UserStore + SessionStore + RecipeCatalog + TtlStore {}
impl<T: UserStore + SessionStore + RecipeCatalog + TtlStore> Storage for T {}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: UserStore + ?Sized> UserStore for Arc<T> {
    async fn find_or_create_user(
        &self,
        chat_id: i64,
        first_name: Option<&str>,
        username: Option<&str>,
    ) -> Result<User, String> {
        (**self)
            .find_or_create_user(chat_id, first_name, username)
            .await
    }

    async fn set_language(&self, chat_id: i64, language: Language) -> Result<(), String> {
        (**self).set_language(chat_id, language).await
    }
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn find_active_session(
        &self,
        chat_id: i64,
        recipe_id: i64,
    ) -> Result<Option<Session>, String> {
        (**self).find_active_session(chat_id, recipe_id).await
    }

    async fn find_or_create_session(
        &self,
        chat_id: i64,
        recipe_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Session, String> {
        (**self).find_or_create_session(chat_id, recipe_id, now).await
    }

    async fn save_session(&self, session: &Session) -> Result<Session, SaveError> {
        (**self).save_session(session).await
    }

    async fn user_stats(&self, chat_id: i64) -> Result<UserStats, String> {
        (**self).user_stats(chat_id).await
    }
}

#[async_trait]
impl<T: RecipeCatalog + ?Sized> RecipeCatalog for Arc<T> {
    async fn find_recipe(&self, id: i64, language: Language) -> Result<Option<Recipe>, String> {
        (**self).find_recipe(id, language).await
    }

    async fn list_active_recipes(&self, language: Language) -> Result<Vec<Recipe>, String> {
        (**self).list_active_recipes(language).await
    }
}

#[async_trait]
impl<T: TtlStore + ?Sized> TtlStore for Arc<T> {
    async fn set(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), String> {
        (**self).set(key, value, expires_at, now).await
    }

    async fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<String>, String> {
        (**self).get(key, now).await
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        (**self).delete(key).await
    }
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn notify(&self, notification: Notification) -> Result<(), String> {
        (**self).notify(notification).await
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), String> {
        (**self).acknowledge(callback_id).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as Storage
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for DatabaseStorage {
    async fn find_or_create_user(
        &self,
        chat_id: i64,
        first_name: Option<&str>,
        username: Option<&str>,
    ) -> Result<User, String> {
        self.db
            .find_or_create_user(chat_id, first_name, username)
            .map_err(|e| e.to_string())
    }

    async fn set_language(&self, chat_id: i64, language: Language) -> Result<(), String> {
        self.db
            .set_language(chat_id, language.code())
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl SessionStore for DatabaseStorage {
    async fn find_active_session(
        &self,
        chat_id: i64,
        recipe_id: i64,
    ) -> Result<Option<Session>, String> {
        self.db
            .find_active_session(chat_id, recipe_id)
            .map_err(|e| e.to_string())
    }

    async fn find_or_create_session(
        &self,
        chat_id: i64,
        recipe_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Session, String> {
        self.db
            .find_or_create_session(chat_id, recipe_id, now)
            .map_err(|e| e.to_string())
    }

    async fn save_session(&self, session: &Session) -> Result<Session, SaveError> {
        self.db.save_session(session).map_err(|e| match e {
            DbError::SessionConflict(id) => SaveError::Conflict(id),
            other => SaveError::Store(other.to_string()),
        })
    }

    async fn user_stats(&self, chat_id: i64) -> Result<UserStats, String> {
        self.db.user_stats(chat_id).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl RecipeCatalog for DatabaseStorage {
    async fn find_recipe(&self, id: i64, language: Language) -> Result<Option<Recipe>, String> {
        self.db
            .find_recipe(id, language.code())
            .map_err(|e| e.to_string())
    }

    async fn list_active_recipes(&self, language: Language) -> Result<Vec<Recipe>, String> {
        self.db
            .list_active_recipes(language.code())
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl TtlStore for DatabaseStorage {
    async fn set(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), String> {
        self.db
            .ttl_set(key, value, expires_at, now)
            .map_err(|e| e.to_string())
    }

    async fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<String>, String> {
        self.db.ttl_get(key, now).map_err(|e| e.to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        self.db.ttl_delete(key).map_err(|e| e.to_string())
    }
}
