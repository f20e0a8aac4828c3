//! Database module for the brewing assistant
//!
//! Provides persistence for users, recipes, sessions and TTL-bound entries.

mod schema;

pub use schema::*;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Recipe set bundled with the binary, loaded into an empty catalog
const BUNDLED_RECIPES: &str = include_str!("../data/recipes.json");

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
    #[error("User not found: {0}")]
    UserNotFound(i64),
    #[error("Session {0} was modified concurrently")]
    SessionConflict(i64),
    #[error("Database lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== User Operations ====================

    /// Find a user by chat id, creating the record on first contact
    pub fn find_or_create_user(
        &self,
        telegram_id: i64,
        first_name: Option<&str>,
        username: Option<&str>,
    ) -> DbResult<User> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (telegram_id, first_name, username, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(telegram_id) DO NOTHING",
            params![telegram_id, first_name, username, Utc::now().to_rfc3339()],
        )?;
        Self::select_user(&conn, telegram_id)?.ok_or(DbError::UserNotFound(telegram_id))
    }

    /// Get a user by chat id
    #[allow(dead_code)] // Used in tests
    pub fn get_user(&self, telegram_id: i64) -> DbResult<Option<User>> {
        let conn = self.conn()?;
        Self::select_user(&conn, telegram_id)
    }

    fn select_user(conn: &Connection, telegram_id: i64) -> DbResult<Option<User>> {
        conn.query_row(
            "SELECT id, telegram_id, language_code, first_name, username
             FROM users WHERE telegram_id = ?1",
            params![telegram_id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    telegram_id: row.get(1)?,
                    language_code: row.get(2)?,
                    first_name: row.get(3)?,
                    username: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(DbError::from)
    }

    /// Update the interface language of a user
    pub fn set_language(&self, telegram_id: i64, language_code: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE users SET language_code = ?1 WHERE telegram_id = ?2",
            params![language_code, telegram_id],
        )?;
        if updated == 0 {
            return Err(DbError::UserNotFound(telegram_id));
        }
        Ok(())
    }

    // ==================== Recipe Operations ====================

    /// Insert a recipe into the catalog
    #[allow(dead_code)] // Used in tests
    pub fn insert_recipe(&self, recipe: &NewRecipe) -> DbResult<Recipe> {
        let conn = self.conn()?;
        Self::insert_recipe_internal(&conn, recipe)
    }

    fn insert_recipe_internal(conn: &Connection, recipe: &NewRecipe) -> DbResult<Recipe> {
        let total_time: u64 = recipe.timers.iter().map(|&t| u64::from(t)).sum();
        #[allow(clippy::cast_possible_wrap)]
        let total_time = total_time as i64;

        conn.execute(
            "INSERT INTO recipes (name, language_code, description, steps, ingredients, timers, tips, difficulty, total_time, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10)",
            params![
                recipe.name,
                recipe.language_code,
                recipe.description,
                serde_json::to_string(&recipe.steps)?,
                serde_json::to_string(&recipe.ingredients)?,
                serde_json::to_string(&recipe.timers)?,
                serde_json::to_string(&recipe.tips)?,
                recipe.difficulty.clamp(1, 5),
                total_time,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(Recipe::from_new(conn.last_insert_rowid(), recipe.clone()))
    }

    /// Load the bundled recipe set if the catalog is empty. Returns the
    /// number of recipes inserted.
    pub fn seed_recipes(&self) -> DbResult<usize> {
        let recipes: Vec<NewRecipe> = serde_json::from_str(BUNDLED_RECIPES)?;
        let mut conn = self.conn()?;

        let existing: i64 = conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(0);
        }

        let tx = conn.transaction()?;
        for recipe in &recipes {
            Self::insert_recipe_internal(&tx, recipe)?;
        }
        tx.commit()?;
        Ok(recipes.len())
    }

    /// Find an active recipe by id in the given language
    pub fn find_recipe(&self, id: i64, language_code: &str) -> DbResult<Option<Recipe>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, name, language_code, description, steps, ingredients, timers, tips, difficulty, is_active
                 FROM recipes WHERE id = ?1 AND language_code = ?2 AND is_active = 1",
                params![id, language_code],
                RecipeRow::from_row,
            )
            .optional()?;
        row.map(RecipeRow::into_recipe).transpose()
    }

    /// List active recipes in a language, easiest first, then by name
    pub fn list_active_recipes(&self, language_code: &str) -> DbResult<Vec<Recipe>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, language_code, description, steps, ingredients, timers, tips, difficulty, is_active
             FROM recipes
             WHERE language_code = ?1 AND is_active = 1
             ORDER BY difficulty ASC, name ASC",
        )?;

        let rows = stmt.query_map(params![language_code], RecipeRow::from_row)?;
        rows.map(|row| row.map_err(DbError::from).and_then(RecipeRow::into_recipe))
            .collect()
    }

    // ==================== Session Operations ====================

    /// Find the active session of a chat for a recipe
    pub fn find_active_session(&self, chat_id: i64, recipe_id: i64) -> DbResult<Option<Session>> {
        let conn = self.conn()?;
        Self::select_active_session(&conn, chat_id, recipe_id)
    }

    fn select_active_session(
        conn: &Connection,
        chat_id: i64,
        recipe_id: i64,
    ) -> DbResult<Option<Session>> {
        let row = conn
            .query_row(
                "SELECT id, chat_id, recipe_id, state, current_step, completed_steps, active, version, started_at, completed_at
                 FROM sessions WHERE chat_id = ?1 AND recipe_id = ?2 AND active = 1",
                params![chat_id, recipe_id],
                SessionRow::from_row,
            )
            .optional()?;
        row.map(SessionRow::into_session).transpose()
    }

    /// Return the active session for a recipe, creating one if none exists.
    ///
    /// The partial unique index on active sessions makes the insert a no-op
    /// when another writer created the session first.
    pub fn find_or_create_session(
        &self,
        chat_id: i64,
        recipe_id: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Session> {
        let conn = self.conn()?;
        let fresh = Session::new(0, chat_id, recipe_id, now);

        conn.execute(
            "INSERT INTO sessions (chat_id, recipe_id, state, current_step, completed_steps, active, version, started_at)
             VALUES (?1, ?2, ?3, 1, '[]', 1, 0, ?4)
             ON CONFLICT DO NOTHING",
            params![
                chat_id,
                recipe_id,
                serde_json::to_string(&fresh.state)?,
                now.to_rfc3339()
            ],
        )?;

        Self::select_active_session(&conn, chat_id, recipe_id)?
            .ok_or(DbError::SessionConflict(0))
    }

    /// Compare-and-swap update of a session. Fails with
    /// `SessionConflict` if the stored version differs from `session.version`.
    pub fn save_session(&self, session: &Session) -> DbResult<Session> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE sessions
             SET state = ?1, current_step = ?2, completed_steps = ?3, active = ?4,
                 completed_at = ?5, version = version + 1
             WHERE id = ?6 AND version = ?7",
            params![
                serde_json::to_string(&session.state)?,
                session.current_step,
                serde_json::to_string(&session.completed_steps)?,
                session.active,
                session.completed_at.map(|t| t.to_rfc3339()),
                session.id,
                session.version,
            ],
        )?;

        if updated == 0 {
            return Err(DbError::SessionConflict(session.id));
        }

        let mut saved = session.clone();
        saved.version += 1;
        Ok(saved)
    }

    /// Aggregate statistics over all sessions of a chat
    pub fn user_stats(&self, chat_id: i64) -> DbResult<UserStats> {
        let conn = self.conn()?;
        let (total, completed, seconds): (i64, i64, Option<f64>) = conn.query_row(
            "SELECT COUNT(*),
                    COUNT(completed_at),
                    SUM(CASE WHEN completed_at IS NOT NULL
                        THEN (julianday(completed_at) - julianday(started_at)) * 86400.0 END)
             FROM sessions WHERE chat_id = ?1",
            params![chat_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let seconds = seconds.unwrap_or(0.0).max(0.0).round() as u64;
        Ok(UserStats::new(
            u64::try_from(total).unwrap_or(0),
            u64::try_from(completed).unwrap_or(0),
            seconds,
        ))
    }

    // ==================== TTL Entry Operations ====================

    /// Store a value that disappears at `expires_at`. Every entry already
    /// expired at `now` is deleted in the same transaction.
    pub fn ttl_set(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let swept = tx.execute(
            "DELETE FROM ttl_entries WHERE expires_at <= ?1",
            params![now.timestamp_millis()],
        )?;
        tx.execute(
            "INSERT INTO ttl_entries (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![key, value, expires_at.timestamp_millis()],
        )?;
        tx.commit()?;

        if swept > 0 {
            tracing::debug!(swept, "Swept expired TTL entries");
        }
        Ok(())
    }

    /// Read a value unless it has expired. An expired row for `key` is
    /// purged on the way.
    pub fn ttl_get(&self, key: &str, now: DateTime<Utc>) -> DbResult<Option<String>> {
        let conn = self.conn()?;
        let now_ms = now.timestamp_millis();
        conn.execute(
            "DELETE FROM ttl_entries WHERE key = ?1 AND expires_at <= ?2",
            params![key, now_ms],
        )?;
        let value = conn
            .query_row(
                "SELECT value FROM ttl_entries WHERE key = ?1 AND expires_at > ?2",
                params![key, now_ms],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Delete a value; deleting a missing key is not an error
    pub fn ttl_delete(&self, key: &str) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM ttl_entries WHERE key = ?1", params![key])?;
        Ok(())
    }
}

struct RecipeRow {
    id: i64,
    name: String,
    language_code: String,
    description: String,
    steps: String,
    ingredients: String,
    timers: String,
    tips: String,
    difficulty: u8,
    is_active: bool,
}

impl RecipeRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            language_code: row.get(2)?,
            description: row.get(3)?,
            steps: row.get(4)?,
            ingredients: row.get(5)?,
            timers: row.get(6)?,
            tips: row.get(7)?,
            difficulty: row.get(8)?,
            is_active: row.get(9)?,
        })
    }

    fn into_recipe(self) -> DbResult<Recipe> {
        Ok(Recipe {
            id: self.id,
            name: self.name,
            language_code: self.language_code,
            description: self.description,
            steps: serde_json::from_str(&self.steps)?,
            ingredients: serde_json::from_str(&self.ingredients)?,
            timers: serde_json::from_str(&self.timers)?,
            tips: serde_json::from_str(&self.tips)?,
            difficulty: self.difficulty,
            is_active: self.is_active,
        })
    }
}

struct SessionRow {
    id: i64,
    chat_id: i64,
    recipe_id: i64,
    state: String,
    current_step: u32,
    completed_steps: String,
    active: bool,
    version: i64,
    started_at: String,
    completed_at: Option<String>,
}

impl SessionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            chat_id: row.get(1)?,
            recipe_id: row.get(2)?,
            state: row.get(3)?,
            current_step: row.get(4)?,
            completed_steps: row.get(5)?,
            active: row.get(6)?,
            version: row.get(7)?,
            started_at: row.get(8)?,
            completed_at: row.get(9)?,
        })
    }

    fn into_session(self) -> DbResult<Session> {
        Ok(Session {
            id: self.id,
            chat_id: self.chat_id,
            recipe_id: self.recipe_id,
            state: serde_json::from_str(&self.state)?,
            current_step: self.current_step,
            completed_steps: serde_json::from_str(&self.completed_steps)?,
            active: self.active,
            version: self.version,
            started_at: parse_datetime(&self.started_at)?,
            completed_at: self
                .completed_at
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
        })
    }
}

fn parse_datetime(s: &str) -> DbResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}
