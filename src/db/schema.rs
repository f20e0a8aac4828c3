//! Database schema and record types

use crate::i18n::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    telegram_id INTEGER NOT NULL UNIQUE,
    language_code TEXT,
    first_name TEXT,
    username TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS recipes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    language_code TEXT NOT NULL,
    description TEXT NOT NULL,
    steps TEXT NOT NULL,
    ingredients TEXT NOT NULL,
    timers TEXT NOT NULL,
    tips TEXT NOT NULL,
    difficulty INTEGER NOT NULL DEFAULT 1,
    total_time INTEGER NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recipes_language ON recipes(language_code, is_active);

CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id INTEGER NOT NULL,
    recipe_id INTEGER NOT NULL,
    state TEXT NOT NULL DEFAULT '{"type":"opened"}',
    current_step INTEGER NOT NULL DEFAULT 1,
    completed_steps TEXT NOT NULL DEFAULT '[]',
    active BOOLEAN NOT NULL DEFAULT 1,
    version INTEGER NOT NULL DEFAULT 0,
    started_at TEXT NOT NULL,
    completed_at TEXT,

    FOREIGN KEY (chat_id) REFERENCES users(telegram_id) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_one_active
    ON sessions(chat_id, recipe_id) WHERE active = 1;
CREATE INDEX IF NOT EXISTS idx_sessions_chat ON sessions(chat_id, started_at DESC);

CREATE TABLE IF NOT EXISTS ttl_entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ttl_entries_expiry ON ttl_entries(expires_at);
"#;

/// Chat user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub language_code: Option<String>,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

impl User {
    /// Effective interface language (English until one is chosen)
    pub fn language(&self) -> Language {
        Language::from_preference(self.language_code.as_deref())
    }
}

/// Recipe content as loaded into the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub language_code: String,
    pub description: String,
    pub steps: Vec<String>,
    pub ingredients: Vec<String>,
    /// Timer durations in seconds, indexed by step. Steps past the end of
    /// this list have no timer.
    #[serde(default)]
    pub timers: Vec<u32>,
    #[serde(default)]
    pub tips: Vec<String>,
    pub difficulty: u8,
}

/// Immutable recipe record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub language_code: String,
    pub description: String,
    pub steps: Vec<String>,
    pub ingredients: Vec<String>,
    pub timers: Vec<u32>,
    pub tips: Vec<String>,
    pub difficulty: u8,
    pub is_active: bool,
}

impl Recipe {
    pub fn from_new(id: i64, new: NewRecipe) -> Self {
        Self {
            id,
            name: new.name,
            language_code: new.language_code,
            description: new.description,
            steps: new.steps,
            ingredients: new.ingredients,
            timers: new.timers,
            tips: new.tips,
            difficulty: new.difficulty.clamp(1, 5),
            is_active: true,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn steps_count(&self) -> u32 {
        self.steps.len() as u32
    }

    /// Step text, 1-based
    pub fn step(&self, step_number: u32) -> Option<&str> {
        let index = usize::try_from(step_number.checked_sub(1)?).ok()?;
        self.steps.get(index).map(String::as_str)
    }

    /// Timer duration in seconds for a step, 1-based
    pub fn timer_for_step(&self, step_number: u32) -> Option<u32> {
        if step_number > self.steps_count() {
            return None;
        }
        let index = usize::try_from(step_number.checked_sub(1)?).ok()?;
        self.timers.get(index).copied().filter(|&secs| secs > 0)
    }

    /// Sum of all timer durations, in seconds
    pub fn total_time(&self) -> u64 {
        self.timers.iter().map(|&t| u64::from(t)).sum()
    }

    pub fn difficulty_stars(&self) -> String {
        "⭐".repeat(usize::from(self.difficulty))
    }
}

/// Phase of a persisted session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// Recipe card shown, no step opened yet
    #[default]
    Opened,
    /// A step screen is open; the step is `Session::current_step`
    InStep,
    /// Final step marked complete (terminal)
    Completed,
}

/// One attempt at brewing a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub chat_id: i64,
    pub recipe_id: i64,
    pub state: SessionState,
    pub current_step: u32,
    /// Unique step numbers in completion order
    pub completed_steps: Vec<u32>,
    pub active: bool,
    /// Incremented on every save; used for compare-and-swap updates
    pub version: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(id: i64, chat_id: i64, recipe_id: i64, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            chat_id,
            recipe_id,
            state: SessionState::Opened,
            current_step: 1,
            completed_steps: Vec::new(),
            active: true,
            version: 0,
            started_at,
            completed_at: None,
        }
    }

    /// Record a step as completed; completing it again is a no-op
    pub fn mark_step_completed(&mut self, step_number: u32) {
        if !self.is_step_completed(step_number) {
            self.completed_steps.push(step_number);
        }
    }

    pub fn is_step_completed(&self, step_number: u32) -> bool {
        self.completed_steps.contains(&step_number)
    }

    /// Terminate the session. Irreversible for this instance.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.state = SessionState::Completed;
        self.active = false;
        self.completed_at = Some(now);
    }

    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }

    /// Seconds between start and completion (or `now` if still running)
    pub fn duration_secs(&self, now: DateTime<Utc>) -> u64 {
        let end = self.completed_at.unwrap_or(now);
        u64::try_from((end - self.started_at).num_seconds()).unwrap_or(0)
    }
}

/// Aggregate brewing statistics for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserStats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub total_time_seconds: u64,
    /// Percentage of started sessions that were completed, one decimal
    pub completion_rate: f64,
}

impl UserStats {
    #[allow(clippy::cast_precision_loss)]
    pub fn new(total_sessions: u64, completed_sessions: u64, total_time_seconds: u64) -> Self {
        let completion_rate = if total_sessions == 0 {
            0.0
        } else {
            let rate = completed_sessions as f64 / total_sessions as f64 * 100.0;
            (rate * 10.0).round() / 10.0
        };
        Self {
            total_sessions,
            completed_sessions,
            total_time_seconds,
            completion_rate,
        }
    }
}
