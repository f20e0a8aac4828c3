//! Session phase and the read-only inputs of a transition

use crate::db::{Recipe, Session, SessionState, UserStats};
use crate::i18n::Language;
use crate::timer::TimerStatus;
use chrono::{DateTime, Utc};

/// Phase of the (chat, recipe) pair an action targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NoSession,
    Opened,
    InStep(u32),
    Completed,
}

impl SessionPhase {
    pub fn of(session: Option<&Session>) -> Self {
        match session {
            None => SessionPhase::NoSession,
            Some(s) => match s.state {
                SessionState::Opened => SessionPhase::Opened,
                SessionState::InStep => SessionPhase::InStep(s.current_step),
                SessionState::Completed => SessionPhase::Completed,
            },
        }
    }
}

/// Who the action is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatContext {
    pub chat_id: i64,
    pub language: Language,
}

impl ChatContext {
    pub fn new(chat_id: i64, language: Language) -> Self {
        Self { chat_id, language }
    }
}

/// Everything a transition may look at, loaded before it runs
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Recipe named by the action, in the chat's language
    pub recipe: Option<Recipe>,
    /// Active recipes, loaded only for list screens
    pub recipes: Vec<Recipe>,
    /// Active session for (chat, recipe)
    pub session: Option<Session>,
    /// Timer of the step being displayed
    pub timer: Option<TimerStatus>,
    pub stats: Option<UserStats>,
    pub now: DateTime<Utc>,
}

impl Snapshot {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            recipe: None,
            recipes: Vec::new(),
            session: None,
            timer: None,
            stats: None,
            now,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::of(self.session.as_ref())
    }
}
