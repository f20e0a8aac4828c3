//! Effects produced by state transitions

use super::render::Notification;
use crate::db::Session;
use crate::i18n::Language;

/// Effects to be executed after a transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Persist the user's interface language
    SetLanguage { language: Language },

    /// Find or create the active session for a recipe
    OpenSession { recipe_id: i64 },

    /// Compare-and-swap write of a modified session
    SaveSession { session: Session },

    StartTimer {
        recipe_id: i64,
        step: u32,
        duration_secs: u64,
    },

    StopTimer { recipe_id: i64, step: u32 },

    /// Queue a message for delivery
    Notify(Notification),
}

impl Effect {
    #[allow(dead_code)] // Used in tests
    pub fn is_notify(&self) -> bool {
        matches!(self, Effect::Notify(_))
    }
}
