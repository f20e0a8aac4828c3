//! Pure state transition function
//!
//! Given the loaded snapshot and an action, decide the session mutation and
//! the screen to show. All I/O is left to the executor via `Effect`s.

use super::render::{self, Notification};
use super::{Action, ChatContext, Effect, SessionPhase, Snapshot};
use crate::db::{Recipe, Session, SessionState};
use crate::i18n::Msg;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_phase: SessionPhase,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(phase: SessionPhase) -> Self {
        Self {
            new_phase: phase,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    fn notify(self, notification: Notification) -> Self {
        self.with_effect(Effect::Notify(notification))
    }

    /// Notifications in emission order
    #[allow(dead_code)] // Used in tests
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Notify(n) => Some(n),
            _ => None,
        })
    }

    /// The session this transition writes, if any
    #[allow(dead_code)] // Used in tests
    pub fn saved_session(&self) -> Option<&Session> {
        self.effects.iter().find_map(|e| match e {
            Effect::SaveSession { session } => Some(session),
            _ => None,
        })
    }
}

/// Pure transition function
///
/// Not-found conditions render a localized notice and leave state untouched;
/// they are outcomes, not errors.
pub fn transition(snapshot: &Snapshot, ctx: &ChatContext, action: Action) -> TransitionResult {
    let phase = snapshot.phase();
    let unchanged = TransitionResult::new(phase);
    let chat_id = ctx.chat_id;
    let lang = ctx.language;

    match action {
        Action::Start => unchanged.notify(render::language_prompt(chat_id)),

        // Language belongs to the user, not the session
        Action::SetLanguage(language) => unchanged
            .with_effect(Effect::SetLanguage { language })
            .notify(render::main_menu(chat_id, language)),

        Action::BackToMain => unchanged.notify(render::main_menu(chat_id, lang)),

        Action::ShowHelp => unchanged.notify(render::help(chat_id, lang)),

        Action::BackToRecipes | Action::ShowRecipes => {
            unchanged.notify(render::recipe_list(chat_id, lang, &snapshot.recipes))
        }

        Action::ShowStats => {
            let stats = snapshot.stats.clone().unwrap_or_default();
            unchanged.notify(render::stats(chat_id, lang, &stats))
        }

        Action::OpenRecipe { recipe_id } => {
            let Some(recipe) = matching_recipe(snapshot, recipe_id) else {
                return unchanged.notify(render::notice(chat_id, lang, Msg::RecipeNotFound));
            };
            let card = render::recipe_card(chat_id, lang, recipe);
            // Only active sessions are loaded, so a finished one shows up as
            // no session and the store hands out a fresh one
            if snapshot.session.is_some() {
                unchanged.notify(card)
            } else {
                TransitionResult::new(SessionPhase::Opened)
                    .with_effect(Effect::OpenSession { recipe_id })
                    .notify(card)
            }
        }

        Action::OpenStep { recipe_id, step } => {
            let (recipe, session) = match require_session(snapshot, recipe_id) {
                Ok(found) => found,
                Err(msg) => return unchanged.notify(render::notice(chat_id, lang, msg)),
            };
            if recipe.step(step).is_none() {
                return unchanged.notify(render::notice(chat_id, lang, Msg::StepNotFound));
            }

            let screen =
                render::step_screen(chat_id, lang, recipe, step, snapshot.timer.as_ref());
            let mut updated = session.clone();
            updated.state = SessionState::InStep;
            updated.current_step = step;

            let result = TransitionResult::new(SessionPhase::InStep(step));
            if updated == *session {
                result.notify(screen)
            } else {
                result
                    .with_effect(Effect::SaveSession { session: updated })
                    .notify(screen)
            }
        }

        Action::CompleteStep { recipe_id, step } => {
            let (recipe, session) = match require_session(snapshot, recipe_id) {
                Ok(found) => found,
                Err(msg) => return unchanged.notify(render::notice(chat_id, lang, msg)),
            };
            if recipe.step(step).is_none() {
                return unchanged.notify(render::notice(chat_id, lang, Msg::StepNotFound));
            }

            let mut updated = session.clone();
            updated.mark_step_completed(step);

            let (new_phase, session_secs) = if step < recipe.steps_count() {
                updated.state = SessionState::InStep;
                updated.current_step = step + 1;
                (SessionPhase::InStep(step + 1), None)
            } else {
                updated.complete(snapshot.now);
                (
                    SessionPhase::Completed,
                    Some(updated.duration_secs(snapshot.now)),
                )
            };

            TransitionResult::new(new_phase)
                .with_effect(Effect::SaveSession { session: updated })
                .notify(render::step_completed(
                    chat_id,
                    lang,
                    recipe,
                    step,
                    session_secs,
                ))
        }

        Action::StartTimer { recipe_id, step } => {
            let duration = matching_recipe(snapshot, recipe_id)
                .and_then(|recipe| recipe.timer_for_step(step));
            let Some(duration) = duration else {
                return unchanged.notify(render::notice(chat_id, lang, Msg::TimerUnavailable));
            };
            let duration_secs = u64::from(duration);
            unchanged
                .with_effect(Effect::StartTimer {
                    recipe_id,
                    step,
                    duration_secs,
                })
                .notify(render::timer_started(
                    chat_id,
                    lang,
                    recipe_id,
                    step,
                    duration_secs,
                ))
        }

        Action::StopTimer { recipe_id, step } => unchanged
            .with_effect(Effect::StopTimer { recipe_id, step })
            .notify(render::timer_stopped(chat_id, lang, recipe_id, step)),

        Action::ShowIngredients { recipe_id } => match matching_recipe(snapshot, recipe_id) {
            Some(recipe) => unchanged.notify(render::ingredients(chat_id, lang, recipe)),
            None => unchanged.notify(render::notice(chat_id, lang, Msg::RecipeNotFound)),
        },

        Action::ShowTips { recipe_id } => match matching_recipe(snapshot, recipe_id) {
            Some(recipe) => unchanged.notify(render::tips(chat_id, lang, recipe)),
            None => unchanged.notify(render::notice(chat_id, lang, Msg::RecipeNotFound)),
        },
    }
}

fn matching_recipe(snapshot: &Snapshot, recipe_id: i64) -> Option<&Recipe> {
    snapshot.recipe.as_ref().filter(|r| r.id == recipe_id)
}

/// Recipe plus the active session for it, or the notice to show instead
fn require_session(snapshot: &Snapshot, recipe_id: i64) -> Result<(&Recipe, &Session), Msg> {
    let recipe = matching_recipe(snapshot, recipe_id).ok_or(Msg::RecipeNotFound)?;
    let session = snapshot
        .session
        .as_ref()
        .filter(|s| s.recipe_id == recipe_id && s.active && !s.is_completed())
        .ok_or(Msg::SessionNotFound)?;
    Ok((recipe, session))
}
