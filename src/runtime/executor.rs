//! Chat runtime executor
//!
//! Loads the snapshot an action needs, runs the pure transition and carries
//! out the resulting effects.

use super::traits::{Notifier, SaveError, Storage, TtlStore};
use super::{InboundEvent, Outcome};
use crate::clock::Clock;
use crate::router;
use crate::state_machine::{transition, Action, ChatContext, Effect, Notification, Snapshot};
use crate::timer::{TimerError, TimerKey, TimerRegistry};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// How often a transition is recomputed after losing a session write race
const MAX_SAVE_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Storage error: {0}")]
    Store(String),
    #[error("Session {0} kept changing underneath us")]
    Conflict(i64),
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error("Delivery error: {0}")]
    Delivery(String),
}

impl From<SaveError> for RuntimeError {
    fn from(e: SaveError) -> Self {
        match e {
            SaveError::Conflict(id) => RuntimeError::Conflict(id),
            SaveError::Store(msg) => RuntimeError::Store(msg),
        }
    }
}

/// Generic chat runtime that can work with any storage and notifier
pub struct ChatRuntime<S, N>
where
    S: Storage + Clone + 'static,
    N: Notifier + 'static,
{
    storage: S,
    notifier: N,
    timers: TimerRegistry,
    clock: Arc<dyn Clock>,
}

impl<S, N> ChatRuntime<S, N>
where
    S: Storage + Clone + 'static,
    N: Notifier + 'static,
{
    pub fn new(storage: S, notifier: N, clock: Arc<dyn Clock>, timer_grace: Duration) -> Self {
        let ttl: Arc<dyn TtlStore> = Arc::new(storage.clone());
        let timers = TimerRegistry::new(ttl, clock.clone(), timer_grace);
        Self {
            storage,
            notifier,
            timers,
            clock,
        }
    }

    /// Process one inbound event. Never fails: errors and panics are logged
    /// with the update id and turn into `Outcome::Ignored`.
    pub async fn handle(&self, event: InboundEvent) -> Outcome {
        let update_id = event.update_id;
        let chat_id = event.chat_id;

        match AssertUnwindSafe(self.process(event)).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::error!(update_id, chat_id, error = %e, "Failed to process update");
                Outcome::Ignored
            }
            Err(panic) => {
                let reason = panic_message(&*panic);
                tracing::error!(update_id, chat_id, error = %reason, "Update handler panicked");
                Outcome::Ignored
            }
        }
    }

    async fn process(&self, event: InboundEvent) -> Result<Outcome, RuntimeError> {
        if let Some(callback_id) = event.callback_id.as_deref() {
            if let Err(e) = self.notifier.acknowledge(callback_id).await {
                tracing::warn!(update_id = event.update_id, error = %e, "Failed to acknowledge callback");
            }
        }

        let Some(action) = router::decode(event.kind, &event.payload) else {
            tracing::debug!(update_id = event.update_id, "No action for update");
            return Ok(Outcome::Ignored);
        };

        let user = self
            .storage
            .find_or_create_user(
                event.chat_id,
                event.display_name.as_deref(),
                event.username.as_deref(),
            )
            .await
            .map_err(RuntimeError::Store)?;
        let ctx = ChatContext::new(event.chat_id, user.language());

        tracing::info!(
            update_id = event.update_id,
            chat_id = ctx.chat_id,
            action = action.kind(),
            "Handling action"
        );

        let mut attempt = 1;
        loop {
            let snapshot = self.load_snapshot(&ctx, &action).await?;
            let result = transition(&snapshot, &ctx, action);
            tracing::debug!(chat_id = ctx.chat_id, phase = ?result.new_phase, "Transition computed");

            match self.execute_effects(&ctx, &snapshot, result.effects).await {
                Ok(notifications) => return Ok(Outcome::Handled { notifications }),
                Err(RuntimeError::Conflict(id)) if attempt < MAX_SAVE_ATTEMPTS => {
                    tracing::warn!(session_id = id, attempt, "Session write conflict, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn load_snapshot(
        &self,
        ctx: &ChatContext,
        action: &Action,
    ) -> Result<Snapshot, RuntimeError> {
        let mut snapshot = Snapshot::empty(self.clock.now());

        if let Some(recipe_id) = action.recipe_id() {
            snapshot.recipe = self
                .storage
                .find_recipe(recipe_id, ctx.language)
                .await
                .map_err(RuntimeError::Store)?;
            snapshot.session = self
                .storage
                .find_active_session(ctx.chat_id, recipe_id)
                .await
                .map_err(RuntimeError::Store)?;

            if let Some(step) = action.displayed_timer_step() {
                snapshot.timer = self
                    .timers
                    .status(TimerKey::new(ctx.chat_id, recipe_id, step))
                    .await?;
            }
        }

        if action.lists_recipes() {
            snapshot.recipes = self
                .storage
                .list_active_recipes(ctx.language)
                .await
                .map_err(RuntimeError::Store)?;
        }

        if matches!(action, Action::ShowStats) {
            snapshot.stats = Some(
                self.storage
                    .user_stats(ctx.chat_id)
                    .await
                    .map_err(RuntimeError::Store)?,
            );
        }

        Ok(snapshot)
    }

    /// Run effects in order. State effects precede notifications, so a
    /// failed write never leaves a message announcing it.
    async fn execute_effects(
        &self,
        ctx: &ChatContext,
        snapshot: &Snapshot,
        effects: Vec<Effect>,
    ) -> Result<Vec<Notification>, RuntimeError> {
        let mut sent = Vec::new();

        for effect in effects {
            match effect {
                Effect::SetLanguage { language } => {
                    self.storage
                        .set_language(ctx.chat_id, language)
                        .await
                        .map_err(RuntimeError::Store)?;
                }
                Effect::OpenSession { recipe_id } => {
                    let session = self
                        .storage
                        .find_or_create_session(ctx.chat_id, recipe_id, snapshot.now)
                        .await
                        .map_err(RuntimeError::Store)?;
                    tracing::debug!(session_id = session.id, recipe_id, "Session opened");
                }
                Effect::SaveSession { session } => {
                    let saved = self.storage.save_session(&session).await?;
                    if !saved.active {
                        tracing::info!(
                            session_id = saved.id,
                            chat_id = ctx.chat_id,
                            "Session completed"
                        );
                    }
                }
                Effect::StartTimer {
                    recipe_id,
                    step,
                    duration_secs,
                } => {
                    self.timers
                        .start(TimerKey::new(ctx.chat_id, recipe_id, step), duration_secs)
                        .await?;
                }
                Effect::StopTimer { recipe_id, step } => {
                    self.timers
                        .stop(TimerKey::new(ctx.chat_id, recipe_id, step))
                        .await?;
                }
                Effect::Notify(notification) => {
                    self.notifier
                        .notify(notification.clone())
                        .await
                        .map_err(RuntimeError::Delivery)?;
                    sent.push(notification);
                }
            }
        }

        Ok(sent)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
