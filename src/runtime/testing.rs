//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use super::{ChatRuntime, EventKind, InboundEvent, Outcome};
use crate::clock::Clock;
use crate::db::{NewRecipe, Recipe, Session, User, UserStats};
use crate::i18n::Language;
use crate::state_machine::Notification;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Manual Clock
// ============================================================================

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ============================================================================
// In-Memory Storage
// ============================================================================

#[derive(Default)]
struct StorageState {
    users: HashMap<i64, User>,
    recipes: Vec<Recipe>,
    sessions: Vec<Session>,
    ttl: HashMap<String, (String, DateTime<Utc>)>,
}

/// In-memory storage for testing
pub struct InMemoryStorage {
    state: Mutex<StorageState>,
    injected_conflicts: AtomicU32,
    panic_on_user_lookup: AtomicBool,
}

#[allow(dead_code)]
impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StorageState::default()),
            injected_conflicts: AtomicU32::new(0),
            panic_on_user_lookup: AtomicBool::new(false),
        }
    }

    pub fn add_recipe(&self, recipe: NewRecipe) -> Recipe {
        let mut state = self.state.lock().unwrap();
        let id = i64::try_from(state.recipes.len()).unwrap() + 1;
        let recipe = Recipe::from_new(id, recipe);
        state.recipes.push(recipe.clone());
        recipe
    }

    pub fn user(&self, chat_id: i64) -> Option<User> {
        self.state.lock().unwrap().users.get(&chat_id).cloned()
    }

    /// Every session ever created, in creation order
    pub fn sessions(&self) -> Vec<Session> {
        self.state.lock().unwrap().sessions.clone()
    }

    /// Keys of live TTL entries
    pub fn ttl_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.state.lock().unwrap().ttl.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Make the next `n` session saves fail as if another writer won
    pub fn inject_conflicts(&self, n: u32) {
        self.injected_conflicts.store(n, Ordering::SeqCst);
    }

    pub fn set_panic_on_user_lookup(&self, enabled: bool) {
        self.panic_on_user_lookup.store(enabled, Ordering::SeqCst);
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryStorage {
    async fn find_or_create_user(
        &self,
        chat_id: i64,
        first_name: Option<&str>,
        username: Option<&str>,
    ) -> Result<User, String> {
        assert!(
            !self.panic_on_user_lookup.load(Ordering::SeqCst),
            "user lookup exploded"
        );
        let mut state = self.state.lock().unwrap();
        let next_id = i64::try_from(state.users.len()).unwrap() + 1;
        let user = state.users.entry(chat_id).or_insert_with(|| User {
            id: next_id,
            telegram_id: chat_id,
            language_code: None,
            first_name: first_name.map(str::to_string),
            username: username.map(str::to_string),
        });
        Ok(user.clone())
    }

    async fn set_language(&self, chat_id: i64, language: Language) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .get_mut(&chat_id)
            .ok_or_else(|| format!("User not found: {chat_id}"))?;
        user.language_code = Some(language.code().to_string());
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemoryStorage {
    async fn find_active_session(
        &self,
        chat_id: i64,
        recipe_id: i64,
    ) -> Result<Option<Session>, String> {
        let state = self.state.lock().unwrap();
        Ok(state
            .sessions
            .iter()
            .find(|s| s.chat_id == chat_id && s.recipe_id == recipe_id && s.active)
            .cloned())
    }

    async fn find_or_create_session(
        &self,
        chat_id: i64,
        recipe_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Session, String> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .sessions
            .iter()
            .find(|s| s.chat_id == chat_id && s.recipe_id == recipe_id && s.active)
        {
            return Ok(existing.clone());
        }
        let id = i64::try_from(state.sessions.len()).unwrap() + 1;
        let session = Session::new(id, chat_id, recipe_id, now);
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn save_session(&self, session: &Session) -> Result<Session, SaveError> {
        let pending = self.injected_conflicts.load(Ordering::SeqCst);
        if pending > 0 {
            self.injected_conflicts.store(pending - 1, Ordering::SeqCst);
            return Err(SaveError::Conflict(session.id));
        }

        let mut state = self.state.lock().unwrap();
        let stored = state
            .sessions
            .iter_mut()
            .find(|s| s.id == session.id)
            .ok_or_else(|| SaveError::Store(format!("Session not found: {}", session.id)))?;
        if stored.version != session.version {
            return Err(SaveError::Conflict(session.id));
        }
        let mut saved = session.clone();
        saved.version += 1;
        *stored = saved.clone();
        Ok(saved)
    }

    async fn user_stats(&self, chat_id: i64) -> Result<UserStats, String> {
        let state = self.state.lock().unwrap();
        let mine: Vec<_> = state.sessions.iter().filter(|s| s.chat_id == chat_id).collect();
        let completed: Vec<_> = mine.iter().filter(|s| s.completed_at.is_some()).collect();
        let seconds = completed
            .iter()
            .filter_map(|s| s.completed_at.map(|end| s.duration_secs(end)))
            .sum();
        Ok(UserStats::new(
            mine.len() as u64,
            completed.len() as u64,
            seconds,
        ))
    }
}

#[async_trait]
impl RecipeCatalog for InMemoryStorage {
    async fn find_recipe(&self, id: i64, language: Language) -> Result<Option<Recipe>, String> {
        let state = self.state.lock().unwrap();
        Ok(state
            .recipes
            .iter()
            .find(|r| r.id == id && r.language_code == language.code() && r.is_active)
            .cloned())
    }

    async fn list_active_recipes(&self, language: Language) -> Result<Vec<Recipe>, String> {
        let state = self.state.lock().unwrap();
        let mut recipes: Vec<_> = state
            .recipes
            .iter()
            .filter(|r| r.language_code == language.code() && r.is_active)
            .cloned()
            .collect();
        recipes.sort_by(|a, b| a.difficulty.cmp(&b.difficulty).then_with(|| a.name.cmp(&b.name)));
        Ok(recipes)
    }
}

#[async_trait]
impl TtlStore for InMemoryStorage {
    async fn set(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        state.ttl.retain(|_, (_, expires)| *expires > now);
        state
            .ttl
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<String>, String> {
        let mut state = self.state.lock().unwrap();
        match state.ttl.get(key) {
            Some((value, expires_at)) if *expires_at > now => Ok(Some(value.clone())),
            Some(_) => {
                state.ttl.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        self.state.lock().unwrap().ttl.remove(key);
        Ok(())
    }
}

// ============================================================================
// Recording Notifier
// ============================================================================

/// Notifier that keeps everything it is given
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    acknowledged: Mutex<Vec<String>>,
    failing: AtomicBool,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("delivery queue closed".to_string());
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), String> {
        self.acknowledged
            .lock()
            .unwrap()
            .push(callback_id.to_string());
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn sample_recipes() -> Vec<NewRecipe> {
    vec![
        NewRecipe {
            name: "Classic Aeropress".to_string(),
            language_code: "en".to_string(),
            description: "Balanced and simple".to_string(),
            steps: vec![
                "Rinse the filter".to_string(),
                "Pour 50g water and stir".to_string(),
                "Press slowly".to_string(),
            ],
            ingredients: vec!["Coffee: 17g".to_string(), "Water: 150g".to_string()],
            timers: vec![30, 60],
            tips: vec!["Use fresh coffee".to_string()],
            difficulty: 2,
        },
        NewRecipe {
            name: "For Beginners".to_string(),
            language_code: "en".to_string(),
            description: "Hard to get wrong".to_string(),
            steps: vec!["Pour".to_string(), "Press".to_string()],
            ingredients: vec!["Coffee: 15g".to_string()],
            timers: vec![60],
            tips: vec![],
            difficulty: 1,
        },
    ]
}

pub fn start_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

// ============================================================================
// Test Runtime
// ============================================================================

pub type TestChatRuntime = ChatRuntime<Arc<InMemoryStorage>, Arc<RecordingNotifier>>;

/// Helper for driving a runtime with minimal boilerplate
pub struct TestRuntime {
    pub storage: Arc<InMemoryStorage>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub runtime: Arc<TestChatRuntime>,
    next_update_id: AtomicI64,
}

#[allow(dead_code)]
impl TestRuntime {
    pub fn new() -> Self {
        Self::with_recipes(Vec::new())
    }

    pub fn with_recipes(recipes: Vec<NewRecipe>) -> Self {
        let storage = Arc::new(InMemoryStorage::new());
        for recipe in recipes {
            storage.add_recipe(recipe);
        }
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let runtime = Arc::new(ChatRuntime::new(
            storage.clone(),
            notifier.clone(),
            clock.clone(),
            Duration::from_secs(60),
        ));
        Self {
            storage,
            notifier,
            clock,
            runtime,
            next_update_id: AtomicI64::new(1),
        }
    }

    pub fn event(&self, chat_id: i64, kind: EventKind, payload: &str) -> InboundEvent {
        let update_id = self.next_update_id.fetch_add(1, Ordering::SeqCst);
        InboundEvent {
            update_id,
            chat_id,
            display_name: Some("Ann".to_string()),
            username: Some("ann".to_string()),
            kind,
            payload: payload.to_string(),
            callback_id: (kind == EventKind::Button).then(|| format!("cb-{update_id}")),
        }
    }

    /// Send a text message
    pub async fn text(&self, chat_id: i64, text: &str) -> Outcome {
        self.runtime
            .handle(self.event(chat_id, EventKind::Text, text))
            .await
    }

    /// Press a button
    pub async fn press(&self, chat_id: i64, token: &str) -> Outcome {
        self.runtime
            .handle(self.event(chat_id, EventKind::Button, token))
            .await
    }

    pub fn recipe_id(&self, name: &str) -> i64 {
        self.storage
            .state
            .lock()
            .unwrap()
            .recipes
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.id)
            .unwrap()
    }
}

/// The single notification of a handled outcome
pub fn single(outcome: &Outcome) -> &Notification {
    match outcome {
        Outcome::Handled { notifications } => {
            assert_eq!(notifications.len(), 1, "expected one notification");
            &notifications[0]
        }
        Outcome::Ignored => panic!("expected a handled outcome"),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{text, Msg};
    use crate::runtime::{EventDispatcher, RuntimeManager};

    const CHAT: i64 = 555;

    fn tokens(n: &Notification) -> Vec<&str> {
        n.keyboard.as_ref().map(|k| k.tokens()).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_start_language_and_empty_catalog() {
        let rt = TestRuntime::with_recipes(sample_recipes());

        let prompt = rt.text(CHAT, "/start").await;
        assert_eq!(tokens(single(&prompt)), vec!["lang_ru", "lang_en"]);

        let menu = rt.press(CHAT, "lang_ru").await;
        assert_eq!(single(&menu).text, text(Language::Ru, Msg::Welcome));
        assert_eq!(
            rt.storage.user(CHAT).unwrap().language_code.as_deref(),
            Some("ru")
        );

        // Only English recipes are loaded
        let list = rt.press(CHAT, "show_recipes").await;
        let note = single(&list);
        assert_eq!(note.text, text(Language::Ru, Msg::NoRecipes));
        assert_eq!(tokens(note), vec!["back_to_main"]);
    }

    #[tokio::test]
    async fn test_default_language_is_english() {
        let rt = TestRuntime::new();
        let help = rt.text(CHAT, "/help").await;
        assert_eq!(single(&help).text, text(Language::En, Msg::Help));
    }

    #[tokio::test]
    async fn test_full_brewing_flow() {
        let rt = TestRuntime::with_recipes(sample_recipes());
        let id = rt.recipe_id("Classic Aeropress");
        rt.press(CHAT, "lang_en").await;

        let list = rt.press(CHAT, "show_recipes").await;
        let labels: Vec<_> = single(&list).keyboard.as_ref().unwrap().rows[..2]
            .iter()
            .map(|row| row[0].label.clone())
            .collect();
        assert_eq!(labels, vec!["For Beginners ⭐ (1:00)", "Classic Aeropress ⭐⭐ (1:30)"]);

        let card = rt.press(CHAT, &format!("recipe_{id}")).await;
        assert!(single(&card).text.contains("Classic Aeropress"));
        assert_eq!(rt.storage.sessions().len(), 1);

        let step = rt.press(CHAT, &format!("step_{id}_1")).await;
        assert_eq!(
            tokens(single(&step)),
            vec![
                format!("timer_{id}_1"),
                format!("complete_step_{id}_1"),
                format!("step_{id}_2"),
                format!("recipe_{id}"),
            ]
        );

        let started = rt.press(CHAT, &format!("timer_{id}_1")).await;
        assert!(single(&started).text.contains("30s"));
        assert_eq!(
            rt.storage.ttl_keys(),
            vec![format!("timer:{CHAT}:{id}:1"), format!("timer_state:{CHAT}:{id}:1")]
        );

        rt.clock.advance(ChronoDuration::seconds(10));
        let running = rt.press(CHAT, &format!("step_{id}_1")).await;
        let note = single(&running);
        assert!(tokens(note).contains(&format!("stop_timer_{id}_1").as_str()));
        assert!(note.text.contains("20s left"));

        rt.clock.advance(ChronoDuration::seconds(25));
        let elapsed = rt.press(CHAT, &format!("step_{id}_1")).await;
        assert!(single(&elapsed).text.contains("Time is up"));

        rt.press(CHAT, &format!("stop_timer_{id}_1")).await;
        assert!(rt.storage.ttl_keys().is_empty());

        for n in 1..=2 {
            let done = rt.press(CHAT, &format!("complete_step_{id}_{n}")).await;
            assert_eq!(
                tokens(single(&done)),
                vec![format!("step_{id}_{}", n + 1), format!("recipe_{id}")]
            );
        }

        rt.clock.advance(ChronoDuration::seconds(60));
        let finished = rt.press(CHAT, &format!("complete_step_{id}_3")).await;
        let note = single(&finished);
        assert_eq!(tokens(note), vec!["back_to_recipes", "back_to_main"]);
        assert!(note.text.contains("Brewing took 1:35"));

        let session = &rt.storage.sessions()[0];
        assert!(!session.active);
        assert!(session.completed_at.is_some());
        assert_eq!(session.completed_steps, vec![1, 2, 3]);

        // Completed sessions stay completed
        let again = rt.press(CHAT, &format!("complete_step_{id}_3")).await;
        assert_eq!(single(&again).text, text(Language::En, Msg::SessionNotFound));
        assert_eq!(rt.storage.sessions()[0], *session);

        // Reopening starts a fresh session
        rt.press(CHAT, &format!("recipe_{id}")).await;
        let sessions = rt.storage.sessions();
        assert_eq!(sessions.len(), 2);
        assert!(sessions[1].active);
        assert_eq!(sessions[1].current_step, 1);
    }

    #[tokio::test]
    async fn test_step_before_opening_recipe() {
        let rt = TestRuntime::with_recipes(sample_recipes());
        let id = rt.recipe_id("For Beginners");
        let outcome = rt.press(CHAT, &format!("step_{id}_1")).await;
        let note = single(&outcome);
        assert_eq!(note.text, text(Language::En, Msg::SessionNotFound));
        assert!(note.keyboard.is_none());
        assert!(rt.storage.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_recipe_and_language_mismatch() {
        let rt = TestRuntime::with_recipes(sample_recipes());
        let id = rt.recipe_id("For Beginners");
        rt.press(CHAT, "lang_ru").await;

        let outcome = rt.press(CHAT, &format!("recipe_{id}")).await;
        assert_eq!(single(&outcome).text, text(Language::Ru, Msg::RecipeNotFound));
        assert!(rt.storage.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_token_is_ignored_but_acknowledged() {
        let rt = TestRuntime::new();
        let outcome = rt.press(CHAT, "bogus_token").await;
        assert_eq!(outcome, Outcome::Ignored);
        assert!(rt.notifier.sent().is_empty());
        assert_eq!(rt.notifier.acknowledged().len(), 1);
    }

    #[tokio::test]
    async fn test_plain_text_is_ignored() {
        let rt = TestRuntime::new();
        assert_eq!(rt.text(CHAT, "what should I brew?").await, Outcome::Ignored);
        assert!(rt.storage.user(CHAT).is_none());
    }

    #[tokio::test]
    async fn test_write_conflict_is_retried() {
        let rt = TestRuntime::with_recipes(sample_recipes());
        let id = rt.recipe_id("For Beginners");
        rt.press(CHAT, &format!("recipe_{id}")).await;

        rt.storage.inject_conflicts(2);
        let outcome = rt.press(CHAT, &format!("complete_step_{id}_1")).await;
        assert!(single(&outcome).text.contains("Step 1 completed"));
        assert_eq!(rt.storage.sessions()[0].completed_steps, vec![1]);
    }

    #[tokio::test]
    async fn test_persistent_conflict_sends_nothing() {
        let rt = TestRuntime::with_recipes(sample_recipes());
        let id = rt.recipe_id("For Beginners");
        rt.press(CHAT, &format!("recipe_{id}")).await;
        let before = rt.notifier.sent().len();

        rt.storage.inject_conflicts(10);
        let outcome = rt.press(CHAT, &format!("complete_step_{id}_1")).await;
        assert_eq!(outcome, Outcome::Ignored);
        assert_eq!(rt.notifier.sent().len(), before);
        assert!(rt.storage.sessions()[0].completed_steps.is_empty());
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let rt = TestRuntime::new();
        rt.storage.set_panic_on_user_lookup(true);
        assert_eq!(rt.text(CHAT, "/help").await, Outcome::Ignored);

        rt.storage.set_panic_on_user_lookup(false);
        let help = rt.text(CHAT, "/help").await;
        assert_eq!(single(&help).text, text(Language::En, Msg::Help));
    }

    #[tokio::test]
    async fn test_delivery_failure_is_contained() {
        let rt = TestRuntime::new();
        rt.notifier.set_failing(true);
        assert_eq!(rt.text(CHAT, "/help").await, Outcome::Ignored);
        rt.notifier.set_failing(false);
        assert!(matches!(rt.text(CHAT, "/help").await, Outcome::Handled { .. }));
    }

    #[tokio::test]
    async fn test_stats_after_completion() {
        let rt = TestRuntime::with_recipes(sample_recipes());
        let id = rt.recipe_id("For Beginners");
        rt.press(CHAT, &format!("recipe_{id}")).await;
        rt.clock.advance(ChronoDuration::seconds(70));
        rt.press(CHAT, &format!("complete_step_{id}_1")).await;
        rt.press(CHAT, &format!("complete_step_{id}_2")).await;

        let stats = rt.text(CHAT, "/stats").await;
        let note = single(&stats);
        assert!(note.text.contains("Started: 1"));
        assert!(note.text.contains("Completed: 1"));
        assert!(note.text.contains("Total time: 1:10"));
        assert!(note.text.contains("100.0%"));
    }

    #[tokio::test]
    async fn test_timer_for_step_without_timer() {
        let rt = TestRuntime::with_recipes(sample_recipes());
        let id = rt.recipe_id("For Beginners");
        let outcome = rt.press(CHAT, &format!("timer_{id}_2")).await;
        assert_eq!(single(&outcome).text, text(Language::En, Msg::TimerUnavailable));
        assert!(rt.storage.ttl_keys().is_empty());
    }

    async fn wait_for_sent(notifier: &RecordingNotifier, count: usize) -> Vec<Notification> {
        for _ in 0..200 {
            let sent = notifier.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for {count} notifications");
    }

    #[tokio::test]
    async fn test_manager_preserves_per_chat_order() {
        let rt = TestRuntime::with_recipes(sample_recipes());
        let manager = RuntimeManager::new(rt.runtime.clone(), Duration::from_secs(60));

        manager
            .dispatch(rt.event(1, EventKind::Text, "/start"))
            .await
            .unwrap();
        manager
            .dispatch(rt.event(1, EventKind::Button, "lang_ru"))
            .await
            .unwrap();
        manager
            .dispatch(rt.event(2, EventKind::Text, "/help"))
            .await
            .unwrap();
        manager
            .dispatch(rt.event(1, EventKind::Text, "/help"))
            .await
            .unwrap();

        let sent = wait_for_sent(&rt.notifier, 4).await;
        let chat_one: Vec<_> = sent
            .iter()
            .filter(|n| n.chat_id == 1)
            .map(|n| n.text.clone())
            .collect();
        assert_eq!(
            chat_one,
            vec![
                text(Language::En, Msg::LanguagePrompt),
                text(Language::Ru, Msg::Welcome),
                text(Language::Ru, Msg::Help),
            ]
        );
        assert_eq!(manager.active_workers().await, 2);
    }

    #[tokio::test]
    async fn test_idle_worker_shuts_down_and_respawns() {
        let rt = TestRuntime::new();
        let manager = RuntimeManager::new(rt.runtime.clone(), Duration::from_millis(20));

        manager
            .dispatch(rt.event(1, EventKind::Text, "/help"))
            .await
            .unwrap();
        wait_for_sent(&rt.notifier, 1).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(manager.active_workers().await, 0);

        manager
            .dispatch(rt.event(1, EventKind::Text, "/help"))
            .await
            .unwrap();
        wait_for_sent(&rt.notifier, 2).await;
    }
}
