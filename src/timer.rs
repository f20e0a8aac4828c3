//! Step countdown timers backed by a TTL store
//!
//! There is no scheduler: a timer is two TTL-bound records and expiry is
//! only observed when something queries it.

use crate::clock::Clock;
use crate::runtime::TtlStore;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const MARKER_PREFIX: &str = "timer:";
const STATE_PREFIX: &str = "timer_state:";
const BAR_CELLS: usize = 10;

/// Identity of one timer: a step of a recipe in a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerKey {
    pub chat_id: i64,
    pub recipe_id: i64,
    pub step: u32,
}

impl TimerKey {
    pub fn new(chat_id: i64, recipe_id: i64, step: u32) -> Self {
        Self {
            chat_id,
            recipe_id,
            step,
        }
    }

    /// Key of the record holding the end time (unix milliseconds)
    pub fn marker_key(&self) -> String {
        format!("{MARKER_PREFIX}{}:{}:{}", self.chat_id, self.recipe_id, self.step)
    }

    /// Key of the record holding the full `TimerEntry`
    pub fn state_key(&self) -> String {
        format!("{STATE_PREFIX}{}:{}:{}", self.chat_id, self.recipe_id, self.step)
    }
}

/// Stored timer state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEntry {
    pub started_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub end_time: DateTime<Utc>,
    pub is_running: bool,
    pub recipe_id: i64,
    pub step: u32,
}

/// A timer entry together with its remaining time at query time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerStatus {
    pub entry: TimerEntry,
    pub remaining_secs: u64,
}

impl TimerStatus {
    pub fn is_elapsed(&self) -> bool {
        self.remaining_secs == 0
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.entry.duration_secs.saturating_sub(self.remaining_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    #[error("Timer store error: {0}")]
    Store(String),
    #[error("Corrupt timer record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

pub type TimerResult<T> = Result<T, TimerError>;

/// Registry of step timers
#[derive(Clone)]
pub struct TimerRegistry {
    store: Arc<dyn TtlStore>,
    clock: Arc<dyn Clock>,
    grace: Duration,
}

impl TimerRegistry {
    pub fn new(store: Arc<dyn TtlStore>, clock: Arc<dyn Clock>, grace: Duration) -> Self {
        Self {
            store,
            clock,
            grace,
        }
    }

    /// Start (or restart) a timer. A running timer under the same key is
    /// overwritten.
    pub async fn start(&self, key: TimerKey, duration_secs: u64) -> TimerResult<TimerEntry> {
        let now = self.clock.now();
        let end_time = now + secs(duration_secs);
        let expires_at = end_time + secs(self.grace.as_secs());

        let entry = TimerEntry {
            started_at: now,
            duration_secs,
            end_time,
            is_running: true,
            recipe_id: key.recipe_id,
            step: key.step,
        };
        let state = serde_json::to_string(&entry).map_err(|e| TimerError::Corrupt {
            key: key.state_key(),
            reason: e.to_string(),
        })?;

        let marker = end_time.timestamp_millis().to_string();
        self.store
            .set(&key.marker_key(), &marker, expires_at, now)
            .await
            .map_err(TimerError::Store)?;
        self.store
            .set(&key.state_key(), &state, expires_at, now)
            .await
            .map_err(TimerError::Store)?;

        tracing::info!(
            chat_id = key.chat_id,
            recipe_id = key.recipe_id,
            step = key.step,
            duration_secs,
            "Timer started"
        );
        Ok(entry)
    }

    /// Remove a timer. Stopping an unknown timer is not an error.
    pub async fn stop(&self, key: TimerKey) -> TimerResult<()> {
        self.store
            .delete(&key.marker_key())
            .await
            .map_err(TimerError::Store)?;
        self.store
            .delete(&key.state_key())
            .await
            .map_err(TimerError::Store)?;

        tracing::info!(
            chat_id = key.chat_id,
            recipe_id = key.recipe_id,
            step = key.step,
            "Timer stopped"
        );
        Ok(())
    }

    /// Seconds left on a timer. `None` means no timer exists for the key;
    /// `Some(0)` means it has run out.
    pub async fn remaining_seconds(&self, key: TimerKey) -> TimerResult<Option<u64>> {
        let now = self.clock.now();
        let Some(raw) = self
            .store
            .get(&key.marker_key(), now)
            .await
            .map_err(TimerError::Store)?
        else {
            return Ok(None);
        };

        let end_millis: i64 = raw.trim().parse().map_err(|_| TimerError::Corrupt {
            key: key.marker_key(),
            reason: format!("end time {raw:?} is not an integer"),
        })?;
        Ok(Some(remaining_until(end_millis, now)))
    }

    #[allow(dead_code)] // Used in tests
    pub async fn is_expired(&self, key: TimerKey) -> TimerResult<bool> {
        Ok(self.remaining_seconds(key).await?.unwrap_or(0) == 0)
    }

    /// Stored entry for a timer, if any
    pub async fn state(&self, key: TimerKey) -> TimerResult<Option<TimerEntry>> {
        let now = self.clock.now();
        let raw = self
            .store
            .get(&key.state_key(), now)
            .await
            .map_err(TimerError::Store)?;

        raw.map(|raw| {
            serde_json::from_str(&raw).map_err(|e| TimerError::Corrupt {
                key: key.state_key(),
                reason: e.to_string(),
            })
        })
        .transpose()
    }

    /// Entry and remaining time together, for rendering a step screen
    pub async fn status(&self, key: TimerKey) -> TimerResult<Option<TimerStatus>> {
        let Some(entry) = self.state(key).await? else {
            return Ok(None);
        };
        let remaining_secs = match self.remaining_seconds(key).await? {
            Some(remaining) => remaining,
            None => remaining_until(entry.end_time.timestamp_millis(), self.clock.now()),
        };
        Ok(Some(TimerStatus {
            entry,
            remaining_secs,
        }))
    }
}

fn secs(value: u64) -> ChronoDuration {
    ChronoDuration::seconds(i64::try_from(value).unwrap_or(i64::MAX / 1000))
}

/// Whole seconds until `end_millis`, rounded up; zero once passed
fn remaining_until(end_millis: i64, now: DateTime<Utc>) -> u64 {
    let millis = end_millis.saturating_sub(now.timestamp_millis());
    u64::try_from(millis).unwrap_or(0).div_ceil(1000)
}

/// Human-readable duration: `M:SS` from one minute up, `Ns` below
pub fn format_duration(seconds: u64) -> String {
    if seconds >= 60 {
        format!("{}:{:02}", seconds / 60, seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

/// Ten-cell progress bar. A non-positive total renders as complete.
pub fn progress_bar(elapsed: i64, total: i64) -> String {
    let filled = if total <= 0 {
        BAR_CELLS
    } else {
        #[allow(clippy::cast_precision_loss)]
        let ratio = (elapsed as f64 / total as f64).clamp(0.0, 1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cells = (ratio * BAR_CELLS as f64).floor() as usize;
        cells.min(BAR_CELLS)
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_CELLS - filled))
}
