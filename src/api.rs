//! HTTP ingress for the bot

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::EventDispatcher;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<dyn EventDispatcher>,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` value, if any
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(dispatcher: Arc<dyn EventDispatcher>, webhook_secret: Option<String>) -> Self {
        Self {
            dispatcher,
            webhook_secret,
        }
    }
}
