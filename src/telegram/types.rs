//! Bot API wire types

use crate::runtime::{EventKind, InboundEvent};
use crate::state_machine::{Keyboard, Notification};
use serde::{Deserialize, Serialize};

/// Incoming update, reduced to the fields the bot reads
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<TgUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: TgUser,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

impl Update {
    /// Normalize into a transport-neutral event. Updates that are neither a
    /// text message nor a button press yield `None`.
    pub fn into_inbound(self) -> Option<InboundEvent> {
        let update_id = self.update_id;

        if let Some(query) = self.callback_query {
            // Old inline messages may be gone; fall back to the presser's chat
            let chat_id = query
                .message
                .as_ref()
                .map_or(query.from.id, |m| m.chat.id);
            return Some(InboundEvent {
                update_id,
                chat_id,
                display_name: query.from.first_name,
                username: query.from.username,
                kind: EventKind::Button,
                payload: query.data.unwrap_or_default(),
                callback_id: Some(query.id),
            });
        }

        let message = self.message?;
        let text = message.text?;
        let (display_name, username) = message
            .from
            .map(|u| (u.first_name, u.username))
            .unwrap_or_default();
        Some(InboundEvent {
            update_id,
            chat_id: message.chat.id,
            display_name,
            username,
            kind: EventKind::Text,
            payload: text,
            callback_id: None,
        })
    }
}

// ============================================================================
// Outbound
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl From<&Keyboard> for InlineKeyboardMarkup {
    fn from(keyboard: &Keyboard) -> Self {
        let inline_keyboard = keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| InlineKeyboardButton {
                        text: b.label.clone(),
                        callback_data: b.action_token.clone(),
                    })
                    .collect()
            })
            .collect();
        Self { inline_keyboard }
    }
}

/// `sendMessage` request body
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl From<&Notification> for SendMessageRequest {
    fn from(notification: &Notification) -> Self {
        Self {
            chat_id: notification.chat_id,
            text: notification.text.clone(),
            reply_markup: notification.keyboard.as_ref().map(InlineKeyboardMarkup::from),
        }
    }
}

/// `answerCallbackQuery` request body
#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackQueryRequest {
    pub callback_query_id: String,
}

/// Envelope of every Bot API response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
}
