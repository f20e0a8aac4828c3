//! Bot API client and the delivery queue in front of it

use super::types::{AnswerCallbackQueryRequest, ApiResponse, SendMessageRequest};
use crate::runtime::Notifier;
use crate::state_machine::Notification;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Bot API rejected {method} ({status}): {description}")]
    Api {
        method: &'static str,
        status: u16,
        description: String,
    },
}

/// Minimal Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self, TelegramError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{token}", api_url.trim_end_matches('/')),
        })
    }

    pub async fn send_message(&self, notification: &Notification) -> Result<(), TelegramError> {
        self.call("sendMessage", &SendMessageRequest::from(notification))
            .await
    }

    pub async fn answer_callback(&self, callback_id: &str) -> Result<(), TelegramError> {
        self.call(
            "answerCallbackQuery",
            &AnswerCallbackQueryRequest {
                callback_query_id: callback_id.to_string(),
            },
        )
        .await
    }

    async fn call<T: Serialize + Sync>(
        &self,
        method: &'static str,
        body: &T,
    ) -> Result<(), TelegramError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let parsed: Option<ApiResponse> = serde_json::from_str(&text).ok();

        match parsed {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            other => Err(TelegramError::Api {
                method,
                status: status.as_u16(),
                description: other.and_then(|r| r.description).unwrap_or(text),
            }),
        }
    }
}

// ============================================================================
// Delivery Queue
// ============================================================================

#[derive(Debug)]
enum Outbound {
    Message(Notification),
    Ack(String),
}

/// `Notifier` that hands messages to a background delivery task
#[derive(Clone)]
pub struct DeliveryQueue {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl DeliveryQueue {
    fn push(&self, item: Outbound) -> Result<(), String> {
        self.tx
            .send(item)
            .map_err(|_| "delivery queue closed".to_string())
    }
}

#[async_trait]
impl Notifier for DeliveryQueue {
    async fn notify(&self, notification: Notification) -> Result<(), String> {
        self.push(Outbound::Message(notification))
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), String> {
        self.push(Outbound::Ack(callback_id.to_string()))
    }
}

/// Start the delivery task. Without a client, messages are logged and
/// dropped. The task ends once every queue handle is gone.
pub fn spawn_delivery(client: Option<TelegramClient>) -> (DeliveryQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            deliver(client.as_ref(), item).await;
        }
        tracing::debug!("Delivery queue drained");
    });

    (DeliveryQueue { tx }, handle)
}

async fn deliver(client: Option<&TelegramClient>, item: Outbound) {
    let Some(client) = client else {
        match item {
            Outbound::Message(n) => {
                tracing::info!(chat_id = n.chat_id, text = %n.text, "No bot token, dropping message");
            }
            Outbound::Ack(id) => tracing::debug!(callback_id = %id, "No bot token, dropping ack"),
        }
        return;
    };

    match item {
        Outbound::Message(notification) => {
            if let Err(e) = client.send_message(&notification).await {
                tracing::error!(chat_id = notification.chat_id, error = %e, "Failed to deliver message");
            }
        }
        Outbound::Ack(callback_id) => {
            if let Err(e) = client.answer_callback(&callback_id).await {
                tracing::warn!(callback_id = %callback_id, error = %e, "Failed to answer callback");
            }
        }
    }
}
