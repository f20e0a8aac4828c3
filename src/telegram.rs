//! Telegram Bot API transport
//!
//! Inbound updates are normalized into `InboundEvent`s; outbound
//! notifications go through a queue drained by a background task.

mod client;
mod types;

pub use client::{spawn_delivery, DeliveryQueue, TelegramClient, TelegramError};
pub use types::*;
