//! Notification service
//!
//! Delivers formatted messages to the single configured chat. Send failures
//! are logged and handed back as a value; they never abort a poll cycle.

use async_trait::async_trait;
use homework_client::{ClientError, MessageSender};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// A message could not be delivered
#[derive(Debug, Error)]
#[error("failed to deliver message to chat {chat_id}: {source}")]
pub struct DeliveryError {
    pub chat_id: String,
    #[source]
    pub source: ClientError,
}

/// Service trait for delivering notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `message` to the configured recipient
    ///
    /// Implementations log failures themselves; callers only count them.
    async fn notify(&self, message: &str) -> Result<(), DeliveryError>;
}

/// Notifier that sends every message to one fixed chat
pub struct ChatNotifier {
    sender: Arc<dyn MessageSender>,
    chat_id: String,
}

impl ChatNotifier {
    /// Creates a new notifier
    ///
    /// # Arguments
    /// * `sender` - Messaging capability (the Telegram client in production)
    /// * `chat_id` - Recipient of every notification
    pub fn new(sender: Arc<dyn MessageSender>, chat_id: impl Into<String>) -> Self {
        Self {
            sender,
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl Notifier for ChatNotifier {
    async fn notify(&self, message: &str) -> Result<(), DeliveryError> {
        match self.sender.send_message(&self.chat_id, message).await {
            Ok(()) => {
                info!("Sent message: {}", message);
                Ok(())
            }
            Err(e) => {
                let err = DeliveryError {
                    chat_id: self.chat_id.clone(),
                    source: e,
                };
                error!("Message not sent: {}", err);
                Err(err)
            }
        }
    }
}
