pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use teloxide::types::{ParseMode, Recipient};

/// An update delivered to the webhook. Only the fields the bot reads are
/// modelled; everything else in the payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: Option<i64>,
    pub message: Option<IncomingMessage>,
    pub channel_post: Option<IncomingMessage>,
}

impl Update {
    /// The message to answer: a direct message, or else a channel post.
    pub fn into_message(self) -> Option<IncomingMessage> {
        self.message.or(self.channel_post)
    }
}

/// A message received from the platform
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    /// Absent for media and service messages
    pub text: Option<String>,
    /// Forum topic the message was posted in
    pub message_thread_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Numeric chat id or `@channelusername`
    pub id: Recipient,
}

/// Extra `sendMessage` fields on top of `chat_id`, `text` and `parse_mode`.
///
/// `parse_mode` here replaces the HTML default; every other set field is
/// added to the payload as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SendOptions {
    #[serde(skip)]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protect_content: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<serde_json::Value>,
}

/// Sends a single formatted message to a chat.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Returns the platform's JSON response, uninterpreted.
    async fn send_message(
        &self,
        chat_id: &Recipient,
        text: &str,
        options: &SendOptions,
    ) -> Result<serde_json::Value>;
}
