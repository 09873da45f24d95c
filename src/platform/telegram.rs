use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, ParseMode, Recipient};
use tracing::{debug, info, warn};

use crate::config::{TelegramConfig, WebhookConfig};
use crate::platform::{Responder, SendOptions};

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a Recipient,
    text: &'a str,
    parse_mode: ParseMode,
    #[serde(flatten)]
    options: &'a SendOptions,
}

/// Bot API client that sends replies with `sendMessage`.
pub struct TelegramResponder {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl TelegramResponder {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }
}

#[async_trait]
impl Responder for TelegramResponder {
    async fn send_message(
        &self,
        chat_id: &Recipient,
        text: &str,
        options: &SendOptions,
    ) -> Result<Value> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: options.parse_mode.unwrap_or(ParseMode::Html),
            options,
        };

        debug!("Sending message to chat {:?} ({} chars)", chat_id, text.len());

        // reqwest errors embed the request URL, which carries the token.
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await
            .map_err(|e| e.without_url())
            .context("Failed to send request to Telegram")?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Failed to read Telegram response ({})", status))?;

        // Proxies in front of the API may answer with HTML error pages.
        let body: Value = match serde_json::from_str(&raw) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                anyhow::bail!("Telegram API error ({}): non-JSON response", status)
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to parse Telegram response ({})", status))
            }
        };

        if !status.is_success() || body.get("ok") == Some(&Value::Bool(false)) {
            let description = body
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            anyhow::bail!("Telegram API error ({}): {}", status, description);
        }

        Ok(body)
    }
}

/// Commands shown in the client's command menu.
pub fn menu_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start the bot"),
        BotCommand::new("help", "Show available commands"),
        BotCommand::new("set_caption", "Set the caption template"),
    ]
}

/// Point Telegram at our webhook and publish the command menu.
///
/// Failures are logged, not returned: the server still serves requests when
/// the Bot API is unreachable at boot.
pub async fn register(telegram: &TelegramConfig, webhook: &WebhookConfig) {
    if let Err(e) = try_register(telegram, webhook).await {
        let message = redact(&format!("{:#}", e), &telegram.bot_token);
        warn!("Webhook registration failed: {}", message);
    }
}

async fn try_register(telegram: &TelegramConfig, webhook: &WebhookConfig) -> Result<()> {
    let api_url = reqwest::Url::parse(&telegram.api_url)
        .with_context(|| format!("Invalid api_url: {}", telegram.api_url))?;
    let public_url = reqwest::Url::parse(&webhook.public_url)
        .with_context(|| format!("Invalid webhook public_url: {}", webhook.public_url))?;

    let bot = Bot::new(&telegram.bot_token).set_api_url(api_url);

    bot.set_webhook(public_url.clone())
        .await
        .context("setWebhook failed")?;
    info!("Webhook registered at {}", public_url);

    if webhook.register_commands {
        bot.set_my_commands(menu_commands())
            .await
            .context("setMyCommands failed")?;
        info!("Command menu published");
    }

    Ok(())
}

fn redact(text: &str, token: &str) -> String {
    if token.is_empty() {
        return text.to_string();
    }
    text.replace(token, "<redacted>")
}
