use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

// Routes the server always mounts besides the webhook.
const RESERVED_PATHS: &[&str] = &["/health", "/api/health"];

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

#[derive(Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// The token must never reach the logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl TelegramConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            webhook_path: default_webhook_path(),
        }
    }
}

/// Optional startup registration with the Bot API.
#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    /// Public HTTPS URL Telegram should deliver updates to.
    pub public_url: String,
    #[serde(default = "default_register_commands")]
    pub register_commands: bool,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

fn default_register_commands() -> bool {
    true
}

impl Config {
    /// Load configuration from `path` (optional) and apply environment
    /// overrides (`BOT_TOKEN`, `PORT`).
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML configuration")
    }

    /// Apply deployment-environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("BOT_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.telegram.bot_token = token.trim().to_string();
        }

        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
            let mut addr = self.listen_addr()?;
            addr.set_port(port);
            self.server.listen_address = addr.to_string();
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            anyhow::bail!("Bot token is not configured (set BOT_TOKEN or [telegram] bot_token)");
        }
        if !self.server.webhook_path.starts_with('/') {
            anyhow::bail!(
                "webhook_path must start with '/': {}",
                self.server.webhook_path
            );
        }
        if RESERVED_PATHS.contains(&self.server.webhook_path.as_str()) {
            anyhow::bail!(
                "webhook_path collides with a built-in route: {}",
                self.server.webhook_path
            );
        }
        if self.server.webhook_path.contains(['{', '}', '*']) {
            anyhow::bail!(
                "webhook_path must be a literal path without captures: {}",
                self.server.webhook_path
            );
        }
        if self.telegram.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }
        self.listen_addr()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen_address
            .parse()
            .with_context(|| format!("Invalid listen_address: {}", self.server.listen_address))
    }
}
