// ABOUTME: Configuration parsing from TOML file with environment variable overrides
// ABOUTME: Validates required fields and provides sensible defaults for optional ones

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    /// Externally visible base URL of this gateway (e.g. "https://bot.example.com")
    #[serde(default)]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    /// Path to a file holding the token; used when bot_token is not set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token_file: Option<String>,
}

// Custom Debug impl to redact the token
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[REDACTED]"))
            .field("bot_token_file", &self.bot_token_file)
            .finish()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from a TOML file with environment variable overrides
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse {}", path))?
        } else {
            Config::default()
        };

        // Override with environment variables if present
        if let Ok(val) = std::env::var("GATEWAY_BASE_URL") {
            config.gateway.base_url = val;
        }
        if let Ok(val) = std::env::var("SERVER_HOST") {
            config.server.host = val;
        }
        if let Ok(val) = std::env::var("SERVER_PORT") {
            config.server.port = val
                .parse()
                .with_context(|| format!("SERVER_PORT must be a valid port number, got: {}", val))?;
        }
        if let Ok(val) = std::env::var("TELEGRAM_BOT_TOKEN") {
            config.telegram.bot_token = Some(val);
        }
        if let Ok(val) = std::env::var("TELEGRAM_BOT_TOKEN_FILE") {
            config.telegram.bot_token_file = Some(val);
        }

        // Validate required fields
        config.gateway.base_url = config.gateway.base_url.trim().to_string();
        if config.gateway.base_url.is_empty() {
            anyhow::bail!(
                "gateway.base_url is required (set in config.toml or GATEWAY_BASE_URL env var)"
            );
        }
        if !config.gateway.base_url.starts_with("http") {
            anyhow::bail!(
                "gateway.base_url must be an http(s) URL, got: {}",
                config.gateway.base_url
            );
        }
        while config.gateway.base_url.ends_with('/') {
            config.gateway.base_url.pop();
        }
        if config.telegram.bot_token.is_none() && config.telegram.bot_token_file.is_none() {
            anyhow::bail!("Either telegram.bot_token or telegram.bot_token_file is required");
        }

        Ok(config)
    }

    /// Resolve the bot token, reading the token file if no inline token is set
    pub fn bot_token(&self) -> Result<String> {
        if let Some(token) = &self.telegram.bot_token {
            return Ok(token.trim().to_string());
        }
        let path = self
            .telegram
            .bot_token_file
            .as_ref()
            .context("No bot token configured")?;
        let token = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read token file {}", path))?;
        Ok(token.trim().to_string())
    }

    /// Socket address the ingress listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Webhook target URL registered with the platform at startup
    pub fn platform_webhook_url(&self) -> String {
        format!("{}/platform", self.gateway.base_url)
    }
}

// =============================================================================
// Tests
// =============================================================================
