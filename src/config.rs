use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    #[serde(default = "default_payment_config")]
    pub payment: PaymentConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Payment provider credential; may stay empty until payments are set up.
    #[serde(default)]
    pub provider_token: String,
    /// Public URL Telegram should POST updates to. Empty skips setWebhook
    /// on startup.
    #[serde(default)]
    pub webhook_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    /// What the user is paying for; also the invoice title and the label of
    /// the menu button ("Pay <item>").
    #[serde(default = "default_item")]
    pub item: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Smallest amount (in whole currency units) accepted for an invoice.
    #[serde(default = "default_min_amount")]
    pub min_amount: u32,
    /// Opaque payload stamped on invoices and matched against payment
    /// confirmations and pre-checkout queries.
    #[serde(default = "default_payload")]
    pub payload: String,
    #[serde(default = "default_welcome")]
    pub welcome: String,
}

impl PaymentConfig {
    /// Label of the menu button that starts the payment flow.
    pub fn pay_button(&self) -> String {
        format!("Pay {}", self.item)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_item() -> String {
    "Dues".to_string()
}

fn default_currency() -> String {
    "ETB".to_string()
}

fn default_min_amount() -> u32 {
    56
}

fn default_payload() -> String {
    "dues-payment".to_string()
}

fn default_welcome() -> String {
    "Welcome! This bot collects dues payments.\n\n\
     Tap the Pay button and enter the amount you want to pay to receive an \
     invoice, or tap Help to see this message again."
        .to_string()
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

fn default_payment_config() -> PaymentConfig {
    PaymentConfig {
        item: default_item(),
        currency: default_currency(),
        min_amount: default_min_amount(),
        payload: default_payload(),
        welcome: default_welcome(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.apply_env_overrides();

        if config.telegram.bot_token.is_empty() {
            bail!(
                "No bot token configured: set telegram.bot_token in {} \
                 or the BOT_TOKEN environment variable",
                path.display()
            );
        }

        Ok(config)
    }

    /// Environment variables take precedence over the file.
    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            if !token.is_empty() {
                self.telegram.bot_token = token;
            }
        }
        if let Ok(token) = std::env::var("PROVIDER_TOKEN") {
            if !token.is_empty() {
                self.telegram.provider_token = token;
            }
        }
        if let Ok(url) = std::env::var("WEBHOOK_URL") {
            if !url.is_empty() {
                self.telegram.webhook_url = url;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring unparseable PORT value: {}", port),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_from_str(content: &str) -> Result<Config> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        Config::load(&path)
    }

    #[test]
    fn test_full_config_parses() {
        let config = load_from_str(
            r#"
            [telegram]
            bot_token = "123:abc"
            provider_token = "prov-xyz"
            webhook_url = "https://bot.example.com/telegram-webhook"

            [server]
            host = "0.0.0.0"
            port = 8080

            [payment]
            item = "Membership"
            currency = "USD"
            min_amount = 10
            payload = "membership-2026"
            welcome = "Hi there"
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.provider_token, "prov-xyz");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.payment.item, "Membership");
        assert_eq!(config.payment.currency, "USD");
        assert_eq!(config.payment.min_amount, 10);
        assert_eq!(config.payment.payload, "membership-2026");
        assert_eq!(config.payment.pay_button(), "Pay Membership");
    }

    #[test]
    fn test_defaults_for_missing_sections() {
        let config = load_from_str(
            r#"
            [telegram]
            bot_token = "123:abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.payment.item, "Dues");
        assert_eq!(config.payment.currency, "ETB");
        assert_eq!(config.payment.min_amount, 56);
        assert_eq!(config.payment.payload, "dues-payment");
        assert!(config.payment.welcome.contains("Help"));
        assert!(config.telegram.provider_token.is_empty());
        assert!(config.telegram.webhook_url.is_empty());
    }

    #[test]
    fn test_port_env_override() {
        std::env::set_var("PORT", "9100");
        let config = load_from_str(
            r#"
            [telegram]
            bot_token = "123:abc"

            [server]
            port = 8080
            "#,
        )
        .unwrap();
        std::env::remove_var("PORT");

        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_missing_bot_token_is_an_error() {
        // Only meaningful when BOT_TOKEN is not set in the test environment.
        if std::env::var("BOT_TOKEN").is_ok() {
            return;
        }
        let err = load_from_str("[telegram]\n").unwrap_err();
        assert!(err.to_string().contains("bot token"));
    }
}
