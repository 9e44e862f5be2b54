//! Telegram Bot 渠道

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{setting, EnvLookup};
use crate::notification::channel::{NotificationChannel, NotificationContext, SendResult};
use crate::notification::mapping::EventMapping;
use crate::notification::priority::{gate_skip_reason, passes_high_gate, Priority};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram 渠道配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub telegram_mapping: EventMapping<TelegramMessage>,
    /// Bot API 地址
    #[serde(default)]
    pub api_base_url: Option<String>,
}

/// 事件对应的消息模板
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramMessage {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default = "default_parse_mode", alias = "parse_mode")]
    pub parse_mode: String,
}

fn default_parse_mode() -> String {
    "Markdown".to_string()
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram 渠道
pub struct TelegramChannel {
    enabled: bool,
    bot_token: String,
    chat_id: String,
    api_base_url: String,
    mapping: EventMapping<TelegramMessage>,
    client: Client,
}

impl TelegramChannel {
    /// botToken / chatId 来自配置或 TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID
    pub fn new(config: &TelegramConfig, env: EnvLookup<'_>) -> Self {
        let bot_token = setting(config.bot_token.as_deref(), "TELEGRAM_BOT_TOKEN", env);
        let chat_id = setting(config.chat_id.as_deref(), "TELEGRAM_CHAT_ID", env);
        let configured = bot_token.is_some() && chat_id.is_some();
        if config.enabled && !configured {
            info!("Telegram bot token or chat id missing, channel disabled");
        }

        Self {
            enabled: config.enabled && configured,
            bot_token: bot_token.unwrap_or_default(),
            chat_id: chat_id.unwrap_or_default(),
            api_base_url: config
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            mapping: config.telegram_mapping.clone(),
            client: super::http_client(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base_url, self.bot_token)
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn notify(&self, ctx: &NotificationContext) -> Result<SendResult> {
        let Some(template) = self.mapping.resolve(&ctx.event) else {
            return Ok(SendResult::no_match(&ctx.event));
        };
        if !passes_high_gate(template.priority) {
            return Ok(SendResult::Skipped(gate_skip_reason(template.priority)));
        }

        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text: ctx.render(&template.message),
            parse_mode: &template.parse_mode,
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .context("Failed to call Telegram sendMessage")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            warn!(status = %status, body = %body, "Telegram API rejected message");
            return Ok(SendResult::Failed(format!("{} - {}", status.as_u16(), body)));
        }

        match serde_json::from_str::<SendMessageResponse>(&body) {
            Ok(parsed) if parsed.ok => {
                info!("Telegram message sent");
                Ok(SendResult::Sent)
            }
            Ok(parsed) => {
                let reason = parsed.description.unwrap_or_else(|| "ok=false".to_string());
                warn!(reason = %reason, "Telegram API returned error");
                Ok(SendResult::Failed(reason))
            }
            Err(e) => Ok(SendResult::Failed(format!("invalid Telegram response: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_from_env() {
        let config = TelegramConfig {
            enabled: true,
            ..Default::default()
        };
        let none = |_: &str| -> Option<String> { None };
        assert!(!TelegramChannel::new(&config, &none).is_enabled());

        let env = |key: &str| match key {
            "TELEGRAM_BOT_TOKEN" => Some("123:abc".to_string()),
            "TELEGRAM_CHAT_ID" => Some("42".to_string()),
            _ => None,
        };
        let channel = TelegramChannel::new(&config, &env);
        assert!(channel.is_enabled());
        assert_eq!(channel.endpoint(), "https://api.telegram.org/bot123:abc/sendMessage");
    }

    #[test]
    fn test_parse_mode_default_and_alias() {
        let m: TelegramMessage = serde_json::from_value(serde_json::json!({"message": "hi"})).unwrap();
        assert_eq!(m.parse_mode, "Markdown");
        let m: TelegramMessage =
            serde_json::from_value(serde_json::json!({"message": "hi", "parse_mode": "HTML"})).unwrap();
        assert_eq!(m.parse_mode, "HTML");
        let m: TelegramMessage =
            serde_json::from_value(serde_json::json!({"message": "hi", "parseMode": "HTML"})).unwrap();
        assert_eq!(m.parse_mode, "HTML");
    }
}
