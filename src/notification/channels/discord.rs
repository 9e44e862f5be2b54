//! Discord Webhook 渠道
//!
//! 只投递 priority 为 high 的 payload。

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{setting, EnvLookup};
use crate::hook::event::DEFAULT_PROJECT_NAME;
use crate::notification::channel::{NotificationChannel, NotificationContext, SendResult};
use crate::notification::mapping::EventMapping;
use crate::notification::priority::{gate_skip_reason, passes_high_gate, Priority};

const DEFAULT_USERNAME: &str = "Claude Code";

/// Discord 渠道配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub discord_mapping: EventMapping<DiscordEmbedConfig>,
}

/// 事件对应的 embed 模板
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordEmbedConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Serialize)]
struct WebhookBody {
    username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<String>,
    embeds: Vec<Embed>,
}

/// Discord embed
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub timestamp: String,
    pub footer: EmbedFooter,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Discord 渠道
pub struct DiscordChannel {
    enabled: bool,
    webhook_url: String,
    username: String,
    avatar_url: Option<String>,
    mapping: EventMapping<DiscordEmbedConfig>,
    client: Client,
}

impl DiscordChannel {
    /// Webhook URL 来自配置或 DISCORD_WEBHOOK_URL；都没有时渠道禁用
    pub fn new(config: &DiscordConfig, env: EnvLookup<'_>) -> Self {
        let webhook_url = setting(config.webhook_url.as_deref(), "DISCORD_WEBHOOK_URL", env);
        if config.enabled && webhook_url.is_none() {
            info!("Discord webhook URL not configured, channel disabled");
        }

        Self {
            enabled: config.enabled && webhook_url.is_some(),
            webhook_url: webhook_url.unwrap_or_default(),
            username: setting(config.username.as_deref(), "DISCORD_USERNAME", env)
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            avatar_url: setting(config.avatar_url.as_deref(), "DISCORD_AVATAR_URL", env),
            mapping: config.discord_mapping.clone(),
            client: super::http_client(),
        }
    }

    /// 渲染 embed
    pub fn build_embed(template: &DiscordEmbedConfig, ctx: &NotificationContext) -> Embed {
        let event = &ctx.event;
        let project = event.project_name();

        let mut fields = Vec::new();
        if let Some(tool) = &event.tool_name {
            fields.push(EmbedField {
                name: "Tool".to_string(),
                value: tool.clone(),
                inline: true,
            });
        }
        if let Some(file) = event.file_name() {
            fields.push(EmbedField {
                name: "File".to_string(),
                value: file.to_string(),
                inline: true,
            });
        }
        if let Some(message) = event.notification_message() {
            fields.push(EmbedField {
                name: "Message".to_string(),
                value: message.to_string(),
                inline: false,
            });
        }

        Embed {
            title: ctx.render(&template.title),
            description: ctx.render(&template.description),
            color: template.color,
            timestamp: Utc::now().to_rfc3339(),
            footer: EmbedFooter {
                text: format!("{} • {}", DEFAULT_PROJECT_NAME, project),
            },
            fields,
        }
    }
}

#[async_trait]
impl NotificationChannel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
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

        let body = WebhookBody {
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
            embeds: vec![Self::build_embed(template, ctx)],
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .context("Failed to send Discord webhook")?;

        let status = response.status();
        if status.is_success() {
            info!(status = %status, "Discord notification sent");
            return Ok(SendResult::Sent);
        }

        let text = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %text, "Discord webhook rejected");
        Ok(SendResult::Failed(format!("{} - {}", status.as_u16(), text)))
    }
}
