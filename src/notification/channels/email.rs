//! 邮件渠道（SMTP STARTTLS）
//!
//! 配置不完整时在构造阶段禁用；只投递 priority 为 high 的模板。

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{setting, EnvLookup};
use crate::notification::channel::{NotificationChannel, NotificationContext, SendResult};
use crate::notification::mapping::EventMapping;
use crate::notification::priority::{gate_skip_reason, passes_high_gate, Priority};

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const SENDER_NAME: &str = "Claude Code";

/// 邮件渠道配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub from: Option<String>,
    /// 多个收件人用逗号分隔
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default)]
    pub smtp_port: Option<u16>,
    #[serde(default)]
    pub smtp_user: Option<String>,
    #[serde(default)]
    pub smtp_pass: Option<String>,
    #[serde(default)]
    pub email_mapping: EventMapping<EmailTemplate>,
}

/// 邮件模板
#[derive(Debug, Clone, Deserialize)]
pub struct EmailTemplate {
    #[serde(default)]
    pub subject: String,
    #[serde(default, alias = "bodyHtml")]
    pub template: String,
    #[serde(default)]
    pub priority: Option<Priority>,
}

/// SMTP 连接参数
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub to: String,
}

impl SmtpSettings {
    /// 配置优先，其次 EMAIL_* 环境变量；缺少 from/to/user/pass 时返回 None
    pub fn resolve(config: &EmailConfig, env: EnvLookup<'_>) -> Option<Self> {
        let from = setting(config.from.as_deref(), "EMAIL_FROM", env)?;
        let to = setting(config.to.as_deref(), "EMAIL_TO", env)?;
        let user = setting(config.smtp_user.as_deref(), "EMAIL_SMTP_USER", env).unwrap_or_else(|| from.clone());
        let pass = setting(config.smtp_pass.as_deref(), "EMAIL_SMTP_PASS", env)?;
        let host = setting(config.smtp_host.as_deref(), "EMAIL_SMTP_HOST", env)
            .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string());
        let port = config
            .smtp_port
            .or_else(|| env("EMAIL_SMTP_PORT").and_then(|p| p.trim().parse().ok()))
            .unwrap_or(DEFAULT_SMTP_PORT);

        Some(Self {
            host,
            port,
            user,
            pass,
            from,
            to,
        })
    }
}

/// 待发送的邮件
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// 邮件发送接口
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

/// 基于 lettre 的 SMTP 发送
pub struct SmtpMailTransport {
    settings: SmtpSettings,
}

impl SmtpMailTransport {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message> {
        let from: Address = self
            .settings
            .from
            .parse()
            .with_context(|| format!("Invalid from address: {}", self.settings.from))?;

        let mut builder = Message::builder()
            .from(Mailbox::new(Some(SENDER_NAME.to_string()), from))
            .subject(email.subject.clone());
        for recipient in self.settings.to.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            let mailbox: Mailbox = recipient
                .parse()
                .with_context(|| format!("Invalid recipient: {}", recipient))?;
            builder = builder.to(mailbox);
        }

        builder
            .multipart(MultiPart::alternative_plain_html(email.text.clone(), email.html.clone()))
            .context("Failed to build email")
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let message = self.build_message(email)?;
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.host)
            .with_context(|| format!("Failed to connect to {}", self.settings.host))?
            .port(self.settings.port)
            .credentials(Credentials::new(self.settings.user.clone(), self.settings.pass.clone()))
            .build();

        mailer.send(message).await.context("SMTP send failed")?;
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// 渲染主题、HTML 正文和纯文本正文
pub fn render_email(template: &EmailTemplate, ctx: &NotificationContext) -> OutgoingEmail {
    let project = ctx.event.project_name();
    let timestamp = &ctx.timestamp;
    let subject = ctx.render(&template.subject);
    let content = ctx.render(&template.template);

    let paragraphs: String = content
        .lines()
        .map(|line| format!("<p>{}</p>", escape_html(line)))
        .collect();
    let html = format!(
        r#"<html>
  <head>
    <style>
      body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
      .header {{ background: #f4f4f4; padding: 20px; border-radius: 5px; margin-bottom: 20px; }}
      .content {{ padding: 20px; }}
      .footer {{ font-size: 12px; color: #666; margin-top: 20px; padding-top: 20px; border-top: 1px solid #eee; }}
      .project {{ font-weight: bold; color: #2c3e50; }}
      .timestamp {{ color: #7f8c8d; }}
    </style>
  </head>
  <body>
    <div class="header">
      <h2>🤖 Claude Code Notification</h2>
      <p class="timestamp">{timestamp}</p>
    </div>
    <div class="content">{paragraphs}</div>
    <div class="footer">
      <p>Sent from <span class="project">{project}</span></p>
      <p>Claude Code Notification System</p>
    </div>
  </body>
</html>"#
    );

    let text = format!(
        "Claude Code Notification\n\n{content}\n\n---\nSent from {project}\n{timestamp}\nClaude Code Notification System"
    );

    OutgoingEmail { subject, html, text }
}

/// 邮件渠道
pub struct EmailChannel {
    enabled: bool,
    mapping: EventMapping<EmailTemplate>,
    transport: Option<Arc<dyn MailTransport>>,
}

impl EmailChannel {
    pub fn new(config: &EmailConfig, env: EnvLookup<'_>) -> Self {
        match SmtpSettings::resolve(config, env) {
            Some(settings) => Self::with_transport(config, Arc::new(SmtpMailTransport::new(settings))),
            None => {
                if config.enabled {
                    info!("Email settings incomplete (from/to/smtpPass), channel disabled");
                }
                Self {
                    enabled: false,
                    mapping: config.email_mapping.clone(),
                    transport: None,
                }
            }
        }
    }

    /// 使用指定的发送实现
    pub fn with_transport(config: &EmailConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            enabled: config.enabled,
            mapping: config.email_mapping.clone(),
            transport: Some(transport),
        }
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    fn is_enabled(&self) -> bool {
        self.enabled && self.transport.is_some()
    }

    async fn notify(&self, ctx: &NotificationContext) -> Result<SendResult> {
        let Some(transport) = &self.transport else {
            return Ok(SendResult::Skipped("email not configured".to_string()));
        };
        let Some(template) = self.mapping.resolve(&ctx.event) else {
            return Ok(SendResult::no_match(&ctx.event));
        };
        if !passes_high_gate(template.priority) {
            return Ok(SendResult::Skipped(gate_skip_reason(template.priority)));
        }

        let email = render_email(template, ctx);
        match transport.send(&email).await {
            Ok(()) => {
                info!(subject = %email.subject, "Email sent");
                Ok(SendResult::Sent)
            }
            Err(e) => {
                warn!(error = %e, "Email delivery failed");
                Ok(SendResult::Failed(format!("{:#}", e)))
            }
        }
    }
}
