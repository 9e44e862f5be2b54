//! 具体渠道实现

pub mod audio;
pub mod desktop;
pub mod discord;
pub mod email;
pub mod telegram;

pub use audio::{AudioChannel, AudioConfig};
pub use desktop::{DesktopChannel, DesktopConfig, DesktopPayload};
pub use discord::{DiscordChannel, DiscordConfig, DiscordEmbedConfig};
pub use email::{EmailChannel, EmailConfig, EmailTemplate, MailTransport, OutgoingEmail, SmtpMailTransport};
pub use telegram::{TelegramChannel, TelegramConfig, TelegramMessage};

use reqwest::Client;
use std::time::Duration;

/// HTTP 渠道的请求超时
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// 构造带超时的 HTTP 客户端
pub(crate) fn http_client() -> Client {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_default()
}
