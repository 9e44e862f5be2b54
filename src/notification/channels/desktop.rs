//! 桌面通知渠道
//!
//! 按平台依次尝试可用的通知后端，直到有一个成功：
//! - Linux: notify-send → zenity → kdialog
//! - macOS: terminal-notifier → osascript
//! - Windows: SnoreToast → PowerShell toast → msg

use anyhow::Result;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::hook::HookEventKind;
use crate::notification::channel::{NotificationChannel, NotificationContext, SendResult};
use crate::notification::mapping::EventMapping;
use crate::notification::runner::{run_first_available, CommandRunner, CommandSpec, Platform};

const DEFAULT_APP_NAME: &str = "Claude Hooks";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const SNORETOAST_PATH: &str = "C:\\Program Files\\SnoreToast\\SnoreToast.exe";

/// 桌面通知渠道配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesktopConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub notification_mapping: EventMapping<DesktopPayload>,
    /// 通知来源名称
    #[serde(default)]
    pub app_name: Option<String>,
    /// 图标路径，默认 `<assets>/icons/claude-icon.png`
    #[serde(default)]
    pub icon: Option<PathBuf>,
}

/// 单条桌面通知
#[derive(Debug, Clone, Deserialize)]
pub struct DesktopPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    /// 候选消息，随机选一条
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default = "default_sound")]
    pub sound: bool,
    /// 显示时长（秒）
    #[serde(default)]
    pub timeout: Option<u64>,
}

fn default_sound() -> bool {
    true
}

/// 渲染后的通知内容
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub sound: bool,
    pub timeout_secs: u64,
    pub icon: Option<PathBuf>,
    pub app_name: String,
}

/// 桌面通知渠道
pub struct DesktopChannel {
    enabled: bool,
    mapping: EventMapping<DesktopPayload>,
    app_name: String,
    icon: PathBuf,
    platform: Platform,
    runner: Arc<dyn CommandRunner>,
}

impl DesktopChannel {
    pub fn new(
        config: &DesktopConfig,
        assets_dir: &Path,
        runner: Arc<dyn CommandRunner>,
        platform: Platform,
    ) -> Self {
        let app_name = config
            .app_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());
        let icon = config
            .icon
            .clone()
            .unwrap_or_else(|| assets_dir.join("icons").join("claude-icon.png"));

        Self {
            enabled: config.enabled,
            mapping: config.notification_mapping.clone(),
            app_name,
            icon,
            platform,
            runner,
        }
    }

    /// 解析并渲染；没有匹配时返回 None
    pub fn build_toast(&self, ctx: &NotificationContext) -> Option<Toast> {
        let payload = self.mapping.resolve(&ctx.event)?;

        let raw_message = payload
            .messages
            .choose(&mut rand::thread_rng())
            .cloned()
            .or_else(|| payload.message.clone())
            .unwrap_or_default();

        let title = if ctx.event.kind() == Some(HookEventKind::Stop) {
            format!("{} ✅", ctx.last_activity)
        } else {
            let rendered = ctx.render(&payload.title);
            if rendered.trim().is_empty() {
                self.app_name.clone()
            } else {
                rendered
            }
        };

        Some(Toast {
            title,
            message: ctx.render(&raw_message),
            sound: payload.sound,
            timeout_secs: payload.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
            icon: self.icon.is_file().then(|| self.icon.clone()),
            app_name: self.app_name.clone(),
        })
    }
}

fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_powershell(text: &str) -> String {
    text.replace('\'', "''")
}

/// 各平台的通知命令，按优先级排列
pub fn backend_commands(platform: Platform, toast: &Toast) -> Vec<CommandSpec> {
    let icon = toast.icon.as_ref().map(|p| p.to_string_lossy().to_string());

    match platform {
        Platform::Linux => {
            let mut notify_send = vec![
                "-a".to_string(),
                toast.app_name.clone(),
                "-t".to_string(),
                toast.timeout_secs.saturating_mul(1000).to_string(),
            ];
            if let Some(icon) = &icon {
                notify_send.push("-i".to_string());
                notify_send.push(icon.clone());
            }
            notify_send.push(toast.title.clone());
            notify_send.push(toast.message.clone());

            vec![
                CommandSpec::new("notify-send", notify_send),
                CommandSpec::new(
                    "zenity",
                    [
                        "--notification".to_string(),
                        format!("--text={}\n{}", toast.title, toast.message),
                    ],
                ),
                CommandSpec::new(
                    "kdialog",
                    [
                        "--title".to_string(),
                        toast.title.clone(),
                        "--passivepopup".to_string(),
                        toast.message.clone(),
                        toast.timeout_secs.to_string(),
                    ],
                ),
            ]
        }
        Platform::MacOs => {
            let mut terminal_notifier = vec![
                "-title".to_string(),
                toast.title.clone(),
                "-message".to_string(),
                toast.message.clone(),
                "-group".to_string(),
                toast.app_name.clone(),
            ];
            if toast.sound {
                terminal_notifier.push("-sound".to_string());
                terminal_notifier.push("Glass".to_string());
            }
            if let Some(icon) = &icon {
                terminal_notifier.push("-appIcon".to_string());
                terminal_notifier.push(icon.clone());
            }

            let sound = if toast.sound { " sound name \"Glass\"" } else { "" };
            let script = format!(
                "display notification \"{}\" with title \"{}\"{}",
                escape_applescript(&toast.message),
                escape_applescript(&toast.title),
                sound
            );

            vec![
                CommandSpec::new("terminal-notifier", terminal_notifier),
                CommandSpec::new("osascript", ["-e".to_string(), script]),
            ]
        }
        Platform::Windows => {
            let mut snoretoast = vec![
                "-t".to_string(),
                toast.title.clone(),
                "-m".to_string(),
                toast.message.clone(),
                "-appID".to_string(),
                toast.app_name.clone(),
            ];
            if let Some(icon) = &icon {
                snoretoast.push("-p".to_string());
                snoretoast.push(icon.clone());
            }
            snoretoast.push(if toast.sound { "-s" } else { "-silent" }.to_string());

            let script = format!(
                "[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] | Out-Null; \
                 $xml = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02); \
                 $text = $xml.GetElementsByTagName('text'); \
                 $text.Item(0).AppendChild($xml.CreateTextNode('{}')) | Out-Null; \
                 $text.Item(1).AppendChild($xml.CreateTextNode('{}')) | Out-Null; \
                 $toast = [Windows.UI.Notifications.ToastNotification]::new($xml); \
                 [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier('{}').Show($toast)",
                escape_powershell(&toast.title),
                escape_powershell(&toast.message),
                escape_powershell(&toast.app_name)
            );

            let plain = format!("{}: {}", toast.title, toast.message).replace(['"', '\''], "");

            vec![
                CommandSpec::new(SNORETOAST_PATH, snoretoast),
                CommandSpec::new(
                    "powershell",
                    ["-NoProfile".to_string(), "-WindowStyle".to_string(), "Hidden".to_string(), "-Command".to_string(), script],
                ),
                CommandSpec::new("msg", ["*".to_string(), "/TIME:5".to_string(), plain]),
            ]
        }
    }
}

#[async_trait]
impl NotificationChannel for DesktopChannel {
    fn name(&self) -> &str {
        "desktop"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn notify(&self, ctx: &NotificationContext) -> Result<SendResult> {
        let Some(toast) = self.build_toast(ctx) else {
            return Ok(SendResult::no_match(&ctx.event));
        };

        let commands = backend_commands(self.platform, &toast);
        match run_first_available(self.runner.as_ref(), &commands).await {
            Ok(backend) => {
                info!(title = %toast.title, backend = %backend, "Desktop notification shown");
                Ok(SendResult::Sent)
            }
            Err(e) => {
                warn!(error = %e, "All desktop notification backends failed");
                Ok(SendResult::Failed(format!("all backends failed: {}", e)))
            }
        }
    }
}
