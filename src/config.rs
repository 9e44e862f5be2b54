//! 配置加载
//!
//! 配置文件是一个 JSON 文档，每个渠道一节：
//!
//! ```json
//! {
//!   "audio":    { "enabled": true, "voicePack": "alfred", "soundMapping": { ... } },
//!   "desktop":  { "enabled": true, "notificationMapping": { ... } },
//!   "discord":  { "enabled": true, "webhookUrl": "...", "discordMapping": { ... } },
//!   "email":    { "enabled": false, "from": "...", "to": "...", "emailMapping": { ... } },
//!   "telegram": { "enabled": false, "telegramMapping": { ... } }
//! }
//! ```
//!
//! 凭据优先取配置文件中的非空值，其次取环境变量（可由 `.env` 提供）。

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::notification::channels::{AudioConfig, DesktopConfig, DiscordConfig, EmailConfig, TelegramConfig};

/// 配置文件路径的环境变量
pub const CONFIG_ENV: &str = "AGENT_NOTIFY_CONFIG";
const CONFIG_FILENAME: &str = "config.json";

/// 环境变量查询函数（测试时可替换）
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// 从进程环境读取
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// 配置值优先，其次环境变量；空白字符串视为未设置
pub fn setting(value: Option<&str>, env_key: &str, env: EnvLookup<'_>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| env(env_key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
}

/// 默认配置目录 ~/.config/agent-notify
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("agent-notify")
}

/// 确定配置文件路径：命令行参数 > 环境变量 > 默认路径
pub fn resolve_config_path(explicit: Option<PathBuf>, env: EnvLookup<'_>) -> PathBuf {
    explicit
        .or_else(|| env(CONFIG_ENV).filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| default_config_dir().join(CONFIG_FILENAME))
}

/// 通知配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyConfig {
    #[serde(default)]
    pub audio: Option<AudioConfig>,
    #[serde(default)]
    pub desktop: Option<DesktopConfig>,
    #[serde(default)]
    pub discord: Option<DiscordConfig>,
    #[serde(default)]
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    /// 资源目录（sounds/、icons/），相对路径以配置文件所在目录为基准
    #[serde(default)]
    pub assets_dir: Option<PathBuf>,
    /// 活动日志路径
    #[serde(default)]
    pub activity_log: Option<PathBuf>,
    /// 配置文件所在目录
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl NotifyConfig {
    /// 读取并解析配置文件，文件不存在或格式错误都返回错误
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: NotifyConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        info!(path = %path.display(), channels = ?config.enabled_sections(), "Loaded notification config");
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 资源目录，默认 `<配置目录>/assets`
    pub fn assets_dir(&self) -> PathBuf {
        match &self.assets_dir {
            Some(dir) => self.resolve_relative(dir),
            None => self.base_dir.join("assets"),
        }
    }

    /// 活动日志路径，默认 `<配置目录>/activity-log.json`
    pub fn activity_log_path(&self) -> PathBuf {
        match &self.activity_log {
            Some(path) => self.resolve_relative(path),
            None => self.base_dir.join("activity-log.json"),
        }
    }

    /// 配置中 enabled 为 true 的渠道
    pub fn enabled_sections(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.audio.as_ref().is_some_and(|c| c.enabled) {
            names.push("audio");
        }
        if self.desktop.as_ref().is_some_and(|c| c.enabled) {
            names.push("desktop");
        }
        if self.discord.as_ref().is_some_and(|c| c.enabled) {
            names.push("discord");
        }
        if self.email.as_ref().is_some_and(|c| c.enabled) {
            names.push("email");
        }
        if self.telegram.as_ref().is_some_and(|c| c.enabled) {
            names.push("telegram");
        }
        names
    }

    fn resolve_relative(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// 加载 `.env`：配置目录下的优先，其次当前目录；已存在的变量会被覆盖
pub fn load_dotenv(config_path: &Path) {
    let candidates = [
        config_path.parent().map(|dir| dir.join(".env")),
        Some(PathBuf::from(".env")),
    ];

    for path in candidates.into_iter().flatten() {
        if !path.exists() {
            continue;
        }
        match dotenvy::from_path_override(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Loaded .env");
                return;
            }
            Err(e) => debug!(path = %path.display(), error = %e, "Failed to load .env"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_setting_prefers_config_value() {
        let env = env_of(&[("TOKEN", "from-env")]);
        assert_eq!(setting(Some("from-config"), "TOKEN", &env), Some("from-config".to_string()));
        assert_eq!(setting(Some("   "), "TOKEN", &env), Some("from-env".to_string()));
        assert_eq!(setting(None, "TOKEN", &env), Some("from-env".to_string()));
        assert_eq!(setting(None, "MISSING", &env), None);

        let empty_env = env_of(&[("TOKEN", "  ")]);
        assert_eq!(setting(None, "TOKEN", &empty_env), None);
    }

    #[test]
    fn test_resolve_config_path() {
        let env = env_of(&[(CONFIG_ENV, "/etc/agent-notify.json")]);
        assert_eq!(
            resolve_config_path(Some(PathBuf::from("/tmp/c.json")), &env),
            PathBuf::from("/tmp/c.json")
        );
        assert_eq!(resolve_config_path(None, &env), PathBuf::from("/etc/agent-notify.json"));

        let no_env = env_of(&[]);
        assert!(resolve_config_path(None, &no_env).ends_with("agent-notify/config.json"));
    }

    #[test]
    fn test_load_missing_config_is_error() {
        let temp = TempDir::new().unwrap();
        let err = NotifyConfig::load(&temp.path().join("config.json")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_invalid_config_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{ invalid").unwrap();
        assert!(NotifyConfig::load(&path).is_err());
    }

    #[test]
    fn test_load_config_sections_and_paths() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "audio": { "enabled": true, "voicePack": "jarvis", "soundMapping": { "stop": ["done.wav"] } },
                "desktop": { "enabled": false },
                "discord": { "enabled": true, "webhookUrl": "https://discord.test/hook" },
                "activityLog": "state/activity.json"
            }"#,
        )
        .unwrap();

        let config = NotifyConfig::load(&path).unwrap();
        assert_eq!(config.enabled_sections(), vec!["audio", "discord"]);
        assert_eq!(config.assets_dir(), temp.path().join("assets"));
        assert_eq!(config.activity_log_path(), temp.path().join("state/activity.json"));
        assert_eq!(config.audio.unwrap().voice_pack.as_deref(), Some("jarvis"));
    }

    #[test]
    fn test_empty_config_has_no_channels() {
        let config = NotifyConfig::from_json("{}").unwrap();
        assert!(config.enabled_sections().is_empty());
    }
}
