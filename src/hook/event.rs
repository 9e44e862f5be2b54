//! Hook 事件定义
//!
//! Claude Code 每次触发 hook 时通过 stdin 传入一个 JSON 文档，
//! 这里只关心 Stop / Notification / PreToolUse 三类事件。

use serde::{Deserialize, Serialize};
use std::path::Path;

/// 没有 cwd 时使用的项目名
pub const DEFAULT_PROJECT_NAME: &str = "Claude Code";

/// Notification 子类型：需要用户授权
pub const PERMISSION_REQUIRED: &str = "permission_required";

/// Hook 事件（每次调用构造一次，之后只读）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookEvent {
    /// 事件名称（Stop / Notification / PreToolUse）
    pub hook_event_name: String,
    /// 会话 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,
    /// 工作目录，用于推导项目名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// 工具名称（仅 PreToolUse）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// 工具参数（仅 PreToolUse，常见字段 file_path / command）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<serde_json::Value>,
    /// 通知内容（仅 Notification）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<HookNotification>,
}

/// Notification 事件携带的内容
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookNotification {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

/// 归一化后的事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEventKind {
    Stop,
    Notification,
    PreToolUse,
}

impl HookEventKind {
    /// 大小写不敏感、忽略下划线地解析事件名，未知事件返回 None
    ///
    /// `Stop` / `stop`、`PreToolUse` / `pre_tool_use` 都能识别。
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('_', "").as_str() {
            "stop" => Some(Self::Stop),
            "notification" => Some(Self::Notification),
            "pretooluse" => Some(Self::PreToolUse),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Notification => "notification",
            Self::PreToolUse => "pretooluse",
        }
    }
}

impl HookEvent {
    /// 从 stdin 内容解析事件
    pub fn from_json(input: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(input.trim())?)
    }

    pub fn kind(&self) -> Option<HookEventKind> {
        HookEventKind::parse(&self.hook_event_name)
    }

    /// 项目名（cwd 的 basename）
    pub fn project_name(&self) -> String {
        self.cwd
            .as_deref()
            .and_then(base_name)
            .unwrap_or(DEFAULT_PROJECT_NAME)
            .to_string()
    }

    /// 工具参数中的文件路径（file_path 优先，其次 path）
    pub fn file_path(&self) -> Option<&str> {
        let input = self.tool_input.as_ref()?;
        input
            .get("file_path")
            .and_then(|v| v.as_str())
            .or_else(|| input.get("path").and_then(|v| v.as_str()))
            .filter(|p| !p.is_empty())
    }

    /// 文件名（不含目录）
    pub fn file_name(&self) -> Option<&str> {
        self.file_path().and_then(base_name)
    }

    pub fn is_permission_request(&self) -> bool {
        self.notification
            .as_ref()
            .is_some_and(|n| n.kind == PERMISSION_REQUIRED)
    }

    pub fn notification_message(&self) -> Option<&str> {
        self.notification
            .as_ref()
            .map(|n| n.message.as_str())
            .filter(|m| !m.is_empty())
    }
}

/// 取路径最后一段，同时兼容 `/` 和 `\` 分隔符
pub fn base_name(path: &str) -> Option<&str> {
    path.rsplit(['/', '\\']).find(|s| !s.is_empty())
}

/// 小写扩展名（带点，例如 `.py`），没有扩展名返回 None
pub fn extension_of(path: &str) -> Option<String> {
    let name = base_name(path)?;
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}
