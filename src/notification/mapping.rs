//! 事件到渠道配置的映射解析
//!
//! 每个渠道都有一份同构的映射：
//!
//! ```json
//! {
//!   "stop": <payload>,
//!   "notification": { "permission_required": <payload>, "default": <payload> },
//!   "pre_tool_use": {
//!     "Bash": <payload>,
//!     "Edit": { "files": {"cargo.toml": <payload>}, "extensions": {".py": <payload>}, "default": <payload> }
//!   }
//! }
//! ```
//!
//! 解析是纯函数，找不到时返回 None（该渠道对此事件保持静默），从不报错。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::hook::event::{base_name, extension_of, HookEvent, HookEventKind};

/// 单个渠道的事件映射
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct EventMapping<T> {
    #[serde(default)]
    pub stop: Option<T>,
    #[serde(default)]
    pub notification: Option<NotificationMapping<T>>,
    #[serde(default)]
    pub pre_tool_use: HashMap<String, ToolMapping<T>>,
}

impl<T> Default for EventMapping<T> {
    fn default() -> Self {
        Self {
            stop: None,
            notification: None,
            pre_tool_use: HashMap::new(),
        }
    }
}

/// Notification 子类型映射
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct NotificationMapping<T> {
    #[serde(default)]
    pub permission_required: Option<T>,
    #[serde(default)]
    pub default: Option<T>,
}

/// 单个工具的映射：直接给出 payload，或按文件名 / 扩展名细分
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolMapping<T> {
    Override(ToolOverride<T>),
    Flat(T),
}

/// 按文件细分的工具映射
///
/// 字段集合是封闭的，这样普通 payload 对象不会被误认为 override。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolOverride<T> {
    /// 文件名（小写）-> payload
    #[serde(default = "HashMap::new")]
    pub files: HashMap<String, T>,
    /// 扩展名（小写，带点）-> payload
    #[serde(default = "HashMap::new")]
    pub extensions: HashMap<String, T>,
    #[serde(default = "Option::default")]
    pub default: Option<T>,
}

impl<T> ToolOverride<T> {
    /// 文件名优先，其次扩展名，最后 default
    fn select(&self, file_path: Option<&str>) -> Option<&T> {
        if let Some(path) = file_path {
            if let Some(name) = base_name(path) {
                if let Some(payload) = self.files.get(&name.to_lowercase()) {
                    return Some(payload);
                }
            }
            if let Some(ext) = extension_of(path) {
                let bare = ext.trim_start_matches('.');
                if let Some(payload) = self.extensions.get(&ext).or_else(|| self.extensions.get(bare)) {
                    return Some(payload);
                }
            }
        }
        self.default.as_ref()
    }
}

impl<T> EventMapping<T> {
    /// 解析事件对应的 payload
    pub fn resolve(&self, event: &HookEvent) -> Option<&T> {
        resolve(event, self)
    }

    /// 查找工具映射：先精确匹配，再大小写不敏感匹配
    fn tool_entry(&self, tool_name: &str) -> Option<&ToolMapping<T>> {
        self.pre_tool_use.get(tool_name).or_else(|| {
            self.pre_tool_use
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(tool_name))
                .map(|(_, entry)| entry)
        })
    }
}

/// 按固定优先级解析：事件类型 → 子类型 → 工具 → 文件名 / 扩展名
pub fn resolve<'a, T>(event: &HookEvent, mapping: &'a EventMapping<T>) -> Option<&'a T> {
    match event.kind()? {
        HookEventKind::Stop => mapping.stop.as_ref(),
        HookEventKind::Notification => {
            let notification = mapping.notification.as_ref()?;
            if event.is_permission_request() {
                notification.permission_required.as_ref()
            } else {
                notification.default.as_ref()
            }
        }
        HookEventKind::PreToolUse => {
            let tool_name = event.tool_name.as_deref()?;
            match mapping.tool_entry(tool_name)? {
                ToolMapping::Flat(payload) => Some(payload),
                ToolMapping::Override(entry) => entry.select(event.file_path()),
            }
        }
    }
}
