//! 模板占位符替换
//!
//! 所有渠道共用一组封闭的占位符：
//!
//! | 占位符 | 来源 |
//! |---|---|
//! | `[project-name]` | cwd 的 basename |
//! | `[activity-summary]` | 最近活动摘要 |
//! | `[requested-action]` | Notification 的 message |
//! | `[timestamp]` | 本地时间 |
//! | `{tool_name}` / `{file_name}` / `{message}` / `{session_id}` | 事件字段 |
//!
//! 没有取值的占位符保持原样。

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::hook::event::HookEvent;

const DEFAULT_REQUESTED_ACTION: &str = "perform action";

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE.get_or_init(|| {
        Regex::new(
            r"\[(project-name|activity-summary|requested-action|timestamp)\]|\{(tool_name|file_name|message|session_id)\}",
        )
        .expect("placeholder regex is valid")
    })
}

/// 模板变量
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    pub project_name: String,
    pub activity_summary: Option<String>,
    pub requested_action: Option<String>,
    pub timestamp: Option<String>,
    pub tool_name: Option<String>,
    pub file_name: Option<String>,
    pub message: Option<String>,
    pub session_id: Option<String>,
}

impl TemplateContext {
    /// 从事件构造；activity_summary 仅在有 session_id 时使用
    pub fn from_event(event: &HookEvent, activity_summary: &str, timestamp: &str) -> Self {
        let message = event.notification_message().map(str::to_string);
        let requested_action = if event.is_permission_request() {
            Some(message.clone().unwrap_or_else(|| DEFAULT_REQUESTED_ACTION.to_string()))
        } else {
            message.clone()
        };

        Self {
            project_name: event.project_name(),
            activity_summary: Some(if event.session_id.is_some() {
                activity_summary.to_string()
            } else {
                String::new()
            }),
            requested_action,
            timestamp: Some(timestamp.to_string()),
            tool_name: event.tool_name.clone(),
            file_name: event.file_name().map(str::to_string),
            message,
            session_id: event.session_id.clone(),
        }
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        let value = match key {
            "project-name" => return Some(self.project_name.as_str()),
            "activity-summary" => &self.activity_summary,
            "requested-action" => &self.requested_action,
            "timestamp" => &self.timestamp,
            "tool_name" => &self.tool_name,
            "file_name" => &self.file_name,
            "message" => &self.message,
            "session_id" => &self.session_id,
            _ => return None,
        };
        value.as_deref()
    }

    /// 单次扫描替换所有占位符，替换结果不会被再次展开
    pub fn render(&self, template: &str) -> String {
        placeholder_re()
            .replace_all(template, |caps: &Captures| {
                let key = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                match self.lookup(key) {
                    Some(value) => value.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}
