//! 通知渠道 trait 定义

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;

use super::template::TemplateContext;
use crate::activity::ActivityTracker;
use crate::hook::event::HookEvent;

/// 活动摘要使用的条数
pub const SUMMARY_ACTIVITY_COUNT: usize = 3;

/// 一次分发中所有渠道共享的上下文
#[derive(Debug, Clone)]
pub struct NotificationContext {
    /// 原始事件
    pub event: HookEvent,
    /// 最近几条活动，用 " → " 连接
    pub activity_summary: String,
    /// 最近一条活动描述（桌面通知 Stop 标题）
    pub last_activity: String,
    /// 本地时间，用于 `[timestamp]`
    pub timestamp: String,
}

impl NotificationContext {
    /// 不读取活动日志，直接构造
    pub fn new(event: HookEvent) -> Self {
        Self {
            event,
            activity_summary: "Task completed".to_string(),
            last_activity: "Task Complete".to_string(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// 从活动日志补充会话摘要
    pub fn with_activity(mut self, tracker: &ActivityTracker) -> Self {
        if let Some(session_id) = self.event.session_id.as_deref() {
            self.activity_summary = tracker.recent_summary(session_id, SUMMARY_ACTIVITY_COUNT);
            self.last_activity = tracker.latest_description(session_id);
        }
        self
    }

    pub fn with_summaries(
        mut self,
        activity_summary: impl Into<String>,
        last_activity: impl Into<String>,
    ) -> Self {
        self.activity_summary = activity_summary.into();
        self.last_activity = last_activity.into();
        self
    }

    /// 模板变量
    pub fn template(&self) -> TemplateContext {
        TemplateContext::from_event(&self.event, &self.activity_summary, &self.timestamp)
    }

    /// 渲染模板
    pub fn render(&self, template: &str) -> String {
        self.template().render(template)
    }
}

/// 发送结果
#[derive(Debug, Clone, PartialEq)]
pub enum SendResult {
    /// 发送成功
    Sent,
    /// 跳过（没有匹配的配置、优先级不够、dry-run）
    Skipped(String),
    /// 发送失败
    Failed(String),
}

impl SendResult {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendResult::Sent)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SendResult::Failed(_))
    }

    /// 没有匹配到 payload
    pub fn no_match(event: &HookEvent) -> Self {
        SendResult::Skipped(format!("no mapping for {}", event.hook_event_name))
    }
}

/// 通知渠道 trait
///
/// `notify` 内部的错误应转成 `SendResult::Failed` 或直接返回 `Err`，
/// 分发器负责把 `Err` 记录为失败，不会影响其他渠道。
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// 渠道名称（用于日志和配置）
    fn name(&self) -> &str;

    /// 构造时根据配置 / 凭据确定，之后不再变化
    fn is_enabled(&self) -> bool;

    /// 解析配置并投递
    async fn notify(&self, ctx: &NotificationContext) -> Result<SendResult>;
}
