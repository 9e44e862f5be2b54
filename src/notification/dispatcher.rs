//! 通知分发器 - 管理多个渠道并路由事件
//!
//! 每个渠道在独立的 tokio 任务中执行，单个渠道的错误或 panic
//! 只会变成该渠道的 `Failed` 结果。

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::channel::{NotificationChannel, NotificationContext, SendResult};
use crate::activity::ActivityTracker;
use crate::hook::HookEvent;

/// 单个渠道的分发结果
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    pub channel: String,
    pub result: SendResult,
}

/// 通知分发器
pub struct NotificationDispatcher {
    /// 所有注册的渠道
    channels: Vec<Arc<dyn NotificationChannel>>,
    /// 是否为 dry-run 模式
    dry_run: bool,
    /// 用于生成活动摘要
    tracker: Option<ActivityTracker>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
            dry_run: false,
            tracker: None,
        }
    }

    /// 设置 dry-run 模式
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// 设置活动记录器
    pub fn with_tracker(mut self, tracker: ActivityTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// 注册渠道
    pub fn register_channel(&mut self, channel: Arc<dyn NotificationChannel>) {
        info!(channel = channel.name(), "Registering notification channel");
        self.channels.push(channel);
    }

    /// 构造本次分发的共享上下文
    pub fn context_for(&self, event: &HookEvent) -> NotificationContext {
        let ctx = NotificationContext::new(event.clone());
        match &self.tracker {
            Some(tracker) => ctx.with_activity(tracker),
            None => ctx,
        }
    }

    /// 并发分发到所有渠道，等待全部完成
    pub async fn dispatch(&self, event: &HookEvent) -> Vec<DispatchResult> {
        self.dispatch_context(self.context_for(event)).await
    }

    pub async fn dispatch_context(&self, ctx: NotificationContext) -> Vec<DispatchResult> {
        let names: Vec<String> = self.channels.iter().map(|c| c.name().to_string()).collect();

        if self.dry_run {
            return names
                .into_iter()
                .map(|channel| {
                    eprintln!("[DRY-RUN] Would send {} to channel: {}", ctx.event.hook_event_name, channel);
                    DispatchResult {
                        channel,
                        result: SendResult::Skipped("dry-run".to_string()),
                    }
                })
                .collect();
        }

        let ctx = Arc::new(ctx);
        let handles = self.channels.iter().map(|channel| {
            let channel = Arc::clone(channel);
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move { channel.notify(&ctx).await })
        });
        let outcomes = join_all(handles).await;

        names
            .into_iter()
            .zip(outcomes)
            .map(|(channel, outcome)| {
                let result = match outcome {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => SendResult::Failed(format!("{:#}", e)),
                    Err(join_error) => SendResult::Failed(format!("channel task aborted: {}", join_error)),
                };
                log_result(&channel, &result);
                DispatchResult { channel, result }
            })
            .collect()
    }

    /// 获取已注册的渠道数量
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// 获取已注册的渠道名称
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }
}

fn log_result(channel: &str, result: &SendResult) {
    match result {
        SendResult::Sent => info!(channel = %channel, "Notification delivered"),
        SendResult::Skipped(reason) => debug!(channel = %channel, reason = %reason, "Notification skipped"),
        SendResult::Failed(error) => warn!(channel = %channel, error = %error, "Notification failed"),
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
