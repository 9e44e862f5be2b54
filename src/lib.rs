//! Agent Notify - 把 Claude Code Hook 事件路由到音频、桌面、Discord、邮件和 Telegram 通知

pub mod activity;
pub mod cli;
pub mod config;
pub mod hook;
pub mod notification;

pub use activity::{ActivityStore, ActivityTracker};
pub use config::NotifyConfig;
pub use hook::{HookEvent, HookEventKind};
pub use notification::{
    DispatchResult, NotificationBuilder, NotificationChannel, NotificationContext, NotificationDispatcher,
    SendResult,
};
