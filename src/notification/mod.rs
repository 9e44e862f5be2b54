//! 通知抽象层 - 统一管理所有通知渠道
//!
//! # 设计目标
//! 1. 统一接口：所有渠道实现 `NotificationChannel` trait
//! 2. 渠道解耦：每个渠道独立解析自己的映射，互不影响
//! 3. 并发分发：`NotificationDispatcher` 为每个渠道启动独立任务
//!
//! # 使用示例
//! ```ignore
//! use agent_notify::config::NotifyConfig;
//! use agent_notify::notification::NotificationBuilder;
//!
//! let config = NotifyConfig::load(&path)?;
//! let dispatcher = NotificationBuilder::from_config(&config).build()?;
//! let results = dispatcher.dispatch(&event).await;
//! ```

pub mod builder;
pub mod channel;
pub mod channels;
pub mod dispatcher;
pub mod mapping;
pub mod priority;
pub mod runner;
pub mod template;

pub use builder::{NotificationBuilder, CHANNEL_NAMES};
pub use channel::{NotificationChannel, NotificationContext, SendResult};
pub use dispatcher::{DispatchResult, NotificationDispatcher};
pub use mapping::{resolve, EventMapping, NotificationMapping, ToolMapping, ToolOverride};
pub use priority::Priority;
pub use runner::{CommandRunner, CommandSpec, Platform, SystemRunner};
pub use template::TemplateContext;
