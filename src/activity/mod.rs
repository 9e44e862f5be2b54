//! 活动记录 - 每个会话最近的工具调用

pub mod store;
pub mod tracker;

pub use store::{Activity, ActivityLog, ActivityStore, SessionLog};
pub use tracker::{describe_activity, ActivityTracker, MAX_ACTIVITIES, SESSION_TTL_MINUTES};
