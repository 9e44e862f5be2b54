//! Hook 输入 - Claude Code 通过 stdin 传入的事件

pub mod event;

pub use event::{HookEvent, HookEventKind, HookNotification};
