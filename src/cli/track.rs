//! `agent-notify track` 命令 - PreToolUse Hook 的活动记录器
//!
//! 无论记录是否成功都输出 approve，不能阻塞工具调用。

use serde_json::Value;
use tracing::{debug, warn};

use crate::activity::ActivityTracker;
use crate::hook::{HookEvent, HookEventKind};

/// Hook 决策输出
pub const APPROVE_DECISION: &str = r#"{"decision":"approve"}"#;

/// 记录一次工具调用，返回要打印到 stdout 的决策
pub fn handle_track(tracker: &ActivityTracker, input: &str) -> &'static str {
    match HookEvent::from_json(input) {
        Ok(event) => record_event(tracker, &event),
        Err(e) => debug!(error = %e, "Tracker received unparseable input"),
    }
    APPROVE_DECISION
}

fn record_event(tracker: &ActivityTracker, event: &HookEvent) {
    if event.kind() != Some(HookEventKind::PreToolUse) {
        return;
    }
    let (Some(session_id), Some(tool)) = (event.session_id.as_deref(), event.tool_name.as_deref()) else {
        debug!("PreToolUse without session or tool, not recorded");
        return;
    };

    let params = event.tool_input.clone().unwrap_or(Value::Null);
    if let Err(e) = tracker.record(session_id, tool, &params) {
        warn!(error = %e, session_id = %session_id, "Failed to record activity");
    }
}
