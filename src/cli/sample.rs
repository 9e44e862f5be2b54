//! `agent-notify test` 命令 - 用内置样例事件检查各渠道配置

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::GlobalOpts;
use crate::hook::HookEvent;
use crate::notification::{DispatchResult, NotificationBuilder, CHANNEL_NAMES};

const SAMPLE_SESSION: &str = "agent-notify-test";

#[derive(Args, Debug)]
pub struct TestArgs {
    /// 只测试一个渠道
    #[arg(long, value_parser = clap::builder::PossibleValuesParser::new(CHANNEL_NAMES))]
    pub only: Option<String>,
}

/// 样例事件：(说明, 事件)
pub fn sample_events(cwd: &str) -> Vec<(&'static str, HookEvent)> {
    let samples = [
        (
            "Task completion",
            json!({"hook_event_name": "Stop", "session_id": SAMPLE_SESSION, "cwd": cwd}),
        ),
        (
            "Permission request",
            json!({
                "hook_event_name": "Notification",
                "session_id": SAMPLE_SESSION,
                "cwd": cwd,
                "notification": {"type": "permission_required", "message": "Run npm install"}
            }),
        ),
        (
            "Tool use (Read)",
            json!({
                "hook_event_name": "PreToolUse",
                "session_id": SAMPLE_SESSION,
                "cwd": cwd,
                "tool_name": "Read",
                "tool_input": {"file_path": "src/app.ts"}
            }),
        ),
        (
            "Tool use (Edit)",
            json!({
                "hook_event_name": "PreToolUse",
                "session_id": SAMPLE_SESSION,
                "cwd": cwd,
                "tool_name": "Edit",
                "tool_input": {"file_path": "main.py"}
            }),
        ),
        (
            "Tool use (Bash)",
            json!({
                "hook_event_name": "PreToolUse",
                "session_id": SAMPLE_SESSION,
                "cwd": cwd,
                "tool_name": "Bash",
                "tool_input": {"command": "npm install", "description": "Install dependencies"}
            }),
        ),
    ];

    samples
        .into_iter()
        .filter_map(|(label, value)| serde_json::from_value(value).ok().map(|event| (label, event)))
        .collect()
}

/// 依次分发样例事件
pub async fn handle_test(opts: &GlobalOpts, args: &TestArgs) -> Result<Vec<(&'static str, Vec<DispatchResult>)>> {
    let config = opts.load_config()?;
    let dispatcher = NotificationBuilder::from_config(&config)
        .dry_run(opts.dry_run)
        .only(args.only.clone())
        .build()?;

    let cwd = std::env::current_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut report = Vec::new();
    for (label, event) in sample_events(&cwd) {
        report.push((label, dispatcher.dispatch(&event).await));
    }
    Ok(report)
}
