//! `agent-notify summary` 命令 - 输出会话最近活动的摘要

use clap::Args;

use crate::activity::ActivityTracker;

/// 默认摘要窗口
pub const DEFAULT_SUMMARY_WINDOW: usize = 5;

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// 会话 ID
    #[arg(long)]
    pub session: String,
    /// 参与摘要的活动条数（3-5）
    #[arg(long, default_value_t = DEFAULT_SUMMARY_WINDOW)]
    pub window: usize,
}

pub fn handle_summary(tracker: &ActivityTracker, args: &SummaryArgs) -> String {
    tracker.summarize(&args.session, args.window)
}
