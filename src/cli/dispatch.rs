//! `agent-notify dispatch` / `agent-notify channel` 命令 - 处理 Claude Code Hook 事件

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{info, warn};

use super::GlobalOpts;
use crate::hook::HookEvent;
use crate::notification::{DispatchResult, NotificationBuilder, CHANNEL_NAMES};

/// 单渠道命令参数
#[derive(Args, Debug)]
pub struct ChannelArgs {
    /// 渠道名称
    #[arg(value_parser = clap::builder::PossibleValuesParser::new(CHANNEL_NAMES))]
    pub name: String,
}

/// 解析 stdin 中的 Hook JSON
pub fn parse_hook_input(input: &str) -> Result<HookEvent> {
    if input.trim().is_empty() {
        bail!("No hook input on stdin");
    }
    HookEvent::from_json(input).context("Malformed hook input")
}

/// 分发到所有启用的渠道
///
/// 输入为空或格式错误时只记录警告，不算失败。
pub async fn handle_dispatch(opts: &GlobalOpts, input: &str) -> Result<Vec<DispatchResult>> {
    let event = match parse_hook_input(input) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Ignoring hook invocation");
            return Ok(Vec::new());
        }
    };

    let config = opts.load_config()?;
    let dispatcher = NotificationBuilder::from_config(&config)
        .dry_run(opts.dry_run)
        .build()?;

    info!(event = %event.hook_event_name, channels = dispatcher.channel_count(), "Dispatching hook event");
    Ok(dispatcher.dispatch(&event).await)
}

/// 只分发到指定渠道，输入无效时返回错误
pub async fn handle_channel(opts: &GlobalOpts, args: &ChannelArgs, input: &str) -> Result<Vec<DispatchResult>> {
    let event = parse_hook_input(input)?;

    let config = opts.load_config()?;
    let dispatcher = NotificationBuilder::from_config(&config)
        .dry_run(opts.dry_run)
        .only(Some(args.name.clone()))
        .build()?;

    if dispatcher.channel_count() == 0 {
        warn!(channel = %args.name, "Channel is not enabled in config");
    }
    Ok(dispatcher.dispatch(&event).await)
}
