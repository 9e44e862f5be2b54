//! Agent Notify CLI
//!
//! 作为 Claude Code Hook 运行：从 stdin 读取事件 JSON，分发到已启用的通知渠道。

use std::io::Read;
use std::path::PathBuf;

use agent_notify::cli::{
    format_results, handle_channel, handle_dispatch, handle_summary, handle_test, handle_track, ChannelArgs,
    GlobalOpts, SummaryArgs, TestArgs,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "agent-notify")]
#[command(about = "Agent Notify - Claude Code Hook 多渠道通知")]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 ~/.config/agent-notify/config.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// 只打印不发送
    #[arg(long, global = true)]
    dry_run: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 从 stdin 读取 Hook 事件并分发到所有启用的渠道
    Dispatch,
    /// 从 stdin 读取 Hook 事件，只发送到指定渠道
    Channel(ChannelArgs),
    /// 记录 PreToolUse 活动（PreToolUse Hook 使用）
    Track,
    /// 打印会话活动摘要
    Summary(SummaryArgs),
    /// 用样例事件测试通知配置
    Test(TestArgs),
}

fn read_stdin() -> String {
    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        debug!(error = %e, "Failed to read stdin");
    }
    input
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug agent-notify dispatch
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agent_notify=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let opts = GlobalOpts {
        config: cli.config,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Dispatch => {
            let input = read_stdin();
            let results = handle_dispatch(&opts, &input).await?;
            debug!(results = ?results, "Dispatch finished");
        }
        Commands::Channel(args) => {
            let input = read_stdin();
            match handle_channel(&opts, &args, &input).await {
                Ok(results) => debug!(results = ?results, "Channel dispatch finished"),
                Err(e) => {
                    error!(channel = %args.name, error = %format!("{:#}", e), "Channel invocation failed");
                    std::process::exit(1);
                }
            }
        }
        Commands::Track => {
            let input = read_stdin();
            let tracker = opts.activity_tracker();
            println!("{}", handle_track(&tracker, &input));
        }
        Commands::Summary(args) => {
            let tracker = opts.activity_tracker();
            println!("{}", handle_summary(&tracker, &args));
        }
        Commands::Test(args) => {
            for (label, results) in handle_test(&opts, &args).await? {
                println!("{}", label);
                println!("{}", format_results(&results));
            }
        }
    }

    Ok(())
}
