//! 外部命令执行（音频播放、系统通知）
//!
//! 每次调用都有显式超时；超时后子进程被 kill，返回错误。
//! detached 模式只负责启动进程，不等待结束。

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// 外部命令默认超时
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// 运行平台
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            _ => Platform::Linux,
        }
    }
}

/// 一次外部命令调用
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    /// 只启动不等待
    pub detached: bool,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
            detached: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// 用于日志
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 外部命令执行器
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// 程序是否存在于 PATH（或为绝对路径且存在）
    fn is_available(&self, program: &str) -> bool;

    /// 执行命令，非零退出码或超时视为失败
    async fn run(&self, spec: &CommandSpec) -> Result<()>;
}

/// 基于 tokio::process 的执行器
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    async fn run(&self, spec: &CommandSpec) -> Result<()> {
        debug!(command = %spec.display(), detached = spec.detached, "Running external command");

        let mut command = Command::new(&spec.program);
        command.args(&spec.args).stdin(Stdio::null());

        if spec.detached {
            command.stdout(Stdio::null()).stderr(Stdio::null());
            command
                .spawn()
                .with_context(|| format!("Failed to spawn {}", spec.program))?;
            return Ok(());
        }

        command
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let child = command
            .spawn()
            .with_context(|| format!("Failed to spawn {}", spec.program))?;

        let output = tokio::time::timeout(spec.timeout, child.wait_with_output())
            .await
            .map_err(|_| anyhow!("{} timed out after {:?}", spec.program, spec.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} exited with {}: {}", spec.program, output.status, stderr.trim());
        }
        Ok(())
    }
}

/// 依次尝试候选命令，第一个成功即返回
///
/// 不存在的程序直接跳过；全部失败时返回最后一个错误。
pub async fn run_first_available(runner: &dyn CommandRunner, candidates: &[CommandSpec]) -> Result<String> {
    let mut last_error = None;

    for spec in candidates {
        if !runner.is_available(&spec.program) {
            debug!(program = %spec.program, "Command not available, trying next");
            continue;
        }
        match runner.run(spec).await {
            Ok(()) => return Ok(spec.program.clone()),
            Err(e) => {
                debug!(program = %spec.program, error = %e, "Command failed, trying next");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow!("no usable command found")))
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingRunner;
    use super::*;

    #[test]
    fn test_command_spec_display() {
        let spec = CommandSpec::new("notify-send", ["Title", "Body"]);
        assert_eq!(spec.display(), "notify-send Title Body");
        assert_eq!(spec.timeout, DEFAULT_COMMAND_TIMEOUT);
        assert!(!spec.detached);
        assert!(spec.detached().detached);
    }

    #[tokio::test]
    async fn test_run_first_available_skips_missing_and_failing() {
        let runner = RecordingRunner::new().with_missing("paplay").with_failing("aplay");
        let candidates = vec![
            CommandSpec::new("paplay", ["a.wav"]),
            CommandSpec::new("aplay", ["a.wav"]),
            CommandSpec::new("ffplay", ["a.wav"]),
        ];

        let used = run_first_available(&runner, &candidates).await.unwrap();
        assert_eq!(used, "ffplay");
        let programs: Vec<String> = runner.calls().into_iter().map(|c| c.program).collect();
        assert_eq!(programs, vec!["aplay", "ffplay"]);
    }

    #[tokio::test]
    async fn test_run_first_available_all_fail() {
        let runner = RecordingRunner::new().with_failing("a").with_missing("b");
        let candidates = vec![CommandSpec::new("a", Vec::<String>::new()), CommandSpec::new("b", Vec::<String>::new())];
        let err = run_first_available(&runner, &candidates).await.unwrap_err();
        assert!(err.to_string().contains("a failed"));

        let runner = RecordingRunner::new().with_missing("x");
        let err = run_first_available(&runner, &[CommandSpec::new("x", Vec::<String>::new())])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no usable command"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_reports_exit_status() {
        let runner = SystemRunner;
        assert!(runner.run(&CommandSpec::new("true", Vec::<String>::new())).await.is_ok());
        assert!(runner.run(&CommandSpec::new("false", Vec::<String>::new())).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_times_out() {
        let runner = SystemRunner;
        let spec = CommandSpec::new("sleep", ["5"]).with_timeout(Duration::from_millis(100));
        let err = runner.run(&spec).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
