//! 通知系统构建器 - 根据配置注册渠道

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::info;

use super::channel::NotificationChannel;
use super::channels::{AudioChannel, DesktopChannel, DiscordChannel, EmailChannel, TelegramChannel};
use super::dispatcher::NotificationDispatcher;
use super::runner::{CommandRunner, Platform, SystemRunner};
use crate::activity::{ActivityStore, ActivityTracker};
use crate::config::{process_env, NotifyConfig};

/// 支持的渠道名称
pub const CHANNEL_NAMES: [&str; 5] = ["audio", "desktop", "discord", "email", "telegram"];

type EnvFn = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// 通知系统构建器
pub struct NotificationBuilder {
    config: NotifyConfig,
    dry_run: bool,
    only: Option<String>,
    runner: Arc<dyn CommandRunner>,
    platform: Platform,
    env: EnvFn,
}

impl NotificationBuilder {
    pub fn from_config(config: &NotifyConfig) -> Self {
        Self {
            config: config.clone(),
            dry_run: false,
            only: None,
            runner: Arc::new(SystemRunner),
            platform: Platform::current(),
            env: Box::new(process_env),
        }
    }

    /// 设置 dry-run 模式
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// 只注册指定渠道
    pub fn only(mut self, channel: Option<String>) -> Self {
        self.only = channel;
        self
    }

    /// 替换外部命令执行器
    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// 替换环境变量来源
    pub fn env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(env);
        self
    }

    fn wants(&self, name: &str) -> bool {
        self.only.as_deref().map_or(true, |only| only == name)
    }

    /// 构建 NotificationDispatcher
    pub fn build(self) -> Result<NotificationDispatcher> {
        if let Some(only) = &self.only {
            if !CHANNEL_NAMES.iter().any(|name| *name == only.as_str()) {
                bail!("Unknown channel '{}', expected one of: {}", only, CHANNEL_NAMES.join(", "));
            }
        }

        let tracker = ActivityTracker::new(ActivityStore::new(self.config.activity_log_path()));
        let mut dispatcher = NotificationDispatcher::new()
            .with_dry_run(self.dry_run)
            .with_tracker(tracker);

        for channel in self.channels() {
            if channel.is_enabled() {
                dispatcher.register_channel(channel);
            } else {
                info!(channel = channel.name(), "Channel disabled, not registered");
            }
        }

        info!(channels = ?dispatcher.channel_names(), "Notification dispatcher ready");
        Ok(dispatcher)
    }

    /// 配置中存在的渠道（启用与否由渠道自己判断）
    fn channels(&self) -> Vec<Arc<dyn NotificationChannel>> {
        let assets = self.config.assets_dir();
        let env = self.env.as_ref();
        let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();

        if let Some(cfg) = self.config.audio.as_ref().filter(|_| self.wants("audio")) {
            channels.push(Arc::new(AudioChannel::new(cfg, &assets, self.runner.clone(), self.platform, env)));
        }
        if let Some(cfg) = self.config.desktop.as_ref().filter(|_| self.wants("desktop")) {
            channels.push(Arc::new(DesktopChannel::new(cfg, &assets, self.runner.clone(), self.platform)));
        }
        if let Some(cfg) = self.config.discord.as_ref().filter(|_| self.wants("discord")) {
            channels.push(Arc::new(DiscordChannel::new(cfg, env)));
        }
        if let Some(cfg) = self.config.email.as_ref().filter(|_| self.wants("email")) {
            channels.push(Arc::new(EmailChannel::new(cfg, env)));
        }
        if let Some(cfg) = self.config.telegram.as_ref().filter(|_| self.wants("telegram")) {
            channels.push(Arc::new(TelegramChannel::new(cfg, env)));
        }

        channels
    }
}
