//! CLI command handling

pub mod dispatch;
pub mod output;
pub mod sample;
pub mod summary;
pub mod track;

pub use dispatch::*;
pub use output::*;
pub use sample::*;
pub use summary::*;
pub use track::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::activity::{ActivityStore, ActivityTracker};
use crate::config::{load_dotenv, process_env, resolve_config_path, NotifyConfig};

/// 所有子命令共享的选项
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub config: Option<PathBuf>,
    pub dry_run: bool,
}

impl GlobalOpts {
    pub fn config_path(&self) -> PathBuf {
        resolve_config_path(self.config.clone(), &process_env)
    }

    /// 加载 `.env` 和配置文件
    pub fn load_config(&self) -> Result<NotifyConfig> {
        let path = self.config_path();
        load_dotenv(&path);
        NotifyConfig::load(&path)
    }

    /// 活动记录器；配置不可用时使用默认日志路径
    pub fn activity_tracker(&self) -> ActivityTracker {
        let path = match self.load_config() {
            Ok(config) => config.activity_log_path(),
            Err(e) => {
                debug!(error = %e, "Config unavailable, using default activity log");
                ActivityStore::default_path()
            }
        };
        ActivityTracker::new(ActivityStore::new(path))
    }
}
