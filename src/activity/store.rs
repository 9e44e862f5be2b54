//! 活动日志存储 - 本地 JSON 文件读写
//!
//! 整个日志是一个 `session_id -> SessionLog` 的 JSON 对象，每次写入整体覆盖。
//! 写入通过旁路 `.lock` 文件加独占锁，再用临时文件 + rename 原子替换。

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// 单条活动记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub timestamp: DateTime<Utc>,
    /// 工具名称
    pub tool: String,
    /// 人类可读的描述，例如 "Edited main.py"
    pub description: String,
    /// 原始工具参数
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

/// 单个会话的活动
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(rename = "lastUpdate")]
    pub last_update: DateTime<Utc>,
}

/// 全部会话
pub type ActivityLog = HashMap<String, SessionLog>;

/// 活动日志存储
#[derive(Debug, Clone)]
pub struct ActivityStore {
    path: PathBuf,
}

impl ActivityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 默认存储路径
    pub fn default_path() -> PathBuf {
        crate::config::default_config_dir().join("activity-log.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取整个日志，文件不存在或损坏时返回空日志
    pub fn load(&self) -> ActivityLog {
        if !self.path.exists() {
            return ActivityLog::new();
        }

        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => ActivityLog::new(),
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Activity log is corrupt, starting fresh");
                ActivityLog::new()
            }),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read activity log");
                ActivityLog::new()
            }
        }
    }

    /// 加锁后读取、修改、写回
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ActivityLog),
    {
        use fs2::FileExt;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        lock_file.lock_exclusive()?;

        let mut log = self.load();
        f(&mut log);
        let result = self.write_atomic(&log);

        lock_file.unlock()?;
        result
    }

    fn write_atomic(&self, log: &ActivityLog) -> Result<()> {
        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut temp_file = File::create(&temp_path)?;
            temp_file.write_all(serde_json::to_string_pretty(log)?.as_bytes())?;
            temp_file.sync_all()?;
        }

        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn activity(tool: &str, description: &str) -> Activity {
        Activity {
            timestamp: Utc::now(),
            tool: tool.to_string(),
            description: description.to_string(),
            details: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_load_missing_file_returns_empty() {
        let temp = TempDir::new().unwrap();
        let store = ActivityStore::new(temp.path().join("activity-log.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_corrupt_file_returns_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("activity-log.json");
        fs::write(&path, "{ not json").unwrap();
        let store = ActivityStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_update_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = ActivityStore::new(temp.path().join("nested/activity-log.json"));

        store
            .update(|log| {
                log.insert(
                    "s1".to_string(),
                    SessionLog {
                        session_id: "s1".to_string(),
                        activities: vec![activity("Read", "Read main.rs")],
                        last_update: Utc::now(),
                    },
                );
            })
            .unwrap();

        let log = store.load();
        assert_eq!(log["s1"].activities.len(), 1);
        assert_eq!(log["s1"].activities[0].description, "Read main.rs");
        // 临时文件不应残留
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_last_update_uses_camel_case_key() {
        let json = r#"{"s1":{"session_id":"s1","activities":[],"lastUpdate":"2026-01-01T00:00:00Z"}}"#;
        let log: ActivityLog = serde_json::from_str(json).unwrap();
        assert!(log["s1"].activities.is_empty());

        let out = serde_json::to_string(&log).unwrap();
        assert!(out.contains("lastUpdate"));
    }
}
