//! 活动追踪 - 记录每个会话最近的工具调用，生成通知正文用的摘要

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use super::store::{Activity, ActivityLog, ActivityStore, SessionLog};
use crate::hook::event::base_name;

/// 每个会话最多保留的活动数
pub const MAX_ACTIVITIES: usize = 10;
/// 会话无活动超过该时长后被清理
pub const SESSION_TTL_MINUTES: i64 = 30;

/// summarize 的窗口范围
const MIN_WINDOW: usize = 3;
const MAX_WINDOW: usize = 5;

const NO_ACTIVITY_SUMMARY: &str = "Completed task";
const NO_ACTIVITY_RECENT: &str = "Task completed";
const NO_ACTIVITY_LATEST: &str = "Task Complete";

const FILE_TOOLS: [&str; 3] = ["Write", "Edit", "MultiEdit"];

/// 活动追踪器
pub struct ActivityTracker {
    store: ActivityStore,
    max_activities: usize,
    session_ttl: Duration,
}

impl ActivityTracker {
    pub fn new(store: ActivityStore) -> Self {
        Self {
            store,
            max_activities: MAX_ACTIVITIES,
            session_ttl: Duration::minutes(SESSION_TTL_MINUTES),
        }
    }

    pub fn with_max_activities(mut self, max: usize) -> Self {
        self.max_activities = max.max(1);
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn store(&self) -> &ActivityStore {
        &self.store
    }

    /// 记录一次工具调用
    pub fn record(&self, session_id: &str, tool: &str, params: &Value) -> Result<()> {
        self.record_at(session_id, tool, params, Utc::now())
    }

    /// 以指定时间记录（测试用）
    pub fn record_at(
        &self,
        session_id: &str,
        tool: &str,
        params: &Value,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let activity = Activity {
            timestamp: now,
            tool: tool.to_string(),
            description: describe_activity(tool, params),
            details: params.clone(),
        };
        let max = self.max_activities;
        let ttl = self.session_ttl;

        self.store.update(|log| {
            purge_expired(log, now, ttl);

            let session = log
                .entry(session_id.to_string())
                .or_insert_with(|| SessionLog {
                    session_id: session_id.to_string(),
                    activities: Vec::new(),
                    last_update: now,
                });

            debug!(session_id, description = %activity.description, "Recording activity");
            session.activities.push(activity);
            session.last_update = now;

            // FIFO：只保留最后 max 条
            if session.activities.len() > max {
                let excess = session.activities.len() - max;
                session.activities.drain(..excess);
            }
        })
    }

    /// 最近 count 条活动（按时间顺序）
    pub fn recent_activities(&self, session_id: &str, count: usize) -> Vec<Activity> {
        let log = self.store.load();
        match log.get(session_id) {
            Some(session) => {
                let start = session.activities.len().saturating_sub(count);
                session.activities[start..].to_vec()
            }
            None => Vec::new(),
        }
    }

    /// 生成简短的会话摘要
    ///
    /// 文件修改优先（最多列出 2 个文件，最近的在前），其次是命令执行，
    /// 再次是读代码，都没有时用最近一条活动的描述。
    pub fn summarize(&self, session_id: &str, window: usize) -> String {
        let window = window.clamp(MIN_WINDOW, MAX_WINDOW);
        let activities = self.recent_activities(session_id, window);
        summarize_activities(&activities)
    }

    /// 最近几条活动描述，用 " → " 连接（`[activity-summary]` 占位符）
    pub fn recent_summary(&self, session_id: &str, count: usize) -> String {
        let activities = self.recent_activities(session_id, count);
        if activities.is_empty() {
            return NO_ACTIVITY_RECENT.to_string();
        }
        activities
            .iter()
            .map(|a| a.description.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
    }

    /// 最近一条活动的描述
    pub fn latest_description(&self, session_id: &str) -> String {
        self.recent_activities(session_id, 1)
            .pop()
            .map(|a| a.description)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| NO_ACTIVITY_LATEST.to_string())
    }
}

fn purge_expired(log: &mut ActivityLog, now: DateTime<Utc>, ttl: Duration) {
    log.retain(|session_id, session| {
        let keep = now.signed_duration_since(session.last_update) <= ttl;
        if !keep {
            debug!(session_id = %session_id, "Purging expired session");
        }
        keep
    });
}

fn summarize_activities(activities: &[Activity]) -> String {
    let Some(latest) = activities.last() else {
        return NO_ACTIVITY_SUMMARY.to_string();
    };

    if uses_any(activities, &FILE_TOOLS) {
        let mut seen = HashSet::new();
        let files: Vec<&str> = activities
            .iter()
            .filter(|a| is_one_of(&a.tool, &FILE_TOOLS))
            .filter_map(|a| a.details.get("file_path").and_then(Value::as_str))
            .filter_map(base_name)
            .filter(|name| seen.insert(*name))
            .take(2)
            .collect();
        if !files.is_empty() {
            return format!("Updated {}", files.join(", "));
        }
    }

    if uses_any(activities, &["Bash"]) {
        return "Executed commands".to_string();
    }

    if uses_any(activities, &["Read", "Grep"]) {
        return "Analyzed code".to_string();
    }

    latest.description.clone()
}

fn is_one_of(tool: &str, tools: &[&str]) -> bool {
    tools.iter().any(|t| *t == tool)
}

fn uses_any(activities: &[Activity], tools: &[&str]) -> bool {
    activities.iter().any(|a| is_one_of(&a.tool, tools))
}

/// 按工具生成活动描述
pub fn describe_activity(tool: &str, params: &Value) -> String {
    let str_param = |key: &str| params.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());
    let file_name = |key: &str| str_param(key).and_then(base_name).unwrap_or("file").to_string();

    match tool {
        "Read" => format!("Read {}", file_name("file_path")),
        "Write" => format!("Created {}", file_name("file_path")),
        "Edit" | "MultiEdit" => format!("Edited {}", file_name("file_path")),
        "Bash" => match str_param("description") {
            Some(description) => description.to_string(),
            None => {
                let command = str_param("command").unwrap_or("command");
                let name = command.split_whitespace().next().unwrap_or("command");
                format!("Ran {}", name)
            }
        },
        "TodoWrite" => "Updated todo list".to_string(),
        "Grep" => format!("Searched for \"{}\"", str_param("pattern").unwrap_or("pattern")),
        "LS" => format!("Listed {}", file_name("path")),
        "WebFetch" => format!("Fetched {}", str_param("url").unwrap_or("URL")),
        "WebSearch" => format!("Searched: \"{}\"", str_param("query").unwrap_or("query")),
        _ => format!("Used {}", tool),
    }
}
