//! Priority of a resolved payload
//!
//! Chat webhook, email and bot-message channels only deliver `high`
//! payloads. `medium` and `low` are accepted in configuration but dropped
//! by those channels; there is no override.

use serde::{Deserialize, Serialize};

/// Priority level for channel payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Gate used by priority-filtered channels
///
/// A payload without a priority is treated as not high.
pub fn passes_high_gate(priority: Option<Priority>) -> bool {
    matches!(priority, Some(Priority::High))
}

/// Reason string for a payload dropped by the gate
pub fn gate_skip_reason(priority: Option<Priority>) -> String {
    match priority {
        Some(p) => format!("priority {} below high", p),
        None => "priority not set".to_string(),
    }
}
