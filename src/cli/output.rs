//! Output formatting for CLI commands

use crate::notification::{DispatchResult, SendResult};

/// One line per channel, e.g. `  ✓ discord: sent`
pub fn format_results(results: &[DispatchResult]) -> String {
    if results.is_empty() {
        return "  (no channels enabled)".to_string();
    }
    results
        .iter()
        .map(|r| match &r.result {
            SendResult::Sent => format!("  ✓ {}: sent", r.channel),
            SendResult::Skipped(reason) => format!("  - {}: skipped ({})", r.channel, reason),
            SendResult::Failed(error) => format!("  ✗ {}: failed ({})", r.channel, error),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_results() {
        let results = vec![
            DispatchResult {
                channel: "audio".to_string(),
                result: SendResult::Sent,
            },
            DispatchResult {
                channel: "email".to_string(),
                result: SendResult::Failed("535 auth".to_string()),
            },
        ];
        assert_eq!(format_results(&results), "  ✓ audio: sent\n  ✗ email: failed (535 auth)");
        assert_eq!(format_results(&[]), "  (no channels enabled)");
    }
}
