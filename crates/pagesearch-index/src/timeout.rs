//! Host script timeout budget.
//!
//! Rendering a whole site can outlast the host's request timeout. Long
//! operations raise the budget once, before they start; nothing is enforced
//! while they run.

use std::time::Duration;

use pagesearch_core::SearchConfig;

/// Lets the host raise its script execution timeout.
pub trait ScriptTimeout: Send + Sync {
    /// Allow the current request to run for at least `budget`.
    fn set_timeout(&self, budget: Duration);
}

/// Raise the host budget to `script_timeout_secs` when both are configured.
pub(crate) fn extend_budget(config: &SearchConfig, hook: Option<&dyn ScriptTimeout>) {
    if let (Some(secs), Some(hook)) = (config.script_timeout_secs, hook) {
        log::trace!("Raising script timeout to {secs}s");
        hook.set_timeout(Duration::from_secs(secs));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Duration>>);

    impl ScriptTimeout for Recorder {
        fn set_timeout(&self, budget: Duration) {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(budget);
            }
        }
    }

    #[test]
    fn test_extend_budget_only_when_configured() {
        let recorder = Recorder::default();
        extend_budget(&SearchConfig::default(), Some(&recorder));
        let config = SearchConfig {
            script_timeout_secs: Some(600),
            ..SearchConfig::default()
        };
        extend_budget(&config, None);
        extend_budget(&config, Some(&recorder));
        let seen = recorder.0.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(seen, vec![Duration::from_secs(600)]);
    }
}
