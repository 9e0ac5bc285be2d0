//! # Navigation Guard
//!
//! Decides whether leaving the editor should ask for confirmation.
//!
//! The guard prompts while there are unsaved edits, except inside a
//! suppression window. Publishing opens that window because the reload it
//! schedules must not be interrupted. There is exactly one deadline:
//! suppressing again replaces it, so windows never stack.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Default length of a suppression window
pub const SUPPRESSION_WINDOW: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
struct GuardState {
    dirty: bool,
    suppressed_until: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct NavigationGuard {
    state: Arc<Mutex<GuardState>>,
}

impl NavigationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_dirty(&self) {
        self.lock().dirty = true;
    }

    pub fn mark_clean(&self) {
        self.lock().dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// Open (or re-arm) the suppression window; returns its deadline
    pub fn suppress(&self, window: Duration) -> Instant {
        let deadline = Instant::now() + window;
        self.lock().suppressed_until = Some(deadline);
        tracing::debug!(?window, "Navigation prompt suppressed");
        deadline
    }

    /// Close the suppression window early
    pub fn lift(&self) {
        self.lock().suppressed_until = None;
    }

    pub fn is_suppressed(&self) -> bool {
        self.lock()
            .suppressed_until
            .is_some_and(|deadline| Instant::now() < deadline)
    }

    pub fn suppressed_until(&self) -> Option<Instant> {
        self.lock().suppressed_until
    }

    /// True when navigating away should ask the user first
    pub fn should_prompt(&self) -> bool {
        self.is_dirty() && !self.is_suppressed()
    }

    fn lock(&self) -> MutexGuard<'_, GuardState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_only_when_dirty() {
        let guard = NavigationGuard::new();
        assert!(!guard.should_prompt());

        guard.mark_dirty();
        assert!(guard.should_prompt());

        guard.mark_clean();
        assert!(!guard.should_prompt());
    }

    #[tokio::test(start_paused = true)]
    async fn test_suppression_window_expires() {
        let guard = NavigationGuard::new();
        guard.mark_dirty();
        guard.suppress(SUPPRESSION_WINDOW);
        assert!(!guard.should_prompt());

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(guard.should_prompt());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_extends_instead_of_stacking() {
        let guard = NavigationGuard::new();
        guard.mark_dirty();

        let first = guard.suppress(SUPPRESSION_WINDOW);
        tokio::time::advance(Duration::from_secs(8)).await;
        let second = guard.suppress(SUPPRESSION_WINDOW);
        assert!(second > first);

        // Past the first deadline, inside the second
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(guard.is_suppressed());
        assert_eq!(guard.suppressed_until(), Some(second));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(!guard.is_suppressed());
    }

    #[test]
    fn test_lift_closes_window() {
        let guard = NavigationGuard::new();
        guard.suppress(SUPPRESSION_WINDOW);
        guard.lift();
        assert!(!guard.is_suppressed());
    }
}
