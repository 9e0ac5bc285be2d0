//! # Toasts
//!
//! Short-lived, non-blocking feedback. Every toast carries its own lifetime
//! and is dismissed by a fire-and-forget timer; nothing awaits that timer.
//! Without a runtime the toast simply expires on the next `visible()` call.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Lifetime of a success acknowledgment
pub const SUCCESS_TOAST: Duration = Duration::from_secs(3);

/// Lifetime of an error message
pub const ERROR_TOAST: Duration = Duration::from_secs(5);

const MAX_MESSAGE_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug, Default)]
struct ToastState {
    toasts: Vec<Toast>,
    next_id: u64,
}

/// Shared toast queue
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    state: Arc<Mutex<ToastState>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        let message = message.into();
        tracing::info!(%message, "Success");
        self.show(ToastKind::Success, message, SUCCESS_TOAST)
    }

    /// Show an error; the message is sanitized first
    pub fn error(&self, message: impl AsRef<str>) -> u64 {
        let message = sanitize_message(message.as_ref());
        tracing::error!(%message, "Error");
        self.show(ToastKind::Error, message, ERROR_TOAST)
    }

    pub fn show(&self, kind: ToastKind, message: String, ttl: Duration) -> u64 {
        let id = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.toasts.push(Toast {
                id,
                kind,
                message,
                expires_at: Instant::now() + ttl,
            });
            id
        };

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let notifier = self.clone();
            handle.spawn(async move {
                tokio::time::sleep(ttl).await;
                notifier.dismiss(id);
            });
        }

        id
    }

    /// Remove a toast early; false when it is already gone
    pub fn dismiss(&self, id: u64) -> bool {
        let mut state = self.lock();
        let before = state.toasts.len();
        state.toasts.retain(|toast| toast.id != id);
        state.toasts.len() != before
    }

    /// Toasts that have not expired yet, oldest first
    pub fn visible(&self) -> Vec<Toast> {
        let now = Instant::now();
        let mut state = self.lock();
        state.toasts.retain(|toast| toast.expires_at > now);
        state.toasts.clone()
    }

    pub fn latest(&self) -> Option<Toast> {
        self.visible().pop()
    }

    fn lock(&self) -> MutexGuard<'_, ToastState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Make an error description fit for display: single line, no control
/// characters, bounded length.
pub fn sanitize_message(message: &str) -> String {
    let cleaned: String = message
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return "Unknown error".to_string();
    }

    match collapsed.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((idx, _)) => format!("{}…", &collapsed[..idx]),
        None => collapsed,
    }
}
