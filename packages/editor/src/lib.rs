//! # Siteconf Editor
//!
//! Editing side of the site configuration pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ form components → ConfigPatch               │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ EditSession                                 │
//! │  - apply_patch (immutable, shared subtrees) │
//! │  - UndoStack                                │
//! │  - save_local before broadcast              │
//! └─────────────────────────────────────────────┘
//!          ↓                          ↓
//! ┌──────────────────┐    ┌──────────────────────┐
//! │ EventBus         │    │ PreviewChannel       │
//! │ (same document)  │    │ (cross-context)      │
//! └──────────────────┘    └──────────────────────┘
//!
//! PublishController: save (local) / publish (durable + reload)
//! ```
//!
//! ## Core Principles
//!
//! 1. **Patches only**: no edit replaces the whole tree
//! 2. **Never mutate**: every edit yields a new tree; untouched branches
//!    keep their identity
//! 3. **Persist, then broadcast**: listeners reading storage see the edit
//! 4. **Degrade, don't fail**: local storage problems become toasts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use siteconf_editor::{ConfigPatch, EditSession, PublishController};
//!
//! let mut session = EditSession::open(store, bus, Notifier::new()).await;
//! session.apply(ConfigPatch::set_path(["footerStyle", "titleColor"], json!("#112233")))?;
//!
//! let mut controller = PublishController::new(editor_url, navigator);
//! controller.save(&session)?;
//! let outcome = controller.publish(&mut session).await?;
//! ```

mod bus;
mod errors;
mod guard;
mod notify;
mod patch;
mod publish;
mod session;
mod undo_stack;

pub use bus::{
    events_for_patch, DocumentEvent, EventBus, PreviewChannel, PropagationBus, SubscriptionId,
};
pub use errors::EditorError;
pub use guard::{NavigationGuard, SUPPRESSION_WINDOW};
pub use notify::{sanitize_message, Notifier, Toast, ToastKind, ERROR_TOAST, SUCCESS_TOAST};
pub use patch::{apply_patch, apply_patches, ConfigPatch, PatchError};
pub use publish::{
    reload_delay, reload_target, Navigator, PublishController, PublishOutcome, PublishState,
    ReloadPlan, CACHE_BUST_PARAM, RELOAD_DELAY, RESTART_RELOAD_DELAY,
};
pub use session::EditSession;
pub use undo_stack::{HistoryEntry, UndoStack};
