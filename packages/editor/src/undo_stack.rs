//! # Undo/Redo Stack
//!
//! Tracks patch history for an editing session.
//!
//! ## Design
//!
//! - Each entry stores the tree before and after its patches. Trees share
//!   structure, so a snapshot costs one `Arc` clone rather than a deep copy
//! - Undo restores the `before` tree and moves the entry to the redo stack
//! - Redo restores the `after` tree
//! - New patches clear the redo stack
//! - Batches group several patches into one undo step (e.g. a color picker
//!   drag that emits a patch per frame)
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use siteconf_editor::{ConfigPatch, UndoStack};
//! use siteconf_schema::SiteConfiguration;
//!
//! let mut stack = UndoStack::new();
//! let mut config = SiteConfiguration::defaults();
//!
//! stack.apply(&ConfigPatch::set("siteName", json!("Shop")), &mut config).unwrap();
//! assert_eq!(config.get("siteName").and_then(|n| n.as_str()), Some("Shop"));
//!
//! stack.undo(&mut config);
//! assert_eq!(config, SiteConfiguration::defaults());
//! ```

use crate::patch::{apply_patch, ConfigPatch, PatchError};
use siteconf_schema::SiteConfiguration;

/// One undo step: the patches applied and the trees around them
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Patches in application order
    pub patches: Vec<ConfigPatch>,

    /// Tree before the first patch
    pub before: SiteConfiguration,

    /// Tree after the last patch
    pub after: SiteConfiguration,
}

/// Patches collected since `begin_batch`; the trees are known once the
/// first patch is recorded
#[derive(Debug, Default)]
struct Batch {
    patches: Vec<ConfigPatch>,
    bounds: Option<(SiteConfiguration, SiteConfiguration)>,
}

/// Undo/redo stack for configuration editing
#[derive(Debug)]
pub struct UndoStack {
    /// Applied entries (most recent last)
    undo_stack: Vec<HistoryEntry>,

    /// Undone entries (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    current_batch: Option<Batch>,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
        }
    }

    /// Apply a patch to `config` and record it for undo.
    ///
    /// On error neither `config` nor the history changes.
    pub fn apply(
        &mut self,
        patch: &ConfigPatch,
        config: &mut SiteConfiguration,
    ) -> Result<(), PatchError> {
        let next = apply_patch(config, patch)?;
        self.record(patch, config, &next);
        *config = next;
        Ok(())
    }

    /// Record a patch that was already applied elsewhere
    pub fn record(
        &mut self,
        patch: &ConfigPatch,
        before: &SiteConfiguration,
        after: &SiteConfiguration,
    ) {
        match &mut self.current_batch {
            Some(batch) => {
                batch.patches.push(patch.clone());
                match &mut batch.bounds {
                    Some((_, last)) => *last = after.clone(),
                    None => batch.bounds = Some((before.clone(), after.clone())),
                }
            }
            None => self.push_entry(HistoryEntry {
                patches: vec![patch.clone()],
                before: before.clone(),
                after: after.clone(),
            }),
        }
    }

    /// Start a batch of patches (undone/redone together)
    pub fn begin_batch(&mut self) {
        self.current_batch = Some(Batch::default());
    }

    /// End the current batch and push it to the undo stack
    pub fn end_batch(&mut self) {
        if let Some(Batch {
            patches,
            bounds: Some((before, after)),
        }) = self.current_batch.take()
        {
            self.push_entry(HistoryEntry {
                patches,
                before,
                after,
            });
        }
    }

    pub fn is_batching(&self) -> bool {
        self.current_batch.is_some()
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // New action invalidates the future
        self.redo_stack.clear();
    }

    /// Restore the tree from before the most recent entry.
    ///
    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self, config: &mut SiteConfiguration) -> bool {
        // An open batch is closed first so its patches undo as one step
        self.end_batch();

        match self.undo_stack.pop() {
            Some(entry) => {
                *config = entry.before.clone();
                self.redo_stack.push(entry);
                true
            }
            None => false,
        }
    }

    /// Reapply the most recently undone entry
    pub fn redo(&mut self, config: &mut SiteConfiguration) -> bool {
        match self.redo_stack.pop() {
            Some(entry) => {
                *config = entry.after.clone();
                self.undo_stack.push(entry);
                true
            }
            None => false,
        }
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
