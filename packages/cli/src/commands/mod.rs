pub mod init;
pub mod publish;
pub mod save;
pub mod serve;
pub mod set;
pub mod show;

pub use init::{init, InitArgs};
pub use publish::{publish, PublishArgs};
pub use save::{save, SaveArgs};
pub use serve::{serve, ServeArgs};
pub use set::{set, SetArgs};
pub use show::{show, ShowArgs};

use crate::config::SiteconfConfig;
use siteconf_editor::{EditSession, EventBus, Notifier, PropagationBus, ToastKind};
use siteconf_store::{ConfigStore, DurableStore};
use std::path::Path;
use std::sync::Arc;

/// Editor session over the project's local draft, falling back to the
/// published configuration when no draft exists yet
pub(crate) async fn draft_session(
    config: &SiteconfConfig,
    cwd: &Path,
    durable: Arc<dyn DurableStore>,
) -> EditSession {
    let store = ConfigStore::new(config.local_store(cwd), durable);
    let base = match store.load_local() {
        Some(draft) => draft,
        None => store.load_durable().await,
    };

    EditSession::with_config(
        base,
        store,
        PropagationBus::new(Arc::new(EventBus::new())),
        Notifier::new(),
    )
}

/// Turn the session's latest error toast into a command failure
pub(crate) fn check_toasts(session: &EditSession) -> anyhow::Result<()> {
    match session.notifier().latest() {
        Some(toast) if toast.kind == ToastKind::Error => Err(anyhow::anyhow!(toast.message)),
        _ => Ok(()),
    }
}
