use crate::state::ServerState;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Failed to create watcher: {0}")]
    CreateError(#[from] notify::Error),

    #[error("Watch error: {0}")]
    WatchError(String),
}

pub type WatcherResult<T> = Result<T, WatcherError>;

/// Watches a single file through its parent directory, so atomic
/// replacements (write temp, rename over) are seen too
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: UnboundedReceiver<notify::Result<Event>>,
    file_name: OsString,
}

impl FileWatcher {
    pub fn new(path: &Path) -> WatcherResult<Self> {
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| WatcherError::WatchError(format!("{} is not a file path", path.display())))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            file_name,
        })
    }

    /// Next create/modify/remove event touching the watched file
    pub async fn next_event(&mut self) -> Option<Event> {
        while let Some(result) = self.receiver.recv().await {
            match result {
                Ok(event) if self.is_relevant(&event) => return Some(event),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "File watcher error"),
            }
        }
        None
    }

    fn is_relevant(&self, event: &Event) -> bool {
        matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
    }
}

/// Rebroadcast outside edits of the durable file
pub fn spawn_durable_watcher(state: Arc<ServerState>) -> WatcherResult<JoinHandle<()>> {
    let mut watcher = FileWatcher::new(state.durable_path())?;
    tracing::info!(path = %state.durable_path().display(), "Watching durable configuration");

    Ok(tokio::spawn(async move {
        while watcher.next_event().await.is_some() {
            state.reload_from_disk().await;
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ServerOptions;
    use siteconf_schema::PreviewMessage;
    use std::time::Duration;

    #[tokio::test]
    async fn test_file_watcher() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site-config.json");
        let mut watcher = FileWatcher::new(&path).unwrap();

        let writer_path = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::fs::write(dir.path().join("unrelated.txt"), "x").unwrap();
            std::fs::write(writer_path, "{}").unwrap();
            // Keep the directory alive until the events are delivered
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(dir);
        });

        let event = tokio::time::timeout(Duration::from_secs(5), watcher.next_event())
            .await
            .unwrap()
            .unwrap();
        assert!(event.paths.iter().any(|p| p.ends_with("site-config.json")));
    }

    #[tokio::test]
    async fn test_outside_edit_is_broadcast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site-config.json");
        let state = Arc::new(ServerState::load(ServerOptions::default(), &path).await);
        let mut updates = state.subscribe();

        let handle = spawn_durable_watcher(Arc::clone(&state)).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        std::fs::write(&path, r#"{"siteName":"Edited by hand"}"#).unwrap();

        let envelope = tokio::time::timeout(Duration::from_secs(5), updates.recv())
            .await
            .unwrap()
            .unwrap();
        let message = PreviewMessage::from_json(&envelope.payload).unwrap();
        assert_eq!(
            message.config.get("siteName").and_then(|n| n.as_str()),
            Some("Edited by hand")
        );

        handle.abort();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejected_publish_is_not_served_by_the_watcher() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site-config.json");
        let options = ServerOptions {
            rebuild_command: Some("sleep 1; exit 1".to_string()),
            root_dir: dir.path().to_path_buf(),
            ..ServerOptions::default()
        };
        let state = Arc::new(ServerState::load(options, &path).await);
        let mut updates = state.subscribe();

        let handle = spawn_durable_watcher(Arc::clone(&state)).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let rejected = siteconf_schema::SiteConfiguration::from_value(
            serde_json::json!({ "siteName": "Rejected" }),
        )
        .unwrap();
        assert!(state.publish(rejected).await.is_err());

        // Give the watcher time to react to the write and the rollback
        let broadcast = tokio::time::timeout(Duration::from_secs(2), updates.recv()).await;
        assert!(broadcast.is_err());
        assert_eq!(state.current(), siteconf_schema::SiteConfiguration::defaults());
        assert!(!path.exists());

        handle.abort();
    }
}
