//! # Server State
//!
//! The durable configuration as the server sees it: the file on disk, a
//! resolved in-memory copy served to readers, and the broadcast channel
//! that feeds remote previews.
//!
//! Publishes are serialized by an async lock. Each one:
//!
//! 1. writes the file atomically
//! 2. runs the rebuild command, if any (non-zero exit fails the publish)
//! 3. swaps the in-memory copy and broadcasts it
//! 4. requests a listener restart, if configured
//!
//! A failed rebuild puts the previous file content back (or removes the
//! file if there was none) before the error is returned. Outside edits
//! picked up by the watcher wait on the same lock, so they never observe
//! a file whose rebuild is still running.

use crate::error::ServerError;
use crate::rebuild::run_rebuild;
use siteconf_schema::{resolve, Envelope, PreviewMessage, PublishResponse, SiteConfiguration};
use siteconf_store::{write_atomic, DurableStore, FileDurableStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Mutex, RwLock};
use tokio::sync::{broadcast, mpsc, watch};

const BROADCAST_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,

    /// Port to move to when restarting after a publish
    pub publish_port: Option<u16>,

    pub restart_on_publish: bool,

    /// Shell command run after each durable write
    pub rebuild_command: Option<String>,

    /// Working directory of the rebuild command
    pub root_dir: PathBuf,

    /// CORS origins; empty allows any
    pub allowed_origins: Vec<String>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            publish_port: None,
            restart_on_publish: false,
            rebuild_command: None,
            root_dir: PathBuf::from("."),
            allowed_origins: Vec::new(),
        }
    }
}

/// Listener restart requested by a publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartRequest {
    pub port: u16,
}

pub struct ServerState {
    options: ServerOptions,
    durable: FileDurableStore,
    current: RwLock<SiteConfiguration>,
    updates: broadcast::Sender<Envelope>,
    publish_lock: tokio::sync::Mutex<()>,
    port: AtomicU16,
    restarts: mpsc::UnboundedSender<RestartRequest>,
    restart_receiver: Mutex<Option<mpsc::UnboundedReceiver<RestartRequest>>>,
    streams: watch::Sender<u64>,
}

impl ServerState {
    /// Load the durable file (defaults when missing or unreadable)
    pub async fn load(options: ServerOptions, durable_path: impl Into<PathBuf>) -> Self {
        let durable = FileDurableStore::new(durable_path);
        let current = match durable.load().await {
            Ok(Some(value)) => resolve(&value),
            Ok(None) => {
                tracing::info!(path = %durable.path().display(), "No durable configuration yet, serving defaults");
                SiteConfiguration::defaults()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Durable configuration unreadable, serving defaults");
                SiteConfiguration::defaults()
            }
        };

        let (updates, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (restarts, restart_receiver) = mpsc::unbounded_channel();
        let (streams, _) = watch::channel(0);

        Self {
            port: AtomicU16::new(options.port),
            options,
            durable,
            current: RwLock::new(current),
            updates,
            publish_lock: tokio::sync::Mutex::new(()),
            restarts,
            restart_receiver: Mutex::new(Some(restart_receiver)),
            streams,
        }
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    pub fn durable_path(&self) -> &Path {
        self.durable.path()
    }

    /// Resolved durable configuration
    pub fn current(&self) -> SiteConfiguration {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_current(&self, config: SiteConfiguration) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
    }

    /// Port the listener is bound to
    pub fn port(&self) -> u16 {
        self.port.load(Ordering::SeqCst)
    }

    pub(crate) fn set_port(&self, port: u16) {
        self.port.store(port, Ordering::SeqCst);
    }

    /// Origin stamped on outgoing envelopes
    pub fn origin(&self) -> String {
        format!("http://{}:{}", self.options.host, self.port())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.updates.subscribe()
    }

    pub fn envelope_for(&self, config: &SiteConfiguration) -> Option<Envelope> {
        match Envelope::new(self.origin(), &PreviewMessage::config_update(config.clone())) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize preview message");
                None
            }
        }
    }

    /// Send a configuration to every preview stream
    pub fn broadcast(&self, config: &SiteConfiguration) -> usize {
        self.envelope_for(config)
            .and_then(|envelope| self.updates.send(envelope).ok())
            .unwrap_or(0)
    }

    /// Write, rebuild, swap, broadcast and (maybe) restart
    pub async fn publish(&self, config: SiteConfiguration) -> Result<PublishResponse, ServerError> {
        let _guard = self.publish_lock.lock().await;

        let previous = match tokio::fs::read(self.durable.path()).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let timestamp = self.durable.write(&config).await?;
        tracing::info!(path = %self.durable.path().display(), %timestamp, "Durable configuration written");

        if let Some(command) = &self.options.rebuild_command {
            if let Err(e) = run_rebuild(command, &self.options.root_dir).await {
                self.restore_durable(previous).await;
                return Err(e);
            }
        }

        let resolved = resolve(&config.to_value());
        self.set_current(resolved.clone());
        self.broadcast(&resolved);

        let mut response = PublishResponse {
            success: true,
            timestamp: Some(timestamp),
            server_restarted: Some(false),
            new_port: None,
            message: None,
        };

        if self.options.restart_on_publish {
            let port = self.options.publish_port.unwrap_or_else(|| self.port());
            if self.restarts.send(RestartRequest { port }).is_ok() {
                response.server_restarted = Some(true);
                response.new_port = Some(port);
            } else {
                tracing::warn!("Restart requested but no listener is running");
            }
        }

        Ok(response)
    }

    /// Re-read the durable file after an outside edit; broadcast if it
    /// changed. Unreadable content keeps the current copy.
    pub async fn reload_from_disk(&self) -> bool {
        let _guard = self.publish_lock.lock().await;

        let loaded = match self.durable.load().await {
            Ok(Some(value)) => resolve(&value),
            Ok(None) => {
                tracing::warn!("Durable configuration removed, keeping last known copy");
                return false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable durable configuration");
                return false;
            }
        };

        if loaded == self.current() {
            return false;
        }

        tracing::info!("Durable configuration changed on disk");
        self.set_current(loaded.clone());
        self.broadcast(&loaded);
        true
    }

    async fn restore_durable(&self, previous: Option<Vec<u8>>) {
        let path = self.durable.path().to_path_buf();
        let restored = match previous {
            Some(bytes) => tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
                .await
                .map_err(|e| e.to_string())
                .and_then(|written| written.map_err(|e| e.to_string())),
            None => tokio::fs::remove_file(&path).await.map_err(|e| e.to_string()),
        };

        match restored {
            Ok(()) => tracing::warn!(
                path = %self.durable.path().display(),
                "Rebuild failed, durable configuration rolled back"
            ),
            Err(error) => tracing::error!(%error, "Could not roll back durable configuration"),
        }
    }

    pub(crate) fn take_restart_receiver(&self) -> Option<mpsc::UnboundedReceiver<RestartRequest>> {
        self.restart_receiver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    /// Watch that changes whenever open streams must end
    pub(crate) fn stream_generation(&self) -> watch::Receiver<u64> {
        self.streams.subscribe()
    }

    /// End all open preview streams so the listener can shut down
    pub(crate) fn close_streams(&self) {
        self.streams.send_modify(|generation| *generation += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> ServerOptions {
        ServerOptions::default()
    }

    #[tokio::test]
    async fn test_load_missing_file_serves_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let state = ServerState::load(options(), dir.path().join("site-config.json")).await;
        assert_eq!(state.current(), SiteConfiguration::defaults());
    }

    #[tokio::test]
    async fn test_publish_writes_and_broadcasts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site-config.json");
        let state = ServerState::load(options(), &path).await;
        let mut updates = state.subscribe();

        let config = SiteConfiguration::from_value(json!({ "siteName": "Published" })).unwrap();
        let response = state.publish(config).await.unwrap();

        assert!(response.success);
        assert!(response.timestamp.is_some());
        assert_eq!(response.server_restarted, Some(false));

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, json!({ "siteName": "Published" }));

        assert_eq!(
            state.current().get("siteName").and_then(|n| n.as_str()),
            Some("Published")
        );
        let envelope = updates.try_recv().unwrap();
        let message = PreviewMessage::from_json(&envelope.payload).unwrap();
        assert_eq!(message.config, state.current());
    }

    #[tokio::test]
    async fn test_restart_on_publish_reports_new_port() {
        let dir = tempfile::tempdir().unwrap();
        let options = ServerOptions {
            restart_on_publish: true,
            publish_port: Some(4000),
            ..ServerOptions::default()
        };
        let state = ServerState::load(options, dir.path().join("site-config.json")).await;
        let mut restarts = state.take_restart_receiver().unwrap();

        let response = state.publish(SiteConfiguration::defaults()).await.unwrap();

        assert_eq!(response.server_restarted, Some(true));
        assert_eq!(response.new_port, Some(4000));
        assert_eq!(restarts.try_recv().unwrap(), RestartRequest { port: 4000 });
    }

    #[tokio::test]
    async fn test_reload_from_disk_ignores_identical_and_corrupt_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site-config.json");
        let state = ServerState::load(options(), &path).await;

        state.publish(SiteConfiguration::defaults()).await.unwrap();
        assert!(!state.reload_from_disk().await);

        std::fs::write(&path, "{ half written").unwrap();
        assert!(!state.reload_from_disk().await);

        std::fs::write(&path, r#"{"siteName":"Hand edited"}"#).unwrap();
        assert!(state.reload_from_disk().await);
        assert_eq!(
            state.current().get("siteName").and_then(|n| n.as_str()),
            Some("Hand edited")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_rebuild_restores_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site-config.json");
        std::fs::write(&path, r#"{"siteName":"Kept"}"#).unwrap();
        let options = ServerOptions {
            rebuild_command: Some("exit 1".to_string()),
            root_dir: dir.path().to_path_buf(),
            ..ServerOptions::default()
        };
        let state = ServerState::load(options, &path).await;
        let mut updates = state.subscribe();

        let rejected = SiteConfiguration::from_value(json!({ "siteName": "Rejected" })).unwrap();
        assert!(matches!(state.publish(rejected).await, Err(ServerError::Rebuild(_))));

        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"siteName":"Kept"}"#);
        assert_eq!(
            state.current().get("siteName").and_then(|n| n.as_str()),
            Some("Kept")
        );
        assert!(updates.try_recv().is_err());
        assert!(!state.reload_from_disk().await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_first_rebuild_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site-config.json");
        let options = ServerOptions {
            rebuild_command: Some("exit 3".to_string()),
            root_dir: dir.path().to_path_buf(),
            ..ServerOptions::default()
        };
        let state = ServerState::load(options, &path).await;

        assert!(state.publish(SiteConfiguration::defaults()).await.is_err());
        assert!(!path.exists());
    }
}
