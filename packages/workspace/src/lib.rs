//! # Siteconf Workspace
//!
//! Server side of the durable store: serves the published configuration,
//! accepts publishes, runs the rebuild step and streams updates to remote
//! previews.
//!
//! ```text
//! POST /api/config ──▶ ServerState::publish ──▶ file + rebuild
//!                              │
//!                              ├──▶ broadcast ──▶ GET /api/preview (SSE)
//!                              └──▶ restart request ──▶ serve loop rebinds
//!
//! FileWatcher ──▶ ServerState::reload_from_disk ──▶ broadcast
//! ```

mod error;
mod rebuild;
pub mod server;
pub mod state;
pub mod watcher;

pub use error::ServerError;
pub use rebuild::run_rebuild;
pub use server::{bind, router, serve};
pub use state::{RestartRequest, ServerOptions, ServerState};
pub use watcher::{spawn_durable_watcher, FileWatcher, WatcherError, WatcherResult};
