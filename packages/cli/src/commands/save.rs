use super::draft_session;
use crate::config::SiteconfConfig;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use siteconf_editor::{Navigator, PublishController};
use siteconf_store::FileDurableStore;
use std::path::Path;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Args)]
pub struct SaveArgs {}

/// Saving never reloads
struct NoReload;

impl Navigator for NoReload {
    fn navigate(&self, _target: &Url) {}
}

pub async fn save(_args: SaveArgs, cwd: &Path) -> Result<()> {
    let config = SiteconfConfig::load(cwd)?;
    let durable = Arc::new(FileDurableStore::new(config.durable_path(cwd)));
    let session = draft_session(&config, cwd, durable).await;

    let mut controller = PublishController::new(Url::parse(&config.editor_url)?, Arc::new(NoReload));
    let meta = controller.save(&session)?;

    println!(
        "  {} Configuration saved at {}",
        "✓".green(),
        meta.saved_at.to_rfc3339().bright_white()
    );
    println!("    theme color: {}", meta.theme_color);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_records_session_meta() {
        let dir = tempfile::tempdir().unwrap();
        save(SaveArgs {}, dir.path()).await.unwrap();

        let local = SiteconfConfig::default().local_store(dir.path());
        assert!(local.primary().is_some());
        assert!(local.session_meta().is_some());
    }
}
