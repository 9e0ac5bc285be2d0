use crate::config::SiteconfConfig;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use siteconf_store::{ConfigStore, FileDurableStore};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Show the local draft instead of the published configuration
    #[arg(short, long)]
    pub local: bool,
}

pub async fn show(args: ShowArgs, cwd: &Path) -> Result<()> {
    let config = SiteconfConfig::load(cwd)?;
    let store = ConfigStore::new(
        config.local_store(cwd),
        Arc::new(FileDurableStore::new(config.durable_path(cwd))),
    );

    let site = if args.local {
        match store.load_local() {
            Some(draft) => draft,
            None => {
                eprintln!("{} No local draft yet", "⚠️".yellow());
                return Ok(());
            }
        }
    } else {
        store.load_durable().await
    };

    println!("{}", site.to_json_pretty()?);
    Ok(())
}
