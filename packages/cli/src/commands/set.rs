use super::{check_toasts, draft_session};
use crate::config::SiteconfConfig;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::Value;
use siteconf_editor::ConfigPatch;
use siteconf_store::FileDurableStore;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Dotted path, numeric segments index arrays (e.g. footerLinks.0.label)
    pub path: String,

    /// JSON value; anything that is not valid JSON is taken as a string
    pub value: String,
}

pub async fn set(args: SetArgs, cwd: &Path) -> Result<()> {
    let config = SiteconfConfig::load(cwd)?;
    let durable = Arc::new(FileDurableStore::new(config.durable_path(cwd)));
    let mut session = draft_session(&config, cwd, durable).await;

    let segments: Vec<&str> = args.path.split('.').filter(|s| !s.is_empty()).collect();
    session.apply(ConfigPatch::from_dotted(&args.path, parse_value(&args.value)))?;
    check_toasts(&session)?;

    let written = session
        .config()
        .pointer(&segments)
        .map(|node| node.to_value())
        .unwrap_or(Value::Null);
    println!(
        "  {} {} = {}",
        "✓".green(),
        args.path.bright_white(),
        written
    );

    Ok(())
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
