use super::{check_toasts, draft_session};
use crate::config::SiteconfConfig;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use siteconf_editor::{Navigator, PublishController, PublishOutcome};
use siteconf_store::HttpDurableStore;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Server base URL (defaults to host and port from the config file)
    #[arg(short, long)]
    pub url: Option<String>,
}

/// Hands the reload target back to the command once its delay elapsed
struct ChannelNavigator(mpsc::UnboundedSender<Url>);

impl Navigator for ChannelNavigator {
    fn navigate(&self, target: &Url) {
        let _ = self.0.send(target.clone());
    }
}

pub async fn publish(args: PublishArgs, cwd: &Path) -> Result<()> {
    let config = SiteconfConfig::load(cwd)?;
    let server_url = args.url.unwrap_or_else(|| config.server_url());
    let durable = Arc::new(HttpDurableStore::new(&server_url)?);
    let mut session = draft_session(&config, cwd, durable).await;

    println!("{} {}", "🚀 Publishing to".bright_blue().bold(), server_url);

    let (tx, mut reloads) = mpsc::unbounded_channel();
    let mut controller = PublishController::new(
        Url::parse(&config.editor_url)?,
        Arc::new(ChannelNavigator(tx)),
    );

    match controller.publish(&mut session).await? {
        PublishOutcome::Published { receipt, reload } => {
            println!("  {} Published at {}", "✓".green(), receipt.timestamp);
            if receipt.server_restarted {
                println!(
                    "  {} Server restarted{}",
                    "↻".yellow(),
                    receipt
                        .new_port
                        .map(|port| format!(" on port {}", port))
                        .unwrap_or_default()
                );
            }
            println!("  Reloading in {} ms...", reload.delay.as_millis());

            if let Some(target) = reloads.recv().await {
                println!("  {} {}", "→".green(), target.as_str().bright_white());
            }
            Ok(())
        }
        PublishOutcome::Failed { error } => {
            check_toasts(&session)?;
            Err(error.into())
        }
    }
}
