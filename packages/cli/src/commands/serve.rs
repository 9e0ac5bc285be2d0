use crate::config::SiteconfConfig;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use siteconf_workspace::{bind, serve as serve_forever, spawn_durable_watcher, ServerState};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Project root holding the config file
    #[arg(short, long)]
    pub root: Option<PathBuf>,
}

pub async fn serve(args: ServeArgs, cwd: &Path) -> Result<()> {
    let root = args.root.unwrap_or_else(|| cwd.to_path_buf());
    let config = SiteconfConfig::load(&root)?;

    let mut options = config.server_options(&root);
    if let Some(port) = args.port {
        options.port = port;
    }

    let listener = bind(&options.host, options.port).await?;
    let state = Arc::new(ServerState::load(options, config.durable_path(&root)).await);

    let _watcher = match spawn_durable_watcher(Arc::clone(&state)) {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Outside edits of the durable file will not be picked up");
            None
        }
    };

    println!(
        "{} {}",
        "🌐 Serving site configuration on".bright_blue().bold(),
        state.origin().bright_white()
    );
    println!("   GET/POST {}/api/config", state.origin());
    println!("   SSE      {}/api/preview", state.origin());

    serve_forever(state, listener).await?;
    Ok(())
}
