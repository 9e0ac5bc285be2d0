mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    init, publish, save, serve, set, show, InitArgs, PublishArgs, SaveArgs, ServeArgs, SetArgs,
    ShowArgs,
};
use tracing_subscriber::EnvFilter;

/// Siteconf CLI - edit, publish and serve a site configuration
#[derive(Parser, Debug)]
#[command(name = "siteconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a config file and a default published configuration
    Init(InitArgs),

    /// Print the published (or draft) configuration
    Show(ShowArgs),

    /// Change one value in the local draft
    Set(SetArgs),

    /// Save the local draft with session metadata
    Save(SaveArgs),

    /// Publish the local draft to the server
    Publish(PublishArgs),

    /// Run the configuration server
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match std::env::current_dir() {
        Ok(cwd) => match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Show(args) => show(args, &cwd).await,
            Command::Set(args) => set(args, &cwd).await,
            Command::Save(args) => save(args, &cwd).await,
            Command::Publish(args) => publish(args, &cwd).await,
            Command::Serve(args) => serve(args, &cwd).await,
        },
        Err(e) => Err(anyhow::anyhow!("Cannot get current directory: {}", e)),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
