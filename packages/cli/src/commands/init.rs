use crate::config::{SiteconfConfig, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use siteconf_schema::SiteConfiguration;
use siteconf_store::write_atomic;
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Published configuration file
    #[arg(short, long, default_value = "site-config.json")]
    pub durable_path: String,

    /// Server port
    #[arg(short, long, default_value_t = 3030)]
    pub port: u16,

    /// Force overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing site configuration...".bright_blue().bold());

    let config = SiteconfConfig {
        durable_path: args.durable_path.clone(),
        port: args.port,
        ..SiteconfConfig::default()
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let durable_path = config.durable_path(cwd);
    if durable_path.exists() && !args.force {
        println!("  {} Kept existing {}", "•".dimmed(), args.durable_path);
    } else {
        let defaults = SiteConfiguration::defaults().to_json_pretty()?;
        write_atomic(&durable_path, defaults.as_bytes())?;
        println!("  {} Created {}", "✓".green(), args.durable_path);
    }

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: siteconf serve");
    println!("  2. Edit: siteconf set siteName '\"My Site\"'");
    println!("  3. Run: siteconf publish");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(force: bool) -> InitArgs {
        InitArgs {
            durable_path: "site-config.json".to_string(),
            port: 4040,
            force,
        }
    }

    #[test]
    fn test_init_writes_config_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        init(args(false), dir.path()).unwrap();

        let config = SiteconfConfig::load(dir.path()).unwrap();
        assert_eq!(config.port, 4040);

        let text = fs::read_to_string(dir.path().join("site-config.json")).unwrap();
        assert_eq!(
            SiteConfiguration::from_json(&text).unwrap(),
            SiteConfiguration::defaults()
        );
    }

    #[test]
    fn test_init_keeps_existing_without_force() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{"port":9000}"#).unwrap();

        init(args(false), dir.path()).unwrap();
        assert_eq!(SiteconfConfig::load(dir.path()).unwrap().port, 9000);

        init(args(true), dir.path()).unwrap();
        assert_eq!(SiteconfConfig::load(dir.path()).unwrap().port, 4040);
    }
}
