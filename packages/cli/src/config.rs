use serde::{Deserialize, Serialize};
use siteconf_store::{FileStorage, LocalStore};
use siteconf_workspace::ServerOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_CONFIG_NAME: &str = "siteconf.config.json";

/// Siteconf project file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteconfConfig {
    /// Published configuration file, relative to the project root
    #[serde(default = "default_durable_path")]
    pub durable_path: String,

    /// Directory holding the local draft storage scopes
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Port the server moves to when it restarts after a publish
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_port: Option<u16>,

    #[serde(default)]
    pub restart_on_publish: bool,

    /// Shell command run after every publish
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebuild_command: Option<String>,

    /// Origins allowed to call the server; empty allows any
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Address the editor reloads after a publish
    #[serde(default = "default_editor_url")]
    pub editor_url: String,
}

fn default_durable_path() -> String {
    "site-config.json".to_string()
}

fn default_storage_dir() -> String {
    ".siteconf".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3030
}

fn default_editor_url() -> String {
    "http://localhost:3030/editor".to_string()
}

impl SiteconfConfig {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: SiteconfConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(SiteconfConfig::default())
        }
    }

    pub fn durable_path(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.durable_path)
    }

    /// File-backed local and session scopes under the storage directory
    pub fn local_store(&self, cwd: &Path) -> LocalStore {
        let dir = cwd.join(&self.storage_dir);
        LocalStore::new(
            Arc::new(FileStorage::new(dir.join("local"))),
            Arc::new(FileStorage::new(dir.join("session"))),
        )
    }

    /// Base URL of the server described by this config
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn server_options(&self, root: &Path) -> ServerOptions {
        ServerOptions {
            host: self.host.clone(),
            port: self.port,
            publish_port: self.publish_port,
            restart_on_publish: self.restart_on_publish,
            rebuild_command: self.rebuild_command.clone(),
            root_dir: root.to_path_buf(),
            allowed_origins: self.allowed_origins.clone(),
        }
    }
}

impl Default for SiteconfConfig {
    fn default() -> Self {
        Self {
            durable_path: default_durable_path(),
            storage_dir: default_storage_dir(),
            host: default_host(),
            port: default_port(),
            publish_port: None,
            restart_on_publish: false,
            rebuild_command: None,
            allowed_origins: vec![],
            editor_url: default_editor_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "durablePath": "public/site.json",
            "port": 8080,
            "publishPort": 8081,
            "restartOnPublish": true,
            "rebuildCommand": "npm run build",
            "allowedOrigins": ["http://localhost:3000"]
        }"#;

        let config: SiteconfConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.durable_path, "public/site.json");
        assert_eq!(config.port, 8080);
        assert_eq!(config.publish_port, Some(8081));
        assert!(config.restart_on_publish);
        assert_eq!(config.rebuild_command.as_deref(), Some("npm run build"));
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.storage_dir, ".siteconf");
        assert_eq!(config.server_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_default_config() {
        let config = SiteconfConfig::default();
        assert_eq!(config.durable_path, "site-config.json");
        assert_eq!(config.port, 3030);
        assert!(!config.restart_on_publish);

        let options = config.server_options(Path::new("/srv/site"));
        assert_eq!(options.root_dir, PathBuf::from("/srv/site"));
        assert_eq!(options.port, 3030);
    }

    #[test]
    fn test_load_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteconfConfig::load(dir.path()).unwrap();
        assert_eq!(config, SiteconfConfig::default());
    }
}
