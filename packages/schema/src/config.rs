//! # Site Configuration
//!
//! Root aggregate handed between the editor, the stores and the preview.
//!
//! A `SiteConfiguration` is always an object tree. It is not necessarily
//! resolved: patches and preview messages may carry partial trees, and
//! callers go through [`crate::resolve`] before trusting every field.

use crate::error::SchemaError;
use crate::node::ConfigNode;
use crate::schema::resolve;
use crate::sections::{FooterStyle, HeroSection, InfoBar, NavBar, DEFAULT_ACCENT, HOME_PAGE};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Site configuration tree (root is always an object)
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfiguration {
    root: ConfigNode,
}

impl SiteConfiguration {
    /// Fully resolved default configuration
    pub fn defaults() -> Self {
        resolve(&Value::Null)
    }

    /// Wrap an object node
    pub fn from_root(root: ConfigNode) -> Result<Self, SchemaError> {
        if root.is_object() {
            Ok(Self { root })
        } else {
            Err(SchemaError::NotAnObject)
        }
    }

    /// Build from a JSON value without resolving it
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        Self::from_root(ConfigNode::from(value))
    }

    /// Parse JSON text without resolving it
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub(crate) fn from_resolved(value: Value) -> Self {
        match ConfigNode::from(value) {
            root @ ConfigNode::Object(_) => Self { root },
            _ => Self {
                root: ConfigNode::empty_object(),
            },
        }
    }

    pub fn root(&self) -> &ConfigNode {
        &self.root
    }

    pub fn into_root(self) -> ConfigNode {
        self.root
    }

    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.root.get(key)
    }

    pub fn pointer<S: AsRef<str>>(&self, path: &[S]) -> Option<&ConfigNode> {
        self.root.pointer(path)
    }

    pub fn to_value(&self) -> Value {
        self.root.to_value()
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string(&self.root)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// Typed view of a root section
    pub fn section<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|node| node.view().ok())
    }

    /// Active theme color, or the schema default when absent
    pub fn theme_color(&self) -> &str {
        self.get("themeColor")
            .and_then(ConfigNode::as_str)
            .unwrap_or(DEFAULT_ACCENT)
    }

    /// Server-assigned timestamp of the last publish
    pub fn last_published(&self) -> Option<&str> {
        self.get("lastPublished").and_then(ConfigNode::as_str)
    }

    pub fn info_bar(&self) -> Option<InfoBar> {
        self.section("infoBar")
    }

    pub fn nav_bar(&self) -> Option<NavBar> {
        self.section("navBar")
    }

    pub fn footer_style(&self) -> Option<FooterStyle> {
        self.section("footerStyle")
    }

    /// Hero section of the home page
    pub fn home_hero(&self) -> Option<HeroSection> {
        self.pointer(&["pages", HOME_PAGE, "hero"])
            .and_then(|node| node.view().ok())
    }
}

impl Default for SiteConfiguration {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Serialize for SiteConfiguration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SiteConfiguration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let root = ConfigNode::deserialize(deserializer)?;
        Self::from_root(root).map_err(D::Error::custom)
    }
}
