//! # Config Patches
//!
//! The only mutation primitive for the site configuration.
//!
//! ## Semantics
//!
//! ### Set
//! - Replaces one root key with a new value
//! - Used for collection edits: add/remove a link replaces the whole list
//!
//! ### SetPath
//! - Replaces the leaf at `path`
//! - Every ancestor along the path is shallow-copied; untouched siblings
//!   keep their reference identity
//! - Missing (or scalar) intermediates become empty objects
//! - Numeric segments index into arrays; an index past the end is an error
//!
//! Patches never mutate their input and never replace the whole tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use siteconf_schema::{ConfigNode, SiteConfiguration};
use std::sync::Arc;
use thiserror::Error;

/// Partial update produced by a form component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ConfigPatch {
    /// Replace a root key
    Set { key: String, value: Value },

    /// Replace the value at a nested path
    SetPath { path: Vec<String>, value: Value },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    #[error("Patch path is empty")]
    EmptyPath,

    #[error("Index {index} out of bounds (len {len}) at '{path}'")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("'{segment}' is not an array index at '{path}'")]
    InvalidIndex { path: String, segment: String },
}

impl ConfigPatch {
    pub fn set(key: impl Into<String>, value: Value) -> Self {
        ConfigPatch::Set {
            key: key.into(),
            value,
        }
    }

    pub fn set_path<I, S>(path: I, value: Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ConfigPatch::SetPath {
            path: path.into_iter().map(Into::into).collect(),
            value,
        }
    }

    /// Build a patch from a dotted path (`footerStyle.titleColor`).
    ///
    /// A single segment yields a flat `Set`.
    pub fn from_dotted(path: &str, value: Value) -> Self {
        let segments: Vec<String> = path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        match segments.as_slice() {
            [key] => ConfigPatch::set(key.clone(), value),
            _ => ConfigPatch::SetPath {
                path: segments,
                value,
            },
        }
    }

    /// Root key the patch touches
    pub fn root_key(&self) -> Option<&str> {
        match self {
            ConfigPatch::Set { key, .. } => Some(key.as_str()).filter(|k| !k.is_empty()),
            ConfigPatch::SetPath { path, .. } => path.first().map(String::as_str),
        }
    }

    /// Dotted target, for events and logs
    pub fn target(&self) -> String {
        match self {
            ConfigPatch::Set { key, .. } => key.clone(),
            ConfigPatch::SetPath { path, .. } => path.join("."),
        }
    }

    /// Last path segment
    pub fn leaf_key(&self) -> Option<&str> {
        match self {
            ConfigPatch::Set { key, .. } => Some(key.as_str()),
            ConfigPatch::SetPath { path, .. } => path.last().map(String::as_str),
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            ConfigPatch::Set { value, .. } | ConfigPatch::SetPath { value, .. } => value,
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, ConfigPatch::Set { .. })
    }
}

/// Apply a patch, returning a new configuration
pub fn apply_patch(
    config: &SiteConfiguration,
    patch: &ConfigPatch,
) -> Result<SiteConfiguration, PatchError> {
    let path: &[String] = match patch {
        ConfigPatch::Set { key, .. } if key.is_empty() => return Err(PatchError::EmptyPath),
        ConfigPatch::Set { key, .. } => std::slice::from_ref(key),
        ConfigPatch::SetPath { path, .. } => path,
    };

    if path.is_empty() {
        return Err(PatchError::EmptyPath);
    }

    let value = ConfigNode::from(patch.value().clone());
    let root = set_in(config.root(), path, 0, value)?;

    // set_in on an object root always yields an object
    Ok(SiteConfiguration::from_root(root).unwrap_or_else(|_| config.clone()))
}

/// Apply patches in order
pub fn apply_patches<'a, I>(config: &SiteConfiguration, patches: I) -> Result<SiteConfiguration, PatchError>
where
    I: IntoIterator<Item = &'a ConfigPatch>,
{
    patches
        .into_iter()
        .try_fold(config.clone(), |current, patch| apply_patch(&current, patch))
}

fn set_in(
    node: &ConfigNode,
    path: &[String],
    depth: usize,
    value: ConfigNode,
) -> Result<ConfigNode, PatchError> {
    let Some(head) = path.get(depth) else {
        return Ok(value);
    };
    let is_leaf = depth + 1 == path.len();

    match node {
        ConfigNode::Object(map) => {
            let child = if is_leaf {
                value
            } else {
                let current = map.get(head).cloned().unwrap_or_else(ConfigNode::empty_object);
                set_in(&current, path, depth + 1, value)?
            };

            let mut map = Arc::clone(map);
            Arc::make_mut(&mut map).insert(head.clone(), child);
            Ok(ConfigNode::Object(map))
        }

        ConfigNode::Array(items) => {
            let location = || path[..=depth].join(".");
            let index = head.parse::<usize>().map_err(|_| PatchError::InvalidIndex {
                path: location(),
                segment: head.clone(),
            })?;

            if index >= items.len() {
                return Err(PatchError::IndexOutOfBounds {
                    path: location(),
                    index,
                    len: items.len(),
                });
            }

            let child = if is_leaf {
                value
            } else {
                set_in(&items[index], path, depth + 1, value)?
            };

            let mut items = Arc::clone(items);
            Arc::make_mut(&mut items)[index] = child;
            Ok(ConfigNode::Array(items))
        }

        // Missing or scalar intermediate: descend into a fresh object
        _ => set_in(&ConfigNode::empty_object(), path, depth, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> SiteConfiguration {
        SiteConfiguration::from_value(value).unwrap()
    }

    #[test]
    fn test_flat_patch_replaces_root_key() {
        let base = config(json!({ "themeColor": "#000", "siteName": "A" }));
        let next = apply_patch(&base, &ConfigPatch::set("themeColor", json!("#fff"))).unwrap();

        assert_eq!(next.to_value(), json!({ "themeColor": "#fff", "siteName": "A" }));
        assert_eq!(base.to_value(), json!({ "themeColor": "#000", "siteName": "A" }));
    }

    #[test]
    fn test_deep_patch_replaces_leaf_only() {
        let base = config(json!({
            "footerStyle": { "titleColor": "#fff", "textColor": "#ccc" }
        }));
        let patch = ConfigPatch::set_path(["footerStyle", "titleColor"], json!("#112233"));
        let next = apply_patch(&base, &patch).unwrap();

        assert_eq!(
            next.to_value(),
            json!({ "footerStyle": { "titleColor": "#112233", "textColor": "#ccc" } })
        );
    }

    #[test]
    fn test_deep_patch_creates_missing_intermediates() {
        let base = config(json!({ "pages": "legacy-string" }));
        let patch = ConfigPatch::set_path(["pages", "home", "hero", "title"], json!("Hi"));
        let next = apply_patch(&base, &patch).unwrap();

        assert_eq!(
            next.to_value(),
            json!({ "pages": { "home": { "hero": { "title": "Hi" } } } })
        );
    }

    #[test]
    fn test_deep_patch_indexes_arrays() {
        let base = config(json!({
            "footerLinks": [{ "label": "A", "path": "/a" }, { "label": "B", "path": "/b" }]
        }));
        let patch = ConfigPatch::set_path(["footerLinks", "1", "label"], json!("Bee"));
        let next = apply_patch(&base, &patch).unwrap();

        assert_eq!(next.pointer(&["footerLinks", "1", "label"]).and_then(|n| n.as_str()), Some("Bee"));
        assert!(ConfigNode::ptr_eq(
            base.pointer(&["footerLinks", "0"]).unwrap(),
            next.pointer(&["footerLinks", "0"]).unwrap()
        ));
    }

    #[test]
    fn test_array_index_past_end_is_rejected() {
        let base = config(json!({ "footerLinks": [] }));
        let patch = ConfigPatch::set_path(["footerLinks", "0", "label"], json!("X"));

        assert!(matches!(
            apply_patch(&base, &patch),
            Err(PatchError::IndexOutOfBounds { index: 0, len: 0, .. })
        ));

        let patch = ConfigPatch::set_path(["footerLinks", "first"], json!("X"));
        assert!(matches!(apply_patch(&base, &patch), Err(PatchError::InvalidIndex { .. })));
    }

    #[test]
    fn test_empty_paths_are_rejected() {
        let base = config(json!({}));
        assert_eq!(apply_patch(&base, &ConfigPatch::set("", json!(1))), Err(PatchError::EmptyPath));
        assert_eq!(
            apply_patch(&base, &ConfigPatch::set_path(Vec::<String>::new(), json!({}))),
            Err(PatchError::EmptyPath)
        );
    }

    #[test]
    fn test_from_dotted() {
        assert_eq!(
            ConfigPatch::from_dotted("themeColor", json!("#fff")),
            ConfigPatch::set("themeColor", json!("#fff"))
        );
        assert_eq!(
            ConfigPatch::from_dotted("footerStyle.titleColor", json!("#fff")),
            ConfigPatch::set_path(["footerStyle", "titleColor"], json!("#fff"))
        );
    }

    #[test]
    fn test_patch_wire_format() {
        let patch: ConfigPatch = serde_json::from_value(json!({
            "op": "setPath",
            "path": ["infoBar", "backgroundColor"],
            "value": "#000"
        }))
        .unwrap();

        assert_eq!(patch.root_key(), Some("infoBar"));
        assert_eq!(patch.target(), "infoBar.backgroundColor");
        assert!(!patch.is_flat());
    }
}
