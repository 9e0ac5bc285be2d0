//! # Configuration Tree
//!
//! Immutable JSON-shaped tree used for every in-memory copy of the site
//! configuration.
//!
//! Object and array children live behind `Arc`, so cloning a tree is cheap
//! and two trees can share untouched branches. Consumers that want to skip
//! work for unchanged sections compare branches with [`ConfigNode::ptr_eq`].
//!
//! ```text
//! root ──┬── footerStyle (Arc) ── shared with previous version
//!        └── footerLinks (Arc) ── replaced by the last patch
//! ```

use crate::error::SchemaError;
use serde::de::DeserializeOwned;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Children of an object node
pub type ObjectMap = BTreeMap<String, ConfigNode>;

/// A node of the configuration tree
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Arc<Vec<ConfigNode>>),
    Object(Arc<ObjectMap>),
}

impl ConfigNode {
    /// Create an empty object node
    pub fn empty_object() -> Self {
        ConfigNode::Object(Arc::new(ObjectMap::new()))
    }

    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            ConfigNode::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ConfigNode]> {
        match self {
            ConfigNode::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigNode::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigNode::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigNode::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, ConfigNode::Object(_))
    }

    /// Look up a direct child.
    ///
    /// Objects are indexed by key, arrays by a decimal index.
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        match self {
            ConfigNode::Object(map) => map.get(key),
            ConfigNode::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Walk a path of keys from this node
    pub fn pointer<S: AsRef<str>>(&self, path: &[S]) -> Option<&ConfigNode> {
        path.iter()
            .try_fold(self, |node, key| node.get(key.as_ref()))
    }

    /// Reference identity for containers, value equality for scalars.
    pub fn ptr_eq(a: &ConfigNode, b: &ConfigNode) -> bool {
        match (a, b) {
            (ConfigNode::Object(x), ConfigNode::Object(y)) => Arc::ptr_eq(x, y),
            (ConfigNode::Array(x), ConfigNode::Array(y)) => Arc::ptr_eq(x, y),
            (ConfigNode::Object(_), _) | (ConfigNode::Array(_), _) => false,
            (x, y) => x == y,
        }
    }

    /// Convert into a `serde_json::Value` (deep copy)
    pub fn to_value(&self) -> Value {
        Value::from(self)
    }

    /// Deserialize a typed view of this subtree
    pub fn view<T: DeserializeOwned>(&self) -> Result<T, SchemaError> {
        Ok(serde_json::from_value(self.to_value())?)
    }
}

impl From<Value> for ConfigNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ConfigNode::Null,
            Value::Bool(b) => ConfigNode::Bool(b),
            Value::Number(n) => ConfigNode::Number(n),
            Value::String(s) => ConfigNode::String(s),
            Value::Array(items) => {
                ConfigNode::Array(Arc::new(items.into_iter().map(ConfigNode::from).collect()))
            }
            Value::Object(map) => ConfigNode::Object(Arc::new(
                map.into_iter()
                    .map(|(k, v)| (k, ConfigNode::from(v)))
                    .collect(),
            )),
        }
    }
}

impl From<&ConfigNode> for Value {
    fn from(node: &ConfigNode) -> Self {
        match node {
            ConfigNode::Null => Value::Null,
            ConfigNode::Bool(b) => Value::Bool(*b),
            ConfigNode::Number(n) => Value::Number(n.clone()),
            ConfigNode::String(s) => Value::String(s.clone()),
            ConfigNode::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            ConfigNode::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ConfigNode {
    fn from(s: &str) -> Self {
        ConfigNode::String(s.to_string())
    }
}

impl From<bool> for ConfigNode {
    fn from(b: bool) -> Self {
        ConfigNode::Bool(b)
    }
}

impl Serialize for ConfigNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigNode::Null => serializer.serialize_unit(),
            ConfigNode::Bool(b) => serializer.serialize_bool(*b),
            ConfigNode::Number(n) => n.serialize(serializer),
            ConfigNode::String(s) => serializer.serialize_str(s),
            ConfigNode::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ConfigNode::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ConfigNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ConfigNode::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_conversion_preserves_shape() {
        let value = json!({
            "footerLinks": [{ "label": "About", "path": "/about" }],
            "footerStyle": { "titleColor": "#fff" },
            "rating": 4.5,
            "enabled": true,
            "lastPublished": null
        });

        let node = ConfigNode::from(value.clone());
        assert_eq!(node.to_value(), value);
    }

    #[test]
    fn test_pointer_walks_objects_and_arrays() {
        let node = ConfigNode::from(json!({
            "footerLinks": [{ "label": "About" }, { "label": "Careers" }]
        }));

        let label = node.pointer(&["footerLinks", "1", "label"]);
        assert_eq!(label.and_then(|n| n.as_str()), Some("Careers"));
        assert!(node.pointer(&["footerLinks", "7"]).is_none());
    }

    #[test]
    fn test_clone_shares_children() {
        let node = ConfigNode::from(json!({ "footerStyle": { "titleColor": "#fff" } }));
        let copy = node.clone();

        assert!(ConfigNode::ptr_eq(&node, &copy));
        assert!(ConfigNode::ptr_eq(
            node.get("footerStyle").unwrap(),
            copy.get("footerStyle").unwrap()
        ));
    }

    #[test]
    fn test_serialize_matches_json() {
        let node = ConfigNode::from(json!({ "b": [1, 2], "a": "x" }));
        let text = serde_json::to_string(&node).unwrap();
        assert_eq!(text, r#"{"a":"x","b":[1,2]}"#);

        let back: ConfigNode = serde_json::from_str(&text).unwrap();
        assert_eq!(back, node);
    }
}
