//! # Schema & Defaults
//!
//! Normalization boundary for every configuration that enters the system.
//!
//! [`resolve`] fills every field the schema knows about, at any depth, with
//! its default. It never fails:
//!
//! - a missing field becomes its default
//! - a field with the wrong JSON type becomes its default
//! - list elements are resolved against their item defaults
//! - `pages` entries are resolved against the page defaults
//! - unknown fields are kept as they are
//!
//! Resolution is idempotent: `resolve(resolve(x)) == resolve(x)`.

use crate::config::SiteConfiguration;
use crate::sections::{Link, Page, Review, Service, ServiceCategory, SiteSettings};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Resolution shape derived from the typed section defaults
#[derive(Debug)]
pub struct Schema {
    /// Full default document
    defaults: Value,

    /// Item defaults for list fields, keyed by field name
    list_items: HashMap<&'static str, Value>,

    /// Entry defaults for map fields, keyed by field name
    map_entries: HashMap<&'static str, Value>,
}

impl Schema {
    /// The site configuration schema
    pub fn site() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(Schema::build)
    }

    fn build() -> Self {
        let mut list_items = HashMap::new();
        list_items.insert("navLinks", to_value(Link::default()));
        list_items.insert("footerLinks", to_value(Link::default()));
        list_items.insert("serviceCategories", to_value(ServiceCategory::default()));
        list_items.insert("services", to_value(Service::default()));
        list_items.insert("reviews", to_value(Review::default()));

        let mut map_entries = HashMap::new();
        map_entries.insert("pages", to_value(Page::default()));

        Self {
            defaults: to_value(SiteSettings::default()),
            list_items,
            map_entries,
        }
    }

    /// Default document with every field present
    pub fn defaults(&self) -> &Value {
        &self.defaults
    }

    /// Resolve a partial configuration against this schema
    pub fn resolve(&self, partial: &Value) -> SiteConfiguration {
        let resolved = self.resolve_value(Some(partial), &self.defaults, None);
        SiteConfiguration::from_resolved(resolved)
    }

    fn resolve_value(&self, value: Option<&Value>, default: &Value, key: Option<&str>) -> Value {
        match default {
            Value::Object(fields) => {
                let Some(Value::Object(given)) = value else {
                    note_replaced(key, value);
                    return default.clone();
                };

                if let Some(entry_default) = key.and_then(|k| self.map_entries.get(k)) {
                    return Value::Object(self.resolve_map(given, fields, entry_default));
                }

                // Unknown fields pass through
                let mut out = given.clone();
                for (field, field_default) in fields {
                    let resolved = self.resolve_value(given.get(field), field_default, Some(field));
                    out.insert(field.clone(), resolved);
                }
                Value::Object(out)
            }

            Value::Array(_) => match value {
                Some(Value::Array(items)) => {
                    match key.and_then(|k| self.list_items.get(k)) {
                        Some(item_default) => Value::Array(
                            items
                                .iter()
                                .map(|item| self.resolve_value(Some(item), item_default, None))
                                .collect(),
                        ),
                        None => Value::Array(items.clone()),
                    }
                }
                _ => {
                    note_replaced(key, value);
                    default.clone()
                }
            },

            // Nullable field, anything goes
            Value::Null => value.cloned().unwrap_or(Value::Null),

            scalar => match value {
                Some(given) if same_kind(given, scalar) => given.clone(),
                _ => {
                    note_replaced(key, value);
                    scalar.clone()
                }
            },
        }
    }

    fn resolve_map(
        &self,
        given: &Map<String, Value>,
        defaults: &Map<String, Value>,
        entry_default: &Value,
    ) -> Map<String, Value> {
        let mut out = Map::new();

        for (name, default_entry) in defaults {
            if !given.contains_key(name) {
                out.insert(name.clone(), default_entry.clone());
            }
        }

        for (name, entry) in given {
            out.insert(name.clone(), self.resolve_value(Some(entry), entry_default, None));
        }

        out
    }
}

/// Resolve a partial configuration against the site schema
pub fn resolve(partial: &Value) -> SiteConfiguration {
    Schema::site().resolve(partial)
}

/// Resolve an in-memory configuration (e.g. one received from a patch or message)
pub fn resolve_config(config: &SiteConfiguration) -> SiteConfiguration {
    resolve(&config.to_value())
}

fn to_value<T: Serialize>(section: T) -> Value {
    // Section structs only hold strings, numbers, bools, lists and string-keyed maps
    serde_json::to_value(section).unwrap_or(Value::Null)
}

fn same_kind(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

fn note_replaced(key: Option<&str>, value: Option<&Value>) {
    if let Some(given) = value {
        tracing::debug!(
            field = key.unwrap_or("<item>"),
            given = %given,
            "Replacing malformed field with default"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_resolves_to_defaults() {
        let resolved = resolve(&json!({}));
        assert_eq!(&resolved.to_value(), Schema::site().defaults());
    }

    #[test]
    fn test_non_object_input_resolves_to_defaults() {
        for input in [json!(null), json!(42), json!("oops"), json!([1, 2])] {
            let resolved = resolve(&input);
            assert_eq!(&resolved.to_value(), Schema::site().defaults());
        }
    }

    #[test]
    fn test_wrong_type_field_becomes_default() {
        let resolved = resolve(&json!({ "themeColor": 12, "footerStyle": "red" }));
        assert_eq!(resolved.theme_color(), "#dc2626");
        assert_eq!(
            resolved.pointer(&["footerStyle", "titleColor"]).and_then(|n| n.as_str()),
            Some("#ffffff")
        );
    }

    #[test]
    fn test_list_items_get_item_defaults() {
        let resolved = resolve(&json!({ "footerLinks": [{ "label": "About" }, "junk"] }));
        let links = resolved.get("footerLinks").and_then(|n| n.as_array()).unwrap();

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].get("label").and_then(|n| n.as_str()), Some("About"));
        assert_eq!(links[0].get("path").and_then(|n| n.as_str()), Some("/"));
        assert_eq!(links[1].get("label").and_then(|n| n.as_str()), Some(""));
    }

    #[test]
    fn test_nested_service_lists_resolve() {
        let resolved = resolve(&json!({
            "pages": { "home": { "services": { "serviceCategories": [
                { "title": "Glass", "services": [{ "title": "Windshield" }] }
            ]}}}
        }));

        let service = resolved
            .pointer(&["pages", "home", "services", "serviceCategories", "0", "services", "0"])
            .unwrap();
        assert_eq!(service.get("title").and_then(|n| n.as_str()), Some("Windshield"));
        assert_eq!(service.get("icon").and_then(|n| n.as_str()), Some("wrench"));
    }

    #[test]
    fn test_extra_pages_resolve_against_page_defaults() {
        let resolved = resolve(&json!({ "pages": { "about": { "title": "About Us" } } }));

        assert!(resolved.pointer(&["pages", "home", "hero"]).is_some());
        assert_eq!(
            resolved.pointer(&["pages", "about", "title"]).and_then(|n| n.as_str()),
            Some("About Us")
        );
        assert!(resolved.pointer(&["pages", "about", "hero", "heroBadgeColor"]).is_some());
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let resolved = resolve(&json!({
            "experimentalBanner": { "text": "Hi" },
            "footerStyle": { "shadow": true }
        }));

        assert_eq!(
            resolved.pointer(&["experimentalBanner", "text"]).and_then(|n| n.as_str()),
            Some("Hi")
        );
        assert_eq!(
            resolved.pointer(&["footerStyle", "shadow"]).and_then(|n| n.as_bool()),
            Some(true)
        );
    }

    #[test]
    fn test_last_published_accepts_null_and_string() {
        assert!(resolve(&json!({})).last_published().is_none());
        let resolved = resolve(&json!({ "lastPublished": "2024-05-01T10:00:00Z" }));
        assert_eq!(resolved.last_published(), Some("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let inputs = [
            json!({}),
            json!({ "footerLinks": [{ "label": 3 }], "navBar": { "navLinks": "x" } }),
            json!({ "pages": { "home": null, "promo": { "cta": { "enabled": "yes" } } } }),
            json!({ "custom": [1, { "a": null }], "themeColor": "#000" }),
        ];

        for input in inputs {
            let once = resolve(&input);
            let twice = resolve(&once.to_value());
            assert_eq!(once, twice, "resolve not idempotent for {input}");
        }
    }
}
