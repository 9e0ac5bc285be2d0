//! Default-fill behavior of the site schema

use serde_json::{json, Value};
use siteconf_schema::{resolve, Schema, SiteConfiguration};

/// Assert every key of `shape` exists in `value` (objects only, lists skipped)
fn assert_has_all_fields(shape: &Value, value: &Value, path: &str) {
    if let (Value::Object(fields), Some(given)) = (shape, value.as_object()) {
        for (key, field_shape) in fields {
            let child = given
                .get(key)
                .unwrap_or_else(|| panic!("missing field {path}.{key}"));
            assert_has_all_fields(field_shape, child, &format!("{path}.{key}"));
        }
    } else if shape.is_object() {
        panic!("expected object at {path}, got {value}");
    }
}

#[test]
fn test_every_field_present_after_resolve() {
    let inputs = [
        json!({}),
        json!({ "infoBar": { "phone": "1" } }),
        json!({ "navBar": 7, "footerStyle": [] }),
        json!({ "pages": { "home": { "hero": "broken" } } }),
    ];

    for input in inputs {
        let resolved = resolve(&input).to_value();
        assert_has_all_fields(Schema::site().defaults(), &resolved, "$");
    }
}

#[test]
fn test_resolve_keeps_given_values() {
    let resolved = resolve(&json!({
        "themeColor": "#0ea5e9",
        "footerStyle": { "titleColor": "#112233" },
        "footerLinks": []
    }));

    assert_eq!(resolved.theme_color(), "#0ea5e9");
    let style = resolved.footer_style().unwrap();
    assert_eq!(style.title_color, "#112233");
    assert_eq!(style.background_color, "#111827");
    assert_eq!(resolved.get("footerLinks").and_then(|n| n.as_array()).map(|a| a.len()), Some(0));
}

#[test]
fn test_old_persisted_config_loads_against_current_schema() {
    // Shape written before `footerStyle` and `pages` existed
    let legacy = r##"{ "themeColor": "#222222", "footerLinks": [{ "label": "Old", "path": "/old" }] }"##;
    let value: Value = serde_json::from_str(legacy).unwrap();

    let resolved = resolve(&value);
    assert_eq!(resolved.theme_color(), "#222222");
    assert!(resolved.footer_style().is_some());
    assert!(resolved.home_hero().is_some());
}

#[test]
fn test_resolve_of_defaults_is_identity() {
    let defaults = SiteConfiguration::defaults();
    assert_eq!(resolve(&defaults.to_value()), defaults);
}
