//! Top-level style scope of the rendering surface.
//!
//! Some elements read colors from custom properties instead of the render
//! tree; the controller pushes those values here on every update.

use siteconf_schema::{sections::HOME_PAGE, SiteConfiguration};
use std::collections::BTreeMap;

pub const THEME_COLOR_PROPERTY: &str = "--theme-color";
pub const HERO_BADGE_COLOR_PROPERTY: &str = "--hero-badge-color";

pub trait StyleScope {
    fn set_property(&mut self, name: &str, value: &str);
}

/// Push the color properties for a configuration
pub fn apply_colors(scope: &mut dyn StyleScope, theme_color: &str, config: &SiteConfiguration) {
    scope.set_property(THEME_COLOR_PROPERTY, theme_color);

    let badge = config
        .pointer(&["pages", HOME_PAGE, "hero", "heroBadgeColor"])
        .and_then(|node| node.as_str());
    if let Some(badge) = badge {
        scope.set_property(HERO_BADGE_COLOR_PROPERTY, badge);
    }
}

/// In-memory property map, rendered as a `:root` rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootStyle {
    properties: BTreeMap<String, String>,
}

impl RootStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn to_css(&self) -> String {
        let body: String = self
            .properties
            .iter()
            .map(|(name, value)| format!("  {}: {};\n", name, value))
            .collect();
        format!(":root {{\n{}}}\n", body)
    }
}

impl StyleScope for RootStyle {
    fn set_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_colors() {
        let config = SiteConfiguration::from_value(json!({
            "pages": { "home": { "hero": { "heroBadgeColor": "#16a34a" } } }
        }))
        .unwrap();
        let mut style = RootStyle::new();

        apply_colors(&mut style, "#0ea5e9", &config);

        assert_eq!(style.get(THEME_COLOR_PROPERTY), Some("#0ea5e9"));
        assert_eq!(style.get(HERO_BADGE_COLOR_PROPERTY), Some("#16a34a"));
        assert_eq!(
            style.to_css(),
            ":root {\n  --hero-badge-color: #16a34a;\n  --theme-color: #0ea5e9;\n}\n"
        );
    }

    #[test]
    fn test_missing_badge_leaves_property_alone() {
        let mut style = RootStyle::new();
        style.set_property(HERO_BADGE_COLOR_PROPERTY, "#000000");

        apply_colors(&mut style, "#ffffff", &SiteConfiguration::from_value(json!({})).unwrap());
        assert_eq!(style.get(HERO_BADGE_COLOR_PROPERTY), Some("#000000"));
    }
}
