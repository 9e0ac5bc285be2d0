//! # Configuration Sections
//!
//! Typed views of the site configuration. The `Default` impls here are the
//! only place default values are written down; [`crate::Schema`] derives the
//! resolution shape from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the page every site starts with
pub const HOME_PAGE: &str = "home";

/// Brand accent of a fresh site: theme, hero badge, service icons and the
/// call-to-action band
pub const DEFAULT_ACCENT: &str = "#dc2626";

/// Navigation or footer link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Link {
    pub label: String,
    pub path: String,
}

impl Link {
    pub fn new(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new("", "/")
    }
}

/// Thin bar above the navigation with contact details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InfoBar {
    pub enabled: bool,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub hours: String,
    pub background_color: String,
    pub text_color: String,
}

impl Default for InfoBar {
    fn default() -> Self {
        Self {
            enabled: true,
            phone: "(555) 123-4567".to_string(),
            email: "info@example-collision.com".to_string(),
            address: "123 Main Street, Springfield".to_string(),
            hours: "Mon-Fri 8am-6pm".to_string(),
            background_color: "#1f2937".to_string(),
            text_color: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavBar {
    pub logo_text: String,
    pub logo_image: String,
    pub nav_links: Vec<Link>,
    pub background_color: String,
    pub text_color: String,
    pub cta: Link,
}

impl Default for NavBar {
    fn default() -> Self {
        Self {
            logo_text: "Collision Pros".to_string(),
            logo_image: String::new(),
            nav_links: vec![
                Link::new("Home", "/"),
                Link::new("Services", "/services"),
                Link::new("Reviews", "/reviews"),
                Link::new("Contact", "/contact"),
            ],
            background_color: "#ffffff".to_string(),
            text_color: "#111827".to_string(),
            cta: Link::new("Get an Estimate", "/schedule"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FooterStyle {
    pub background_color: String,
    pub text_color: String,
    pub title_color: String,
    pub link_color: String,
}

impl Default for FooterStyle {
    fn default() -> Self {
        Self {
            background_color: "#111827".to_string(),
            text_color: "#d1d5db".to_string(),
            title_color: "#ffffff".to_string(),
            link_color: "#9ca3af".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeroSection {
    pub title: String,
    pub subtitle: String,
    pub badge_text: String,
    pub hero_badge_color: String,
    pub background_image: String,
    pub primary_cta: Link,
    pub secondary_cta: Link,
}

impl Default for HeroSection {
    fn default() -> Self {
        Self {
            title: "Expert Collision Repair".to_string(),
            subtitle: "Factory-quality repairs with a lifetime warranty".to_string(),
            badge_text: "Certified Repair Shop".to_string(),
            hero_badge_color: DEFAULT_ACCENT.to_string(),
            background_image: String::new(),
            primary_cta: Link::new("Schedule Service", "/schedule"),
            secondary_cta: Link::new("Our Services", "/services"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Service {
    pub title: String,
    pub description: String,
    pub icon: String,
}

impl Default for Service {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            icon: "wrench".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceCategory {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub icon_color: String,
    pub background_color: String,
    pub services: Vec<Service>,
}

impl Default for ServiceCategory {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            icon: "car".to_string(),
            icon_color: DEFAULT_ACCENT.to_string(),
            background_color: "#ffffff".to_string(),
            services: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServicesSection {
    pub enabled: bool,
    pub title: String,
    pub subtitle: String,
    pub service_categories: Vec<ServiceCategory>,
}

impl Default for ServicesSection {
    fn default() -> Self {
        let service = |title: &str, description: &str| Service {
            title: title.to_string(),
            description: description.to_string(),
            ..Service::default()
        };

        Self {
            enabled: true,
            title: "Our Services".to_string(),
            subtitle: "Everything your vehicle needs after an accident".to_string(),
            service_categories: vec![
                ServiceCategory {
                    title: "Collision Repair".to_string(),
                    description: "Structural and body repairs".to_string(),
                    services: vec![
                        service("Frame Straightening", "Computerized frame measuring"),
                        service("Dent Repair", "Paintless and conventional dent removal"),
                    ],
                    ..ServiceCategory::default()
                },
                ServiceCategory {
                    title: "Paint & Refinish".to_string(),
                    description: "Color-matched factory finishes".to_string(),
                    icon: "spray-can".to_string(),
                    services: vec![service("Full Repaint", "Complete color change or refresh")],
                    ..ServiceCategory::default()
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Review {
    pub author: String,
    pub rating: f64,
    pub text: String,
    pub source: String,
}

impl Default for Review {
    fn default() -> Self {
        Self {
            author: String::new(),
            rating: 5.0,
            text: String::new(),
            source: "Google".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewsSection {
    pub enabled: bool,
    pub title: String,
    pub reviews: Vec<Review>,
}

impl Default for ReviewsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "What Our Customers Say".to_string(),
            reviews: vec![Review {
                author: "Jordan P.".to_string(),
                text: "My car looks better than before the accident.".to_string(),
                ..Review::default()
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleSection {
    pub enabled: bool,
    pub title: String,
    pub subtitle: String,
    pub booking_label: String,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "Schedule an Estimate".to_string(),
            subtitle: "Pick a time that works for you".to_string(),
            booking_label: "Book Now".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactSection {
    pub enabled: bool,
    pub title: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub map_embed_url: String,
}

impl Default for ContactSection {
    fn default() -> Self {
        let info = InfoBar::default();
        Self {
            enabled: true,
            title: "Contact Us".to_string(),
            phone: info.phone,
            email: info.email,
            address: info.address,
            map_embed_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CtaSection {
    pub enabled: bool,
    pub title: String,
    pub subtitle: String,
    pub button: Link,
    pub background_color: String,
}

impl Default for CtaSection {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "Ready to get back on the road?".to_string(),
            subtitle: "Free estimates, insurance claims handled".to_string(),
            button: Link::new("Get Started", "/schedule"),
            background_color: DEFAULT_ACCENT.to_string(),
        }
    }
}

/// One page of the public site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Page {
    pub title: String,
    pub hero: HeroSection,
    pub services: ServicesSection,
    pub reviews: ReviewsSection,
    pub schedule: ScheduleSection,
    pub contact: ContactSection,
    pub cta: CtaSection,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            title: "Home".to_string(),
            hero: HeroSection::default(),
            services: ServicesSection::default(),
            reviews: ReviewsSection::default(),
            schedule: ScheduleSection::default(),
            contact: ContactSection::default(),
            cta: CtaSection::default(),
        }
    }
}

/// Root of the site configuration with every documented field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteSettings {
    pub theme_color: String,
    pub site_name: String,
    pub info_bar: InfoBar,
    pub nav_bar: NavBar,
    pub footer_company_name: String,
    pub footer_description: String,
    pub footer_links: Vec<Link>,
    pub footer_style: FooterStyle,
    pub pages: BTreeMap<String, Page>,
    pub last_published: Option<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        let mut pages = BTreeMap::new();
        pages.insert(HOME_PAGE.to_string(), Page::default());

        Self {
            theme_color: DEFAULT_ACCENT.to_string(),
            site_name: "Collision Pros Auto Body".to_string(),
            info_bar: InfoBar::default(),
            nav_bar: NavBar::default(),
            footer_company_name: "Collision Pros".to_string(),
            footer_description: "Family-owned collision repair since 1998.".to_string(),
            footer_links: vec![
                Link::new("Services", "/services"),
                Link::new("Contact", "/contact"),
            ],
            footer_style: FooterStyle::default(),
            pages,
            last_published: None,
        }
    }
}
