//! Tenant branding: colors, logos, fonts, and the optional theme document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandingContext {
    pub settings: Option<BrandingSettings>,
    pub themes: Option<BrandingThemes>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandingSettings {
    pub colors: Option<BrandingColors>,
    pub favicon_url: Option<String>,
    pub logo_url: Option<String>,
    pub font: Option<BrandingFont>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandingColors {
    pub primary: Option<String>,
    /// Either a flat color string or a gradient object; kept raw.
    pub page_background: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandingFont {
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandingThemes {
    pub default: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized view over [`BrandingContext`].
#[derive(Debug, Clone, Default)]
pub struct Branding {
    raw: BrandingContext,
}

impl Branding {
    pub fn new(raw: Option<BrandingContext>) -> Self {
        Self {
            raw: raw.unwrap_or_default(),
        }
    }

    pub fn settings(&self) -> Option<&BrandingSettings> {
        self.raw.settings.as_ref()
    }

    pub fn themes(&self) -> Option<&BrandingThemes> {
        self.raw.themes.as_ref()
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.raw.settings.as_ref()?.logo_url.as_deref()
    }

    pub fn favicon_url(&self) -> Option<&str> {
        self.raw.settings.as_ref()?.favicon_url.as_deref()
    }

    pub fn primary_color(&self) -> Option<&str> {
        self.raw
            .settings
            .as_ref()?
            .colors
            .as_ref()?
            .primary
            .as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_slice_yields_empty_view() {
        let branding = Branding::new(None);
        assert!(branding.settings().is_none());
        assert!(branding.logo_url().is_none());
        assert!(branding.primary_color().is_none());
    }

    #[test]
    fn nested_accessors_reach_through() {
        let raw: BrandingContext = serde_json::from_value(json!({
            "settings": {
                "colors": { "primary": "#635dff", "page_background": "#000" },
                "logo_url": "https://cdn.example.com/logo.svg"
            }
        }))
        .unwrap();
        let branding = Branding::new(Some(raw));

        assert_eq!(branding.primary_color(), Some("#635dff"));
        assert_eq!(branding.logo_url(), Some("https://cdn.example.com/logo.svg"));
        assert!(branding.favicon_url().is_none());
    }
}
