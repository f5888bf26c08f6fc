use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::render::ZoomScale;

/// Settings applied when a theme is compiled.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleConfig {
    /// Display density ratio; every pixel size in the theme is multiplied by it.
    #[serde(default = "default_ratio")]
    pub ratio: f64,
    #[serde(default)]
    pub scale: ZoomScale,
    #[serde(default)]
    pub menu: MenuSelection,
}

fn default_ratio() -> f64 {
    1.0
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            ratio: default_ratio(),
            scale: ZoomScale::default(),
            menu: MenuSelection::default(),
        }
    }
}

impl StyleConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn with_scale(mut self, scale: ZoomScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.menu.layer = Some(layer.into());
        self
    }

    pub fn with_overlay(mut self, overlay: impl Into<String>, enabled: bool) -> Self {
        self.menu.overlays.insert(overlay.into(), enabled);
        self
    }
}

/// User choice in the theme's style menu.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MenuSelection {
    /// Selected layer; the menu's `defaultvalue` when unset.
    #[serde(default)]
    pub layer: Option<String>,
    /// Overlay toggles overriding the layers' `enabled` attribute.
    #[serde(default)]
    pub overlays: HashMap<String, bool>,
}
