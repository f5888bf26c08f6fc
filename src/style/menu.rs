//! Style menu: user selectable layers enabling rule categories.

use std::collections::HashSet;

use crate::config::MenuSelection;
use crate::theme::Element;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layer {
    pub id: String,
    pub parent: Option<String>,
    pub enabled: bool,
    pub categories: Vec<String>,
    pub overlays: Vec<String>,
}

impl Layer {
    fn from_element(element: &Element) -> Option<Self> {
        let id = element.get("id")?.to_string();
        let mut layer = Layer {
            id,
            parent: element.get("parent").map(str::to_string),
            enabled: element.get("enabled") == Some("true"),
            ..Default::default()
        };

        for child in &element.children {
            match (child.name.as_str(), child.get("id")) {
                ("cat", Some(id)) => layer.categories.push(id.to_string()),
                ("overlay", Some(id)) => layer.overlays.push(id.to_string()),
                _ => {}
            }
        }
        Some(layer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    pub default_layer: Option<String>,
    pub layers: Vec<Layer>,
}

impl Menu {
    /// Build from a `stylemenu` element. Layers without an id are ignored.
    pub fn from_element(element: &Element) -> Self {
        Menu {
            default_layer: element.get("defaultvalue").map(str::to_string),
            layers: element
                .children
                .iter()
                .filter(|child| child.name == "layer")
                .filter_map(Layer::from_element)
                .collect(),
        }
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Categories enabled by `selection`.
    ///
    /// The selected layer contributes its own and its ancestors' categories,
    /// as does each of its overlays that is enabled.
    pub fn categories(&self, selection: &MenuSelection) -> HashSet<String> {
        let mut categories = HashSet::new();

        let Some(id) = selection.layer.as_ref().or(self.default_layer.as_ref()) else {
            return categories;
        };
        let Some(layer) = self.layer(id) else {
            tracing::warn!("Style: menu layer '{}' not found", id);
            return categories;
        };

        self.add_categories(layer, &mut categories);
        for overlay_id in &layer.overlays {
            let Some(overlay) = self.layer(overlay_id) else {
                continue;
            };
            let enabled = selection
                .overlays
                .get(overlay_id)
                .copied()
                .unwrap_or(overlay.enabled);
            if enabled {
                self.add_categories(overlay, &mut categories);
            }
        }

        categories
    }

    fn add_categories(&self, layer: &Layer, categories: &mut HashSet<String>) {
        let mut visited = HashSet::new();
        let mut current = Some(layer);

        while let Some(layer) = current {
            if !visited.insert(layer.id.as_str()) {
                tracing::warn!("Style: menu layer '{}' has a cyclic parent chain", layer.id);
                break;
            }
            categories.extend(layer.categories.iter().cloned());
            current = layer.parent.as_deref().and_then(|parent| self.layer(parent));
        }
    }
}
