//! Theme document to instruction compiler.

use serde::Serialize;
use std::collections::HashSet;

use super::arena::{Arena, Handle};
use super::menu::Menu;
use crate::config::StyleConfig;
use crate::error::{Result, StyleError};
use crate::render::{
    Brush, CircleRender, Icon, PathRender, Render, RenderKind, Symbol, TextRender,
};
use crate::resources::ResourceResolver;
use crate::rules::{Closed, Constraints, ElementType, Filter, MAX_ZOOM, Rule};
use crate::tags::TagDictionary;
use crate::theme::{Element, values};

/// Counters describing a finished load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub paths: usize,
    pub circles: usize,
    pub path_labels: usize,
    pub point_labels: usize,
    pub area_labels: usize,
    pub symbols: usize,
    /// Rule subtrees dropped because their category is disabled.
    pub pruned_rules: usize,
    /// Images that could not be resolved.
    pub missing_resources: usize,
    /// Instructions dropped for other reasons (e.g. a label key absent from the map data).
    pub skipped: usize,
}

/// Output of one successful compilation.
#[derive(Debug, Default)]
pub(crate) struct Compiled {
    pub(crate) arena: Arena,
    pub(crate) paths: Vec<Handle>,
    pub(crate) circles: Vec<Handle>,
    pub(crate) path_labels: Vec<Handle>,
    pub(crate) point_labels: Vec<Handle>,
    pub(crate) area_labels: Vec<Handle>,
    pub(crate) symbols: Vec<Handle>,
}

impl Compiled {
    pub(crate) fn empty(generation: u64) -> Self {
        Self {
            arena: Arena::new(generation),
            ..Default::default()
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    /// Order every list by z-order or priority, keeping document order for ties.
    fn sort(&mut self) {
        let arena = &self.arena;
        for list in [
            &mut self.paths,
            &mut self.circles,
            &mut self.path_labels,
            &mut self.point_labels,
            &mut self.area_labels,
            &mut self.symbols,
        ] {
            list.sort_by_key(|handle| arena.get(*handle).map_or(i64::MAX, Render::order));
        }
    }
}

/// Where a compiled text instruction goes.
#[derive(Debug, Clone, Copy)]
enum LabelTarget {
    Path,
    Caption,
}

pub(crate) struct Compiler<'a> {
    dictionary: &'a dyn TagDictionary,
    resources: &'a dyn ResourceResolver,
    config: &'a StyleConfig,
    categories: Option<HashSet<String>>,
    output: Compiled,
    report: LoadReport,
    next_z: u32,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(
        dictionary: &'a dyn TagDictionary,
        resources: &'a dyn ResourceResolver,
        config: &'a StyleConfig,
        generation: u64,
    ) -> Self {
        Self {
            dictionary,
            resources,
            config,
            categories: None,
            output: Compiled::empty(generation),
            report: LoadReport::default(),
            next_z: 0,
        }
    }

    pub(crate) fn compile(mut self, root: &Element) -> Result<(Compiled, LoadReport)> {
        if root.name != "rendertheme" {
            return Err(StyleError::UnexpectedRoot(root.name.clone()));
        }

        // The menu gates rules wherever it appears in the document.
        if let Some(menu) = root.children.iter().find(|child| child.name == "stylemenu") {
            let menu = Menu::from_element(menu);
            let categories = menu.categories(&self.config.menu);
            tracing::debug!("Style: {} categories enabled by menu", categories.len());
            self.categories = Some(categories);
        }

        let base = Rule::new();
        for child in &root.children {
            match child.name.as_str() {
                "rule" => self.rule(child, &base),
                "stylemenu" => {}
                other => tracing::debug!("Style: ignoring <{}> in <rendertheme>", other),
            }
        }

        self.output.sort();
        let report = LoadReport {
            paths: self.output.paths.len(),
            circles: self.output.circles.len(),
            path_labels: self.output.path_labels.len(),
            point_labels: self.output.point_labels.len(),
            area_labels: self.output.area_labels.len(),
            symbols: self.output.symbols.len(),
            ..self.report
        };
        Ok((self.output, report))
    }

    /// Rules without a category are always compiled. Without a menu no
    /// category is enabled.
    fn enabled(&self, element: &Element) -> bool {
        match element.get("cat") {
            Some(cat) => self
                .categories
                .as_ref()
                .is_some_and(|categories| categories.contains(cat)),
            None => true,
        }
    }

    fn rule(&mut self, element: &Element, parent: &Rule) {
        if !self.enabled(element) {
            tracing::debug!(
                "Style: skipping rule of disabled category '{}'",
                element.get("cat").unwrap_or_default()
            );
            self.report.pruned_rules += 1;
            return;
        }

        let filter = (element.has("k") || element.has("v")).then(|| {
            Filter::parse(
                self.dictionary,
                element.get("k").unwrap_or("*"),
                element.get("v").unwrap_or("*"),
            )
        });
        let constraints = Constraints {
            element: attribute(element, "e", ElementType::parse),
            closed: attribute(element, "closed", Closed::parse),
            min_zoom: attribute(element, "zoom-min", |v| values::parse_zoom(v, MAX_ZOOM)),
            max_zoom: attribute(element, "zoom-max", |v| values::parse_zoom(v, MAX_ZOOM)),
            filter,
        };
        let rule = parent.refine(&constraints);

        for child in &element.children {
            match child.name.as_str() {
                "rule" => self.rule(child, &rule),
                "area" => self.area(child, &rule),
                "line" => self.line(child, &rule),
                "circle" => self.circle(child, &rule),
                "pathText" => self.text(child, &rule, LabelTarget::Path),
                "caption" => self.text(child, &rule, LabelTarget::Caption),
                "symbol" => self.symbol(child, &rule),
                other => tracing::debug!("Style: ignoring <{}> in <rule>", other),
            }
        }
    }

    fn z_order(&mut self) -> u32 {
        let z = self.next_z;
        self.next_z += 1;
        z
    }

    fn px(&self, element: &Element, name: &str) -> Option<f64> {
        attribute(element, name, values::parse_f64).map(|v| v * self.config.ratio)
    }

    fn area(&mut self, element: &Element, rule: &Rule) {
        let mut path = PathRender::new(self.z_order(), self.config.scale);
        path.area = true;

        if let Some(fill) = attribute(element, "fill", values::parse_color) {
            path.brush = Brush::Solid(fill);
        }
        path.stroke_color = attribute(element, "stroke", values::parse_color);
        if let Some(width) = self.px(element, "stroke-width") {
            path.stroke_width = width;
        }
        if let Some(scale) = attribute(element, "scale", values::parse_scale) {
            path.scale = scale;
        }
        if element.has("src") {
            match self.icon(element) {
                Some(icon) => path.brush = Brush::Pattern(icon),
                None => {
                    tracing::warn!(
                        "Style: area pattern '{}' not found, using fill color",
                        element.get("src").unwrap_or_default()
                    );
                    self.report.missing_resources += 1;
                }
            }
        }

        let handle = self.push(rule, RenderKind::Path(path));
        self.output.paths.push(handle);
    }

    fn line(&mut self, element: &Element, rule: &Rule) {
        let mut path = PathRender::new(self.z_order(), self.config.scale);

        path.stroke_color = attribute(element, "stroke", values::parse_color);
        if let Some(width) = self.px(element, "stroke-width") {
            path.stroke_width = width;
        }
        if let Some(dash) = attribute(element, "stroke-dasharray", values::parse_lengths) {
            path.dash = dash.into_iter().map(|d| d * self.config.ratio).collect();
        }
        if let Some(cap) = attribute(element, "stroke-linecap", values::parse_cap) {
            path.cap = cap;
        }
        if let Some(join) = attribute(element, "stroke-linejoin", values::parse_join) {
            path.join = join;
        }
        path.curve = element.get("curve") == Some("cubic");
        if let Some(scale) = attribute(element, "scale", values::parse_scale) {
            path.scale = scale;
        }
        if let Some(dy) = self.px(element, "dy") {
            path.dy = dy;
        }

        let handle = self.push(rule, RenderKind::Path(path));
        self.output.paths.push(handle);
    }

    fn circle(&mut self, element: &Element, rule: &Rule) {
        let mut circle = CircleRender::new(self.z_order(), self.config.scale);

        circle.fill = attribute(element, "fill", values::parse_color);
        circle.stroke_color = attribute(element, "stroke", values::parse_color);
        if let Some(width) = self.px(element, "stroke-width") {
            circle.stroke_width = width;
        }
        if let Some(radius) = self.px(element, "radius").or_else(|| self.px(element, "r")) {
            circle.radius = radius;
        }
        if let Some(scale) = attribute(element, "scale-radius", values::parse_bool) {
            circle.scale = scale;
        }

        let handle = self.push(rule, RenderKind::Circle(circle));
        self.output.circles.push(handle);
    }

    fn text(&mut self, element: &Element, rule: &Rule, target: LabelTarget) {
        let Some(key) = element.get("k").and_then(|k| self.dictionary.key_id(k)) else {
            tracing::debug!(
                "Style: skipping <{}> with key '{}' unknown to map data",
                element.name,
                element.get("k").unwrap_or_default()
            );
            self.report.skipped += 1;
            return;
        };

        let mut text = TextRender::new(key);
        if let Some(priority) = attribute(element, "priority", values::parse_i32) {
            text.priority = priority;
        }
        if let Some(fill) = attribute(element, "fill", values::parse_color) {
            text.fill = fill;
        }
        if let Some(stroke) = attribute(element, "stroke", values::parse_color) {
            text.stroke = stroke;
        }
        if let Some(width) = self.px(element, "stroke-width") {
            text.stroke_width = width;
        }
        if let Some(size) = self.px(element, "font-size") {
            text.font.size = size;
        } else {
            text.font.size *= self.config.ratio;
        }
        if let Some(family) = attribute(element, "font-family", values::parse_font_family) {
            text.font.family = family;
        }
        if let Some(style) = attribute(element, "font-style", values::parse_font_style) {
            text.font.style = style;
        }
        if let Some(dy) = self.px(element, "dy") {
            text.dy = dy;
        }

        let (point, area, path) = match target {
            LabelTarget::Path => (false, false, true),
            LabelTarget::Caption => match rule.element() {
                ElementType::Any => (true, true, false),
                ElementType::Node => (true, false, false),
                ElementType::Way => (false, true, false),
                ElementType::Invalid => (false, false, false),
            },
        };
        if !(point || area || path) {
            self.report.skipped += 1;
            return;
        }

        let handle = self.push(rule, RenderKind::Text(text));
        if path {
            self.output.path_labels.push(handle);
        }
        if point {
            self.output.point_labels.push(handle);
        }
        if area {
            self.output.area_labels.push(handle);
        }
    }

    fn symbol(&mut self, element: &Element, rule: &Rule) {
        let Some(icon) = self.icon(element) else {
            tracing::warn!(
                "Style: symbol '{}' not found, skipping",
                element.get("src").unwrap_or_default()
            );
            self.report.missing_resources += 1;
            return;
        };

        let priority = attribute(element, "priority", values::parse_i32).unwrap_or(0);
        let handle = self.push(rule, RenderKind::Symbol(Symbol { priority, icon }));
        self.output.symbols.push(handle);
    }

    fn icon(&self, element: &Element) -> Option<Icon> {
        let path = self.resources.resolve(element.get("src")?)?;
        Some(Icon {
            path,
            width: self.px(element, "symbol-width"),
            height: self.px(element, "symbol-height"),
            percent: attribute(element, "symbol-percent", values::parse_f64),
        })
    }

    fn push(&mut self, rule: &Rule, kind: RenderKind) -> Handle {
        self.output.arena.push(Render::new(rule.clone(), kind))
    }
}

/// Parse attribute `name`; unparsable values are logged and treated as absent.
fn attribute<T>(element: &Element, name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = element.get(name)?;
    let value = parse(raw);
    if value.is_none() {
        tracing::warn!(
            "Style: ignoring invalid {}=\"{}\" on <{}>",
            name,
            raw,
            element.name
        );
    }
    value
}
