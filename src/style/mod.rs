//! The compiled style and its query API.
//!
//! [`Style::load`] walks a theme document once and stores every instruction
//! in an arena owned by the style. Queries scan the per-output lists and
//! return [`Styled`] views borrowing the style, so a reload (which needs
//! `&mut self`) cannot happen while query results are alive. [`Handle`]s
//! taken from a view outlive the borrow but stop resolving after a reload.

mod arena;
mod compile;
mod menu;

use std::ops::Deref;

use crate::config::StyleConfig;
use crate::error::Result;
use crate::render::{CircleRender, PathRender, Render, Symbol, TextRender};
use crate::resources::ResourceResolver;
use crate::rules::{ElementType, Rule};
use crate::tags::{FeatureKind, Tag, TagDictionary};
use crate::theme::{Element, parse_document};

pub use arena::Handle;
pub use compile::LoadReport;
pub use menu::{Layer, Menu};

use compile::{Compiled, Compiler};

/// A query result: one instruction and the rule that selected it.
#[derive(Debug)]
pub struct Styled<'a, T> {
    pub handle: Handle,
    pub rule: &'a Rule,
    pub render: &'a T,
}

impl<T> Clone for Styled<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Styled<'_, T> {}

impl<T> Deref for Styled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.render
    }
}

/// Compiled render theme.
#[derive(Debug, Default)]
pub struct Style {
    compiled: Compiled,
    generation: u64,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `document` and replace the current instructions.
    ///
    /// On error the previously loaded instructions stay in place.
    pub fn load(
        &mut self,
        document: &Element,
        dictionary: &dyn TagDictionary,
        resources: &dyn ResourceResolver,
        config: &StyleConfig,
    ) -> Result<LoadReport> {
        let generation = self.generation + 1;
        let (compiled, report) =
            Compiler::new(dictionary, resources, config, generation).compile(document)?;

        self.compiled = compiled;
        self.generation = generation;
        tracing::info!(
            "Style: loaded {} paths, {} circles, {} path labels, {} point labels, {} area labels, {} symbols",
            report.paths,
            report.circles,
            report.path_labels,
            report.point_labels,
            report.area_labels,
            report.symbols
        );
        if report.pruned_rules > 0 || report.missing_resources > 0 {
            tracing::info!(
                "Style: {} rules pruned by menu, {} missing resources",
                report.pruned_rules,
                report.missing_resources
            );
        }
        Ok(report)
    }

    /// Parse theme markup and [`load`](Self::load) it.
    pub fn load_str(
        &mut self,
        xml: &str,
        dictionary: &dyn TagDictionary,
        resources: &dyn ResourceResolver,
        config: &StyleConfig,
    ) -> Result<LoadReport> {
        let document = parse_document(xml)?;
        self.load(&document, dictionary, resources, config)
    }

    /// Drop every instruction. Outstanding handles stop resolving.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.compiled = Compiled::empty(self.generation);
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    /// Changes on every load and clear.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Instruction behind `handle`, unless the style was reloaded since.
    pub fn get(&self, handle: Handle) -> Option<&Render> {
        self.compiled.arena.get(handle)
    }

    /// Line and area styles for a way, ascending by z-order.
    pub fn paths(&self, zoom: u8, closed: bool, tags: &[Tag]) -> Vec<Styled<'_, PathRender>> {
        self.select(&self.compiled.paths, Render::as_path, |rule| {
            rule.matches_way_at(zoom, closed, tags)
        })
    }

    /// Circle markers for a node, ascending by z-order.
    pub fn circles(&self, zoom: u8, tags: &[Tag]) -> Vec<Styled<'_, CircleRender>> {
        self.select(&self.compiled.circles, Render::as_circle, |rule| {
            rule.matches_node_at(zoom, tags)
        })
    }

    /// Label candidates along ways at `zoom`, ascending by priority.
    pub fn path_labels(&self, zoom: u8) -> Vec<Styled<'_, TextRender>> {
        self.select(&self.compiled.path_labels, Render::as_text, |rule| {
            rule.contains_zoom(zoom)
        })
    }

    /// Label candidates for nodes at `zoom`, ascending by priority.
    pub fn point_labels(&self, zoom: u8) -> Vec<Styled<'_, TextRender>> {
        self.select(&self.compiled.point_labels, Render::as_text, |rule| {
            rule.contains_zoom(zoom)
        })
    }

    /// Label candidates for areas at `zoom`, ascending by priority.
    pub fn area_labels(&self, zoom: u8) -> Vec<Styled<'_, TextRender>> {
        self.select(&self.compiled.area_labels, Render::as_text, |rule| {
            rule.contains_zoom(zoom)
        })
    }

    /// Symbol candidates for nodes at `zoom`, ascending by priority.
    pub fn point_symbols(&self, zoom: u8) -> Vec<Styled<'_, Symbol>> {
        self.select(&self.compiled.symbols, Render::as_symbol, |rule| {
            rule.contains_zoom(zoom)
                && matches!(rule.element(), ElementType::Any | ElementType::Node)
        })
    }

    /// Symbol candidates for areas at `zoom`, ascending by priority.
    pub fn area_symbols(&self, zoom: u8) -> Vec<Styled<'_, Symbol>> {
        self.select(&self.compiled.symbols, Render::as_symbol, |rule| {
            rule.contains_zoom(zoom)
                && matches!(rule.element(), ElementType::Any | ElementType::Way)
        })
    }

    /// Labels applying to one feature: the zoom candidates of the matching
    /// list, refined against the feature's tags and restricted to labels
    /// whose key is present.
    ///
    /// Closed ways get both area and path labels, merged by priority.
    pub fn labels(
        &self,
        zoom: u8,
        kind: FeatureKind,
        closed: bool,
        tags: &[Tag],
    ) -> Vec<Styled<'_, TextRender>> {
        let mut candidates = match (kind, closed) {
            (FeatureKind::Node, _) => self.point_labels(zoom),
            (FeatureKind::Way, true) => {
                let mut labels = self.area_labels(zoom);
                labels.extend(self.path_labels(zoom));
                labels.sort_by_key(|label| label.priority());
                labels
            }
            (FeatureKind::Way, false) => self.path_labels(zoom),
        };
        candidates.retain(|label| {
            label.rule.matches(zoom, kind, closed, tags)
                && tags.iter().any(|tag| tag.key == label.key())
        });
        candidates
    }

    /// Symbols applying to one feature. Open ways carry no symbols.
    pub fn symbols(
        &self,
        zoom: u8,
        kind: FeatureKind,
        closed: bool,
        tags: &[Tag],
    ) -> Vec<Styled<'_, Symbol>> {
        let candidates = match (kind, closed) {
            (FeatureKind::Node, _) => self.point_symbols(zoom),
            (FeatureKind::Way, true) => self.area_symbols(zoom),
            (FeatureKind::Way, false) => return Vec::new(),
        };
        candidates
            .into_iter()
            .filter(|symbol| symbol.rule.matches(zoom, kind, closed, tags))
            .collect()
    }

    fn select<'a, T>(
        &'a self,
        list: &'a [Handle],
        project: fn(&Render) -> Option<&T>,
        keep: impl Fn(&Rule) -> bool,
    ) -> Vec<Styled<'a, T>> {
        list.iter()
            .filter_map(|&handle| {
                let render = self.compiled.arena.get(handle)?;
                if !keep(&render.rule) {
                    return None;
                }
                Some(Styled {
                    handle,
                    rule: &render.rule,
                    render: project(render)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Brush, Color, ZoomScale};
    use crate::resources::{MemoryResolver, NoResources};
    use crate::tags::TagTable;

    fn dictionary() -> TagTable {
        let mut table = TagTable::new();
        for key in ["highway", "natural", "name", "amenity", "tunnel", "ref"] {
            table.intern(key);
        }
        table
    }

    fn load(xml: &str, table: &TagTable) -> (Style, LoadReport) {
        let mut style = Style::new();
        let report = style
            .load_str(
                xml,
                table,
                &MemoryResolver::new(["pub.svg"]),
                &StyleConfig::default(),
            )
            .unwrap();
        (style, report)
    }

    #[test]
    fn test_path_ordering_follows_document() {
        let table = dictionary();
        let (style, _) = load(
            r##"<rendertheme>
  <rule e="way" k="highway" v="*">
    <line stroke="#000000" stroke-width="3"/>
    <rule e="any" k="highway" v="primary">
      <line stroke="#ff0000" stroke-width="2"/>
    </rule>
    <line stroke="#ffffff" stroke-width="1"/>
  </rule>
</rendertheme>"##,
            &table,
        );

        let mut lookup = table.clone();
        let tags = lookup.tags([("highway", "primary")]);
        let paths = style.paths(14, false, &tags);
        let widths: Vec<f64> = paths.iter().map(|p| p.pen(12).unwrap().width).collect();
        assert_eq!(widths, vec![3.0, 2.0, 1.0]);
        assert!(paths.windows(2).all(|w| w[0].z_order() <= w[1].z_order()));

        let tags = lookup.tags([("highway", "service")]);
        assert_eq!(style.paths(14, false, &tags).len(), 2);
    }

    #[test]
    fn test_label_lists_follow_rule_type() {
        let table = dictionary();
        let (style, report) = load(
            r#"<rendertheme>
  <rule e="any" k="*" v="*">
    <caption k="name" priority="5"/>
  </rule>
  <rule e="node" k="amenity" v="*">
    <caption k="name" priority="-1"/>
  </rule>
  <rule e="way" k="highway" v="*">
    <pathText k="ref" priority="2"/>
    <caption k="name"/>
  </rule>
  <rule e="way" k="*" v="*"><caption k="unknown_key"/></rule>
</rendertheme>"#,
            &table,
        );

        assert_eq!(report.point_labels, 2);
        assert_eq!(report.area_labels, 2);
        assert_eq!(report.path_labels, 1);
        assert_eq!(report.skipped, 1);

        let priorities: Vec<i32> = style.point_labels(10).iter().map(|l| l.priority()).collect();
        assert_eq!(priorities, vec![-1, 5]);
        let priorities: Vec<i32> = style.area_labels(10).iter().map(|l| l.priority()).collect();
        assert_eq!(priorities, vec![0, 5]);
    }

    #[test]
    fn test_labels_for_feature() {
        let table = dictionary();
        let (style, _) = load(
            r#"<rendertheme>
  <rule e="node" k="amenity" v="pub"><caption k="name"/></rule>
  <rule e="node" k="amenity" v="cafe"><caption k="name"/></rule>
</rendertheme>"#,
            &table,
        );
        let mut lookup = table.clone();

        let named = lookup.tags([("amenity", "pub"), ("name", "The Crown")]);
        assert_eq!(style.labels(16, FeatureKind::Node, false, &named).len(), 1);

        let unnamed = lookup.tags([("amenity", "pub")]);
        assert!(style.labels(16, FeatureKind::Node, false, &unnamed).is_empty());
    }

    #[test]
    fn test_symbols_by_type() {
        let table = dictionary();
        let (style, report) = load(
            r#"<rendertheme>
  <rule e="node" k="amenity" v="pub"><symbol src="pub.svg" priority="3"/></rule>
  <rule e="way" k="amenity" v="pub"><symbol src="pub.svg"/></rule>
  <rule e="any" k="amenity" v="bar"><symbol src="bar.svg"/></rule>
</rendertheme>"#,
            &table,
        );

        assert_eq!(report.symbols, 2);
        assert_eq!(report.missing_resources, 1);
        assert_eq!(style.point_symbols(10).len(), 1);
        assert_eq!(style.area_symbols(10).len(), 1);
        assert_eq!(style.point_symbols(10)[0].priority(), 3);
        assert_eq!(style.point_symbols(10)[0].icon().path.to_str(), Some("pub.svg"));

        let mut lookup = table.clone();
        let tags = lookup.tags([("amenity", "pub")]);
        assert!(style.symbols(10, FeatureKind::Way, false, &tags).is_empty());
        assert_eq!(style.symbols(10, FeatureKind::Way, true, &tags).len(), 1);
    }

    #[test]
    fn test_area_pattern_falls_back_to_fill() {
        let table = dictionary();
        let mut style = Style::new();
        let report = style
            .load_str(
                r##"<rendertheme><rule e="way" k="natural" v="wood">
  <area fill="#00ff00" src="forest.png"/>
</rule></rendertheme>"##,
                &table,
                &NoResources,
                &StyleConfig::default(),
            )
            .unwrap();

        assert_eq!(report.missing_resources, 1);
        let mut lookup = table.clone();
        let tags = lookup.tags([("natural", "wood")]);
        let paths = style.paths(12, true, &tags);
        assert_eq!(paths.len(), 1);
        assert!(paths[0].area());
        assert_eq!(paths[0].brush(), &Brush::Solid(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn test_ratio_applies_to_pixel_sizes() {
        let table = dictionary();
        let config = StyleConfig::default()
            .with_ratio(2.0)
            .with_scale(ZoomScale::new(12, 1.5));
        let mut style = Style::new();
        style
            .load_str(
                r##"<rendertheme>
  <rule e="way" k="highway" v="*">
    <line stroke="#000000" stroke-width="1.5" stroke-dasharray="3,1" dy="1"/>
  </rule>
  <rule e="node" k="amenity" v="*">
    <circle r="4" fill="#ff0000" scale-radius="true"/>
    <caption k="name" font-size="12"/>
  </rule>
</rendertheme>"##,
                &table,
                &NoResources,
                &config,
            )
            .unwrap();

        let mut lookup = table.clone();
        let way = lookup.tags([("highway", "path")]);
        let path = style.paths(12, false, &way)[0];
        let pen = path.pen(12).unwrap();
        assert_eq!(pen.width, 3.0);
        assert_eq!(pen.dash, vec![6.0, 2.0]);
        assert_eq!(path.dy(12), 2.0);

        let node = lookup.tags([("amenity", "bench")]);
        let circle = style.circles(13, &node)[0];
        assert_eq!(circle.radius(13), 12.0);
        assert_eq!(circle.brush(), Brush::Solid(Color::rgb(255, 0, 0)));
        assert!(circle.pen().is_none());

        assert_eq!(style.point_labels(12)[0].font().size, 24.0);
    }

    #[test]
    fn test_failed_load_keeps_previous_state() {
        let table = dictionary();
        let (mut style, _) = load(
            r##"<rendertheme><rule k="highway" v="*"><line stroke="#000000"/></rule></rendertheme>"##,
            &table,
        );
        let generation = style.generation();

        let err = style.load_str(
            "<rendertheme><rule>",
            &table,
            &NoResources,
            &StyleConfig::default(),
        );
        assert!(err.is_err());
        let err = style.load_str(
            "<theme/>",
            &table,
            &NoResources,
            &StyleConfig::default(),
        );
        assert!(err.is_err());

        assert_eq!(style.generation(), generation);
        assert!(!style.is_empty());
    }

    #[test]
    fn test_handles_are_invalidated_by_reload() {
        let table = dictionary();
        let xml = r##"<rendertheme><rule k="highway" v="*"><line stroke="#000000"/></rule></rendertheme>"##;
        let (mut style, _) = load(xml, &table);

        let mut lookup = table.clone();
        let tags = lookup.tags([("highway", "primary")]);
        let handle = style.paths(10, false, &tags)[0].handle;
        assert!(style.get(handle).and_then(Render::as_path).is_some());

        style
            .load_str(xml, &table, &NoResources, &StyleConfig::default())
            .unwrap();
        assert!(style.get(handle).is_none());

        style.clear();
        assert!(style.is_empty());
        assert!(style.paths(10, false, &tags).is_empty());
    }

    #[test]
    fn test_unknown_elements_and_attributes_are_ignored() {
        let table = dictionary();
        let (style, report) = load(
            r##"<rendertheme map-background="#f8f8f8" version="5">
  <hillshading/>
  <rule e="way" k="highway" v="*" unknown="1" zoom-min="abc">
    <lineSymbol src="arrow.svg"/>
    <line stroke="#000000" stroke-width="wide" fancy="yes"/>
  </rule>
</rendertheme>"##,
            &table,
        );

        assert_eq!(report.paths, 1);
        let mut lookup = table.clone();
        let tags = lookup.tags([("highway", "primary")]);
        let pen = style.paths(0, false, &tags)[0].pen(0).unwrap();
        assert_eq!(pen.width, 0.0);
    }

    #[test]
    fn test_style_is_shareable_between_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Style>();

        let table = dictionary();
        let (style, _) = load(
            r##"<rendertheme><rule e="way" k="highway" v="*"><line stroke="#000000"/></rule></rendertheme>"##,
            &table,
        );
        let mut lookup = table.clone();
        let tags = lookup.tags([("highway", "primary")]);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| assert_eq!(style.paths(12, false, &tags).len(), 1));
            }
        });
    }
}
