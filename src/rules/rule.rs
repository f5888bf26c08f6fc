//! Composite rule predicates and their narrowing.

use std::fmt;

use super::filter::Filter;
use crate::tags::{FeatureKind, Tag};

/// Highest zoom level a theme can address.
pub const MAX_ZOOM: u8 = 127;

/// Element type constraint.
///
/// Constraints compose by OR-ing their bits, so a `Node` rule nested in a
/// `Way` rule becomes `Invalid` and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementType {
    #[default]
    Any,
    Node,
    Way,
    Invalid,
}

impl ElementType {
    fn bits(self) -> u8 {
        match self {
            ElementType::Any => 0,
            ElementType::Node => 1,
            ElementType::Way => 2,
            ElementType::Invalid => 3,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => ElementType::Any,
            1 => ElementType::Node,
            2 => ElementType::Way,
            _ => ElementType::Invalid,
        }
    }

    pub fn narrow(self, declared: ElementType) -> Self {
        Self::from_bits(self.bits() | declared.bits())
    }

    pub fn accepts(self, kind: FeatureKind) -> bool {
        matches!(
            (self, kind),
            (ElementType::Any, _)
                | (ElementType::Node, FeatureKind::Node)
                | (ElementType::Way, FeatureKind::Way)
        )
    }

    /// Parse an `e` attribute value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "any" => Some(ElementType::Any),
            "node" => Some(ElementType::Node),
            "way" => Some(ElementType::Way),
            _ => None,
        }
    }
}

/// Closed-geometry constraint, composed like [`ElementType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Closed {
    #[default]
    Any,
    Yes,
    No,
    Invalid,
}

impl Closed {
    fn bits(self) -> u8 {
        match self {
            Closed::Any => 0,
            Closed::Yes => 1,
            Closed::No => 2,
            Closed::Invalid => 3,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => Closed::Any,
            1 => Closed::Yes,
            2 => Closed::No,
            _ => Closed::Invalid,
        }
    }

    pub fn narrow(self, declared: Closed) -> Self {
        Self::from_bits(self.bits() | declared.bits())
    }

    pub fn accepts(self, closed: bool) -> bool {
        match self {
            Closed::Any => true,
            Closed::Yes => closed,
            Closed::No => !closed,
            Closed::Invalid => false,
        }
    }

    /// Parse a `closed` attribute value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "any" => Some(Closed::Any),
            "yes" => Some(Closed::Yes),
            "no" => Some(Closed::No),
            _ => None,
        }
    }
}

/// Inclusive zoom interval. `min > max` is a valid, empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomRange {
    pub min: u8,
    pub max: u8,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self {
            min: 0,
            max: MAX_ZOOM,
        }
    }
}

impl ZoomRange {
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, zoom: u8) -> bool {
        self.min <= zoom && zoom <= self.max
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Raise the lower bound to `min` and lower the upper bound to `max`.
    pub fn narrow(self, min: Option<u8>, max: Option<u8>) -> Self {
        Self {
            min: min.map_or(self.min, |m| m.max(self.min)),
            max: max.map_or(self.max, |m| m.min(self.max)),
        }
    }
}

impl fmt::Display for ZoomRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Constraints declared on a single `rule` element.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub element: Option<ElementType>,
    pub closed: Option<Closed>,
    pub min_zoom: Option<u8>,
    pub max_zoom: Option<u8>,
    pub filter: Option<Filter>,
}

/// Predicate selecting the features an instruction applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    element: ElementType,
    closed: Closed,
    zooms: ZoomRange,
    filters: Vec<Filter>,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn closed(&self) -> Closed {
        self.closed
    }

    pub fn zooms(&self) -> ZoomRange {
        self.zooms
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// The child rule obtained by applying `constraints` under `self`.
    ///
    /// The result never matches a feature `self` rejects.
    pub fn refine(&self, constraints: &Constraints) -> Rule {
        let mut child = Rule {
            element: self
                .element
                .narrow(constraints.element.unwrap_or_default()),
            closed: self.closed.narrow(constraints.closed.unwrap_or_default()),
            zooms: self.zooms.narrow(constraints.min_zoom, constraints.max_zoom),
            filters: self.filters.clone(),
        };
        if let Some(filter) = &constraints.filter {
            child.push_filter(filter.clone());
        }
        child
    }

    pub fn with_element(mut self, element: ElementType) -> Self {
        self.element = self.element.narrow(element);
        self
    }

    pub fn with_closed(mut self, closed: Closed) -> Self {
        self.closed = self.closed.narrow(closed);
        self
    }

    pub fn with_zooms(mut self, min: u8, max: u8) -> Self {
        self.zooms = self.zooms.narrow(Some(min), Some(max));
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.push_filter(filter);
        self
    }

    fn push_filter(&mut self, filter: Filter) {
        if !filter.is_tautology() {
            self.filters.push(filter);
        }
    }

    pub fn contains_zoom(&self, zoom: u8) -> bool {
        self.zooms.contains(zoom)
    }

    /// Full match. `closed` is ignored for nodes.
    pub fn matches(&self, zoom: u8, kind: FeatureKind, closed: bool, tags: &[Tag]) -> bool {
        if !self.zooms.contains(zoom) || !self.element.accepts(kind) {
            return false;
        }
        if kind == FeatureKind::Way && !self.closed.accepts(closed) {
            return false;
        }
        self.matches_tags(tags)
    }

    /// Tag filters only.
    pub fn matches_tags(&self, tags: &[Tag]) -> bool {
        self.filters.iter().all(|filter| filter.matches(tags))
    }

    /// A way at an already known zoom.
    pub fn matches_way(&self, closed: bool, tags: &[Tag]) -> bool {
        self.element.accepts(FeatureKind::Way)
            && self.closed.accepts(closed)
            && self.matches_tags(tags)
    }

    pub fn matches_way_at(&self, zoom: u8, closed: bool, tags: &[Tag]) -> bool {
        self.matches(zoom, FeatureKind::Way, closed, tags)
    }

    pub fn matches_node_at(&self, zoom: u8, tags: &[Tag]) -> bool {
        self.matches(zoom, FeatureKind::Node, false, tags)
    }

    /// A node at an already known zoom.
    pub fn matches_node(&self, tags: &[Tag]) -> bool {
        self.element.accepts(FeatureKind::Node) && self.matches_tags(tags)
    }
}
